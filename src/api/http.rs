//! `reqwest` implementation of [`DriftApi`].
//!
//! Thin HTTP wrapper: every call checks the status, reads the body as text
//! and parses it in a pure helper so the parsing is testable offline.

#[cfg(test)]
#[path = "http_test.rs"]
mod http_test;

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::DriftApi;
use super::types::{
    AnalyzeResponse, ApiError, ChatRequest, ChatResponse, DatasetType, HealthStatus, UploadAck, UploadFile,
};
use crate::config::ClientConfig;
use crate::model::DriftDataset;

// =============================================================================
// CLIENT
// =============================================================================

pub struct HttpDriftApi {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDriftApi {
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;
        Ok(Self { http, base_url: config.base_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn read_body(response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status().as_u16();
        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        if !(200..300).contains(&status) {
            return Err(ApiError::Status { status, body: text });
        }
        Ok(text)
    }

    async fn send<T: DeserializeOwned>(&self, request: reqwest::RequestBuilder) -> Result<T, ApiError> {
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        let text = Self::read_body(response).await?;
        parse_body(&text)
    }
}

#[async_trait::async_trait]
impl DriftApi for HttpDriftApi {
    async fn fetch_drift(&self) -> Result<DriftDataset, ApiError> {
        debug!(base_url = %self.base_url, "GET /api/drift");
        self.send(self.http.get(self.endpoint("/api/drift"))).await
    }

    async fn upload(&self, dataset_type: DatasetType, file: &UploadFile) -> Result<UploadAck, ApiError> {
        debug!(%dataset_type, file = %file.file_name, bytes = file.bytes.len(), "POST /api/upload");
        let part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        let form = Form::new().part("file", part);
        let url = self.endpoint(&format!("/api/upload?dataset_type={}", dataset_type.as_str()));
        self.send(self.http.post(url).multipart(form)).await
    }

    async fn analyze(&self, dataset: &DriftDataset) -> Result<String, ApiError> {
        debug!("POST /api/analyze");
        let body: AnalyzeResponse = self
            .send(self.http.post(self.endpoint("/api/analyze")).json(dataset))
            .await?;
        Ok(body.analysis)
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError> {
        debug!(history = request.history.len(), "POST /api/chat");
        let body: ChatResponse = self
            .send(self.http.post(self.endpoint("/api/chat")).json(request))
            .await?;
        Ok(body.response)
    }

    async fn health(&self) -> Result<HealthStatus, ApiError> {
        self.send(self.http.get(self.endpoint("/health"))).await
    }

    async fn reset(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .post(self.endpoint("/api/reset"))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        Self::read_body(response).await.map(|_| ())
    }
}

// =============================================================================
// PARSING
// =============================================================================

fn parse_body<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| ApiError::Parse(e.to_string()))
}
