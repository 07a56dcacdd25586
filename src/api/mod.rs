//! Backend client for the drift service.
//!
//! SYSTEM CONTEXT
//! ==============
//! `types` defines the consumed wire contract and `http` implements it over
//! `reqwest`. The controller only ever sees the [`DriftApi`] trait, so tests
//! can drive it with an in-memory backend.

pub mod http;
pub mod types;

pub use http::HttpDriftApi;
pub use types::{
    ApiError, ChatRequest, DatasetType, HealthStatus, HistoryEntry, UploadAck, UploadFile, WireRole,
};

use crate::model::DriftDataset;

/// Provider-neutral async trait for the drift backend. Enables mocking in tests.
#[async_trait::async_trait]
pub trait DriftApi: Send + Sync {
    /// `GET /api/drift`. The returned dataset is not yet validated.
    async fn fetch_drift(&self) -> Result<DriftDataset, ApiError>;

    /// `POST /api/upload?dataset_type=...` with a multipart `file` body.
    async fn upload(&self, dataset_type: DatasetType, file: &UploadFile) -> Result<UploadAck, ApiError>;

    /// `POST /api/analyze`; returns the narrative markdown.
    async fn analyze(&self, dataset: &DriftDataset) -> Result<String, ApiError>;

    /// `POST /api/chat`; returns the assistant reply markdown.
    async fn chat(&self, request: &ChatRequest) -> Result<String, ApiError>;

    /// `GET /health`.
    async fn health(&self) -> Result<HealthStatus, ApiError>;

    /// `POST /api/reset`: restore the backend's seeded demo data.
    async fn reset(&self) -> Result<(), ApiError>;
}
