//! Wire types and errors for the drift backend contract.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::model::DriftDataset;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by backend calls. Status handling is uniform: every
/// non-2xx response maps to [`ApiError::Status`].
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(String),

    /// The backend answered with a non-success status.
    #[error("backend returned status {status}")]
    Status { status: u16, body: String },

    /// The response body did not match the expected shape.
    #[error("response parse failed: {0}")]
    Parse(String),

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for ApiError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Request(_) => "E_API_REQUEST",
            Self::Status { .. } => "E_API_STATUS",
            Self::Parse(_) => "E_API_PARSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Status { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// UPLOAD
// =============================================================================

/// Which raw dataset an upload carries. Also the `dataset_type` query value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetType {
    Payroll,
    AiCosts,
    SaasCloud,
}

impl DatasetType {
    /// Fixed upload order.
    pub const ALL: [Self; 3] = [Self::Payroll, Self::AiCosts, Self::SaasCloud];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Payroll => "payroll",
            Self::AiCosts => "ai_costs",
            Self::SaasCloud => "saas_cloud",
        }
    }
}

impl fmt::Display for DatasetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A selected file: its name and raw bytes. Parsing happens server-side.
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { file_name: file_name.into(), bytes }
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Acknowledgement returned by `POST /api/upload`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UploadAck {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub rows: u64,
    #[serde(default)]
    pub columns: Vec<String>,
    #[serde(default)]
    pub sample: Vec<serde_json::Value>,
}

// =============================================================================
// ANALYSIS / CHAT
// =============================================================================

#[derive(Debug, Deserialize)]
pub(crate) struct AnalyzeResponse {
    #[serde(alias = "markdown")]
    pub analysis: String,
}

/// Role as the chat endpoint expects it. The local `assistant` role is sent
/// as `model`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: WireRole,
    pub content: String,
}

/// Body of `POST /api/chat`. `message` is the new user turn and is never
/// repeated inside `history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRequest {
    pub message: String,
    pub history: Vec<HistoryEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drift_data: Option<DriftDataset>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatResponse {
    pub response: String,
}

// =============================================================================
// HOUSEKEEPING
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub datasets_loaded: Vec<String>,
}
