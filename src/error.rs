//! Error taxonomy for controller operations.
//!
//! DESIGN
//! ======
//! Every failure degrades to "retry the specific action". Only a fetch that
//! fails before any dataset was ever loaded blocks the derived views; the
//! controller encodes that in its phase, not in the error type.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use crate::analytics::ComparisonError;
use crate::api::ApiError;
use crate::model::DatasetError;
use crate::upload::UploadError;

/// Stable machine code + retry hint attached to user-facing errors.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error("failed to load drift data: {0}")]
    Fetch(#[source] ApiError),

    #[error("drift data rejected: {0}")]
    InvalidDataset(#[from] DatasetError),

    #[error("analysis failed: {0}")]
    Analysis(#[source] ApiError),

    #[error("comparison request failed: {0}")]
    ComparisonRequest(#[source] ApiError),

    #[error(transparent)]
    Comparison(#[from] ComparisonError),

    /// No dataset has been loaded, so dashboard actions are unavailable.
    #[error("dashboard not loaded")]
    NotReady,

    /// File selection and upload only exist on the landing screen.
    #[error("not on the landing screen")]
    NotLanding,

    #[error("{0} already in progress")]
    Busy(&'static str),
}

impl ErrorCode for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Upload(e) => e.error_code(),
            Self::Fetch(_) => "E_FETCH",
            Self::InvalidDataset(_) => "E_INVALID_DATASET",
            Self::Analysis(_) => "E_ANALYSIS",
            Self::ComparisonRequest(_) => "E_COMPARISON_REQUEST",
            Self::Comparison(_) => "E_COMPARISON",
            Self::NotReady => "E_NOT_READY",
            Self::NotLanding => "E_NOT_LANDING",
            Self::Busy(_) => "E_BUSY",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Upload(e) => e.retryable(),
            Self::Fetch(e) | Self::Analysis(e) | Self::ComparisonRequest(e) => e.retryable(),
            Self::Busy(_) => true,
            _ => false,
        }
    }
}
