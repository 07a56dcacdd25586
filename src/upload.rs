//! Upload coordinator: three categorized files, sent strictly in order.
//!
//! DESIGN
//! ======
//! Uploads run payroll → ai_costs → saas_cloud, each awaited before the next
//! starts. The first failure aborts the rest; nothing already uploaded is
//! rolled back. Selected files live in [`UploadForm`] and survive a failed
//! attempt so the operator can retry without re-selecting.

#[cfg(test)]
#[path = "upload_test.rs"]
mod upload_test;

use tracing::{error, info};

use crate::api::{ApiError, DatasetType, DriftApi, UploadAck, UploadFile};
use crate::error::ErrorCode;

/// File extensions the backend can parse.
pub const ACCEPTED_EXTENSIONS: [&str; 3] = [".csv", ".xlsx", ".xls"];

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("no file selected for {0}")]
    MissingFile(DatasetType),

    #[error("{file_name} is not a .csv, .xlsx or .xls file ({dataset_type})")]
    UnsupportedFile { dataset_type: DatasetType, file_name: String },

    #[error("upload of {dataset_type} failed: {source}")]
    Failed {
        dataset_type: DatasetType,
        #[source]
        source: ApiError,
    },
}

impl ErrorCode for UploadError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingFile(_) => "E_UPLOAD_MISSING_FILE",
            Self::UnsupportedFile { .. } => "E_UPLOAD_UNSUPPORTED_FILE",
            Self::Failed { .. } => "E_UPLOAD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Failed { source, .. } if source.retryable())
    }
}

// =============================================================================
// FORM STATE
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSlot {
    pub dataset_type: DatasetType,
    pub file: Option<UploadFile>,
}

/// Landing-screen state: one slot per dataset type.
#[derive(Debug, Clone)]
pub struct UploadForm {
    slots: [UploadSlot; 3],
    /// True while an upload sequence is running.
    pub uploading: bool,
    /// Message of the last failed attempt.
    pub error: Option<String>,
    /// Acknowledgements from the last successful sequence.
    pub acks: Vec<(DatasetType, UploadAck)>,
}

impl Default for UploadForm {
    fn default() -> Self {
        Self {
            slots: DatasetType::ALL.map(|dataset_type| UploadSlot { dataset_type, file: None }),
            uploading: false,
            error: None,
            acks: Vec::new(),
        }
    }
}

impl UploadForm {
    #[must_use]
    pub fn slots(&self) -> &[UploadSlot] {
        &self.slots
    }

    #[must_use]
    pub fn slot(&self, dataset_type: DatasetType) -> &UploadSlot {
        &self.slots[index(dataset_type)]
    }

    /// Select (or replace) the file for one dataset type.
    pub fn select(&mut self, dataset_type: DatasetType, file: UploadFile) {
        self.slots[index(dataset_type)].file = Some(file);
    }

    pub fn clear(&mut self, dataset_type: DatasetType) {
        self.slots[index(dataset_type)].file = None;
    }

    /// All three files in upload order.
    ///
    /// # Errors
    ///
    /// Returns [`UploadError::MissingFile`] for the first empty slot.
    pub fn ready_files(&self) -> Result<Vec<(DatasetType, UploadFile)>, UploadError> {
        self.slots
            .iter()
            .map(|slot| {
                slot.file
                    .clone()
                    .map(|file| (slot.dataset_type, file))
                    .ok_or(UploadError::MissingFile(slot.dataset_type))
            })
            .collect()
    }
}

fn index(dataset_type: DatasetType) -> usize {
    match dataset_type {
        DatasetType::Payroll => 0,
        DatasetType::AiCosts => 1,
        DatasetType::SaasCloud => 2,
    }
}

// =============================================================================
// SEQUENCING
// =============================================================================

fn has_accepted_extension(file_name: &str) -> bool {
    let lower = file_name.to_ascii_lowercase();
    ACCEPTED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Upload every file in order, stopping at the first failure.
///
/// File names are checked before any request is issued.
///
/// # Errors
///
/// Returns the first [`UploadError`]; later uploads are never attempted.
pub async fn upload_all(
    api: &dyn DriftApi,
    files: &[(DatasetType, UploadFile)],
) -> Result<Vec<(DatasetType, UploadAck)>, UploadError> {
    if let Some((dataset_type, file)) = files.iter().find(|(_, f)| !has_accepted_extension(&f.file_name)) {
        return Err(UploadError::UnsupportedFile { dataset_type: *dataset_type, file_name: file.file_name.clone() });
    }

    let mut acks = Vec::with_capacity(files.len());
    for (dataset_type, file) in files {
        info!(%dataset_type, file = %file.file_name, "upload: sending");
        match api.upload(*dataset_type, file).await {
            Ok(ack) => {
                info!(%dataset_type, rows = ack.rows, "upload: accepted");
                acks.push((*dataset_type, ack));
            }
            Err(source) => {
                error!(%dataset_type, error = %source, "upload: failed; aborting remaining uploads");
                return Err(UploadError::Failed { dataset_type: *dataset_type, source });
            }
        }
    }
    Ok(acks)
}
