use crate::blob::BlobStoreError;
use crate::imaging::{RenderError, ResolutionError};
use crate::metadata::{MetadataError, RecordKey};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    #[error("Blob store error: {0}")]
    BlobStore(#[from] BlobStoreError),

    #[error("Metadata store error: {0}")]
    Metadata(#[from] MetadataError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Record not found: {0}")]
    RecordNotFound(RecordKey),

    #[error("Record already exists: {0}")]
    RecordExists(RecordKey),

    #[error("Background task failed: {0}")]
    TaskFailed(String),

    #[error("{operation} failed after {attempts} attempts: {last}")]
    AttemptsExhausted {
        operation: &'static str,
        attempts: u32,
        last: Box<PipelineError>,
    },
}

impl PipelineError {
    /// Whether a fresh attempt could succeed where this one failed
    pub fn is_retryable(&self) -> bool {
        match self {
            PipelineError::Render(_)
            | PipelineError::Resolution(_)
            | PipelineError::InvalidRequest(_)
            | PipelineError::RecordNotFound(_)
            | PipelineError::RecordExists(_)
            | PipelineError::AttemptsExhausted { .. } => false,
            PipelineError::BlobStore(BlobStoreError::ConfigurationError(_))
            | PipelineError::Metadata(MetadataError::ConfigurationError(_))
            | PipelineError::Metadata(MetadataError::Deserialization(_)) => false,
            PipelineError::BlobStore(_)
            | PipelineError::Metadata(_)
            | PipelineError::TaskFailed(_) => true,
        }
    }
}
