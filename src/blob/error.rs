use thiserror::Error;

/// Errors that can occur when interacting with blob storage
#[derive(Error, Debug)]
pub enum BlobStoreError {
    #[error("Object with key {0} not found")]
    ObjectNotFound(String),

    #[error("Access denied for object {0}: {1}")]
    AccessDenied(String, String),

    #[error("Failed to write object {0}: {1}")]
    WriteError(String, String),

    #[error("Failed to read object {0}: {1}")]
    ReadError(String, String),

    #[error("Failed to delete objects: {0}")]
    DeleteError(String),

    #[error("Failed to presign upload for {0}: {1}")]
    PresignError(String, String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Other storage error: {0}")]
    Other(#[from] anyhow::Error),
}
