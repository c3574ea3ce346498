use thiserror::Error;

/// Errors that can occur when interacting with the metadata store
#[derive(Error, Debug)]
pub enum MetadataError {
    /// A conditional update found the record missing or in an unexpected state
    #[error("Condition failed for record {0}")]
    ConditionFailed(String),

    #[error("Failed to write record: {0}")]
    WriteError(String),

    #[error("Failed to read records: {0}")]
    ReadError(String),

    #[error("Failed to deserialize record: {0}")]
    Deserialization(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Other metadata store error: {0}")]
    Other(#[from] anyhow::Error),
}
