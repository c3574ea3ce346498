pub mod attributes;
pub mod dynamo;
pub mod error;
#[cfg(test)]
pub mod fake;
pub mod models;
pub mod store;

pub use dynamo::DynamoMetadataStore;
pub use error::MetadataError;
#[cfg(test)]
pub use fake::FakeMetadataStore;
pub use models::{FlagUpdate, ImageRecord, RecordFilter, RecordKey};
pub use store::MetadataStore;
