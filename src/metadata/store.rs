use crate::metadata::error::MetadataError;
use crate::metadata::models::{FlagUpdate, ImageRecord, RecordFilter, RecordKey};
use async_trait::async_trait;
use std::sync::Arc;

/// MetadataStore trait defining the interface for image records
#[async_trait]
pub trait MetadataStore: Send + Sync + 'static {
    /// Fetch a single record by its exact key
    async fn get_record(&self, key: &RecordKey) -> Result<Option<ImageRecord>, MetadataError>;

    /// Write a record, replacing any record stored under the same key
    async fn put_record(&self, record: &ImageRecord) -> Result<(), MetadataError>;

    /// Write a record only if no record exists under its key
    ///
    /// Returns `MetadataError::ConditionFailed` when the key is taken.
    async fn create_record(&self, record: &ImageRecord) -> Result<(), MetadataError>;

    /// Conditionally change the flags of an existing record
    ///
    /// Returns `MetadataError::ConditionFailed` when the record is missing or
    /// does not satisfy `update.expect_featured`.
    async fn update_flags(&self, key: &RecordKey, update: FlagUpdate)
        -> Result<(), MetadataError>;

    /// List the records of a category matching `filter`, newest update first
    async fn query_category(
        &self,
        category: &str,
        filter: RecordFilter,
    ) -> Result<Vec<ImageRecord>, MetadataError>;
}

/// Implementation of MetadataStore trait for Arc<T> where T implements MetadataStore
///
/// This allows sharing store instances across tasks and components efficiently.
#[async_trait]
impl<T: MetadataStore + ?Sized> MetadataStore for Arc<T> {
    async fn get_record(&self, key: &RecordKey) -> Result<Option<ImageRecord>, MetadataError> {
        (**self).get_record(key).await
    }

    async fn put_record(&self, record: &ImageRecord) -> Result<(), MetadataError> {
        (**self).put_record(record).await
    }

    async fn create_record(&self, record: &ImageRecord) -> Result<(), MetadataError> {
        (**self).create_record(record).await
    }

    async fn update_flags(
        &self,
        key: &RecordKey,
        update: FlagUpdate,
    ) -> Result<(), MetadataError> {
        (**self).update_flags(key, update).await
    }

    async fn query_category(
        &self,
        category: &str,
        filter: RecordFilter,
    ) -> Result<Vec<ImageRecord>, MetadataError> {
        (**self).query_category(category, filter).await
    }
}
