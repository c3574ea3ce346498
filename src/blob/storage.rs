use crate::blob::error::BlobStoreError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// BlobStore trait defining the interface for persisting rendered image variants
#[async_trait]
pub trait BlobStore: Send + Sync + 'static {
    /// Store an object and return its public locator
    ///
    /// * `key` - The object key to write
    /// * `data` - The encoded object body
    /// * `content_type` - MIME type recorded with the object
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BlobStoreError>;

    /// Get an object by its key
    async fn get_object(&self, key: &str) -> Result<Bytes, BlobStoreError>;

    /// Delete a set of objects. Keys that do not exist are not an error.
    async fn delete_objects(&self, keys: &[String]) -> Result<(), BlobStoreError>;

    /// Generate a time-limited URL a client can PUT an object to directly
    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, BlobStoreError>;

    /// Recover the object key from a locator produced by `put_object`
    fn key_from_locator(&self, locator: &str) -> Option<String>;
}

/// Implementation of BlobStore trait for Arc<T> where T implements BlobStore
///
/// This allows sharing storage instances across tasks without cloning clients.
#[async_trait]
impl<T: BlobStore + ?Sized> BlobStore for Arc<T> {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BlobStoreError> {
        (**self).put_object(key, data, content_type).await
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BlobStoreError> {
        (**self).get_object(key).await
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<(), BlobStoreError> {
        (**self).delete_objects(keys).await
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, BlobStoreError> {
        (**self).presign_upload(key, content_type, expires_in).await
    }

    fn key_from_locator(&self, locator: &str) -> Option<String> {
        (**self).key_from_locator(locator)
    }
}
