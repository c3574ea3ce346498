use crate::blob::error::BlobStoreError;
use crate::blob::storage::BlobStore;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const FAKE_LOCATOR_PREFIX: &str = "fake://gallery/";

#[derive(Default)]
struct FakeState {
    objects: HashMap<String, Bytes>,
    content_types: HashMap<String, String>,
    fail_objects: HashSet<String>,
    fail_puts: usize,
    fail_deletes: usize,
    put_count: usize,
    deleted_keys: Vec<String>,
}

/// `FakeBlobStore` is an in-memory implementation of the `BlobStore` trait for testing purposes.
/// It allows simulating various storage scenarios, including successful operations and failures.
#[derive(Clone, Default)]
pub struct FakeBlobStore {
    state: Arc<Mutex<FakeState>>,
}

#[allow(dead_code)]
impl FakeBlobStore {
    /// Create a new empty FakeBlobStore instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` calls to put_object fail
    pub async fn fake_fail_puts(&self, count: usize) {
        self.state.lock().await.fail_puts = count;
    }

    /// Make the next `count` calls to delete_objects fail
    pub async fn fake_fail_deletes(&self, count: usize) {
        self.state.lock().await.fail_deletes = count;
    }

    /// Simulate a read failure for a specific object
    pub async fn fake_fail_object(&self, key: &str) {
        self.state.lock().await.fail_objects.insert(key.to_string());
    }

    /// Seed an object without counting it as a put
    pub async fn fake_add_object(&self, key: &str, data: Bytes) {
        self.state
            .lock()
            .await
            .objects
            .insert(key.to_string(), data);
    }

    pub async fn fake_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.state.lock().await.objects.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub async fn fake_has_object(&self, key: &str) -> bool {
        self.state.lock().await.objects.contains_key(key)
    }

    pub async fn fake_content_type(&self, key: &str) -> Option<String> {
        self.state.lock().await.content_types.get(key).cloned()
    }

    /// Number of successful put_object calls
    pub async fn fake_put_count(&self) -> usize {
        self.state.lock().await.put_count
    }

    /// Every key passed to a successful delete_objects call, in order
    pub async fn fake_deleted_keys(&self) -> Vec<String> {
        self.state.lock().await.deleted_keys.clone()
    }

    pub fn fake_locator(key: &str) -> String {
        format!("{FAKE_LOCATOR_PREFIX}{key}")
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BlobStoreError> {
        let mut state = self.state.lock().await;
        if state.fail_puts > 0 {
            state.fail_puts -= 1;
            return Err(BlobStoreError::WriteError(
                key.to_string(),
                "Simulated write failure".to_string(),
            ));
        }

        state.objects.insert(key.to_string(), data);
        state
            .content_types
            .insert(key.to_string(), content_type.to_string());
        state.put_count += 1;
        Ok(Self::fake_locator(key))
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BlobStoreError> {
        let state = self.state.lock().await;
        if state.fail_objects.contains(key) {
            return Err(BlobStoreError::ReadError(
                key.to_string(),
                "Simulated read failure".to_string(),
            ));
        }

        state
            .objects
            .get(key)
            .cloned()
            .ok_or_else(|| BlobStoreError::ObjectNotFound(key.to_string()))
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<(), BlobStoreError> {
        let mut state = self.state.lock().await;
        if state.fail_deletes > 0 {
            state.fail_deletes -= 1;
            return Err(BlobStoreError::DeleteError(
                "Simulated delete failure".to_string(),
            ));
        }

        for key in keys {
            state.objects.remove(key);
            state.content_types.remove(key);
            state.deleted_keys.push(key.clone());
        }
        Ok(())
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, BlobStoreError> {
        Ok(format!(
            "{}?content-type={}&expires={}",
            Self::fake_locator(key),
            content_type,
            expires_in.as_secs()
        ))
    }

    fn key_from_locator(&self, locator: &str) -> Option<String> {
        locator
            .strip_prefix(FAKE_LOCATOR_PREFIX)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}
