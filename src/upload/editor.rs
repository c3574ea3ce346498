use crate::blob::BlobStore;
use crate::metadata::{FlagUpdate, ImageRecord, MetadataError, MetadataStore, RecordKey};
use crate::upload::arbiter::record_blob_keys;
use crate::upload::clock::MonotonicClock;
use crate::upload::error::PipelineError;
use crate::upload::retry::RetryPolicy;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Moves or redescribes an existing record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditParams {
    pub current_category: String,
    pub new_category: String,
    pub description: String,
    pub update_time: i64,
}

impl EditParams {
    pub fn current_key(&self) -> RecordKey {
        RecordKey::new(self.current_category.clone(), self.update_time)
    }
}

/// Edit and delete operations on committed records, under the same retry
/// budget as uploads
pub struct RecordEditor<B: BlobStore, M: MetadataStore> {
    blob_store: Arc<B>,
    metadata_store: Arc<M>,
    retry: RetryPolicy,
    clock: Arc<MonotonicClock>,
}

impl<B: BlobStore, M: MetadataStore> RecordEditor<B, M> {
    pub fn new(
        blob_store: Arc<B>,
        metadata_store: Arc<M>,
        retry: RetryPolicy,
        clock: Arc<MonotonicClock>,
    ) -> Self {
        Self {
            blob_store,
            metadata_store,
            retry,
            clock,
        }
    }

    /// Rewrite a record under `updateTime + 1` in its new category and
    /// soft-delete the old one. Blobs are untouched. A different record
    /// already stored under the new key is never overwritten.
    pub async fn edit(&self, params: &EditParams) -> Result<ImageRecord, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let (record, _) = self
            .retry
            .run("edit", &run_id, |_| self.edit_attempt(params))
            .await?;

        info!(
            "[Upload {}] Edited {} -> {}",
            run_id,
            params.current_key(),
            record.key()
        );
        Ok(record)
    }

    async fn edit_attempt(&self, params: &EditParams) -> Result<ImageRecord, PipelineError> {
        let current_key = params.current_key();
        let current = self.live_record(&current_key).await?;

        let mut edited = current.clone();
        edited.category = params.new_category.clone();
        edited.description = params.description.clone();
        edited.update_time = current.update_time + 1;
        if edited.featured && edited.category != current.category {
            // The target category keeps its own featured record
            edited.featured = false;
        }

        match self.metadata_store.create_record(&edited).await {
            Ok(()) => {}
            Err(MetadataError::ConditionFailed(_)) => {
                // A previous attempt may have written this record before failing
                let existing = self.metadata_store.get_record(&edited.key()).await?;
                if existing.as_ref() != Some(&edited) {
                    return Err(PipelineError::RecordExists(edited.key()));
                }
            }
            Err(e) => return Err(e.into()),
        }
        self.clock.observe(edited.update_time);
        self.metadata_store
            .update_flags(&current_key, FlagUpdate::soft_delete())
            .await?;

        Ok(edited)
    }

    /// Soft-delete a record and remove its blobs. Returns the record as it was.
    pub async fn delete(&self, key: &RecordKey) -> Result<ImageRecord, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        let (record, _) = self
            .retry
            .run("delete", &run_id, |_| self.delete_attempt(&run_id, key))
            .await?;

        info!("[Upload {}] Deleted {}", run_id, key);
        Ok(record)
    }

    async fn delete_attempt(
        &self,
        run_id: &str,
        key: &RecordKey,
    ) -> Result<ImageRecord, PipelineError> {
        let record = self
            .metadata_store
            .get_record(key)
            .await?
            .ok_or_else(|| PipelineError::RecordNotFound(key.clone()))?;

        if record.removed {
            warn!(
                "[Upload {}] Record {} is already removed, deleting its blobs again",
                run_id, key
            );
        }

        let blob_keys = record_blob_keys(self.blob_store.as_ref(), &record);
        let (flagged, deleted) = tokio::join!(
            self.metadata_store
                .update_flags(key, FlagUpdate::soft_delete()),
            self.blob_store.delete_objects(&blob_keys),
        );
        flagged?;
        deleted?;

        Ok(record)
    }

    async fn live_record(&self, key: &RecordKey) -> Result<ImageRecord, PipelineError> {
        match self.metadata_store.get_record(key).await? {
            Some(record) if !record.removed => Ok(record),
            _ => Err(PipelineError::RecordNotFound(key.clone())),
        }
    }
}
