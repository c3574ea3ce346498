use crate::blob::BlobStore;
use crate::metadata::{FlagUpdate, ImageRecord, MetadataStore, RecordFilter, RecordKey};
use crate::upload::error::PipelineError;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Blob keys behind every locator of `record`. Locators from another store are skipped.
pub(crate) fn record_blob_keys<B: BlobStore + ?Sized>(
    blob_store: &B,
    record: &ImageRecord,
) -> Vec<String> {
    record
        .blob_locators()
        .into_iter()
        .filter_map(|locator| {
            let key = blob_store.key_from_locator(locator);
            if key.is_none() {
                warn!(
                    "Record {} references a locator outside the blob store: {}",
                    record.key(),
                    locator
                );
            }
            key
        })
        .collect()
}

/// Keeps at most one live featured record per category
pub struct FeaturedArbiter<B: BlobStore, M: MetadataStore> {
    blob_store: Arc<B>,
    metadata_store: Arc<M>,
}

impl<B: BlobStore, M: MetadataStore> FeaturedArbiter<B, M> {
    pub fn new(blob_store: Arc<B>, metadata_store: Arc<M>) -> Self {
        Self {
            blob_store,
            metadata_store,
        }
    }

    /// Retire the current featured record of `category`, if any.
    ///
    /// The demotion is conditional on the record still being featured, so a
    /// concurrent promotion that got there first fails this call with
    /// `ConditionFailed`. Returns the key of the demoted record.
    pub async fn promote(
        &self,
        run_id: &str,
        category: &str,
    ) -> Result<Option<RecordKey>, PipelineError> {
        let featured = self
            .metadata_store
            .query_category(category, RecordFilter::featured_only())
            .await?;

        let Some(current) = featured.first() else {
            debug!(
                "[Upload {}] No featured record in category {}",
                run_id, category
            );
            return Ok(None);
        };

        if featured.len() > 1 {
            warn!(
                "[Upload {}] Category {} has {} featured records, demoting only the newest ({})",
                run_id,
                category,
                featured.len(),
                current.key()
            );
        }

        let key = current.key();
        let blob_keys = record_blob_keys(self.blob_store.as_ref(), current);

        info!(
            "[Upload {}] Demoting featured record {} and deleting {} blobs",
            run_id,
            key,
            blob_keys.len()
        );

        let (demoted, deleted) = tokio::join!(
            self.metadata_store
                .update_flags(&key, FlagUpdate::demote_featured()),
            self.blob_store.delete_objects(&blob_keys),
        );
        demoted?;
        deleted?;

        Ok(Some(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob::FakeBlobStore;
    use crate::metadata::{FakeMetadataStore, MetadataError};
    use crate::test_utils::create_test_record;
    use bytes::Bytes;

    fn arbiter(
        blob_store: &FakeBlobStore,
        metadata_store: &FakeMetadataStore,
    ) -> FeaturedArbiter<FakeBlobStore, FakeMetadataStore> {
        FeaturedArbiter::new(
            Arc::new(blob_store.clone()),
            Arc::new(metadata_store.clone()),
        )
    }

    /// A record whose locators point at blobs present in the fake store
    async fn seeded_record(blob_store: &FakeBlobStore, category: &str, time: i64) -> ImageRecord {
        let record = create_test_record(category, time, true);
        for locator in record.blob_locators() {
            let key = blob_store.key_from_locator(locator).unwrap();
            blob_store
                .fake_add_object(&key, Bytes::from_static(b"jpeg"))
                .await;
        }
        record
    }

    #[tokio::test]
    async fn promote_without_featured_record_is_a_no_op() {
        let blobs = FakeBlobStore::new();
        let metadata = FakeMetadataStore::new();
        let plain = create_test_record("landscapes", 1, false);
        metadata.fake_add_record(plain.clone());
        let arbiter = arbiter(&blobs, &metadata);

        for _ in 0..2 {
            assert_eq!(arbiter.promote("run", "landscapes").await.unwrap(), None);
        }
        assert_eq!(metadata.fake_records(), vec![plain]);
        assert!(blobs.fake_deleted_keys().await.is_empty());
    }

    #[tokio::test]
    async fn promote_demotes_and_deletes_blobs() {
        let blobs = FakeBlobStore::new();
        let metadata = FakeMetadataStore::new();
        let current = seeded_record(&blobs, "landscapes", 10).await;
        metadata.fake_add_record(current.clone());

        let demoted = arbiter(&blobs, &metadata)
            .promote("run", "landscapes")
            .await
            .unwrap();

        assert_eq!(demoted, Some(current.key()));
        let stored = metadata.fake_record(&current.key()).unwrap();
        assert!(!stored.featured);
        assert!(stored.removed);
        assert!(blobs.fake_keys().await.is_empty());
    }

    #[tokio::test]
    async fn promote_leaves_other_categories_alone() {
        let blobs = FakeBlobStore::new();
        let metadata = FakeMetadataStore::new();
        let other = seeded_record(&blobs, "portraits", 10).await;
        metadata.fake_add_record(other.clone());

        arbiter(&blobs, &metadata)
            .promote("run", "landscapes")
            .await
            .unwrap();

        assert_eq!(metadata.fake_record(&other.key()), Some(other));
        assert!(!blobs.fake_keys().await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_featured_records_demote_the_newest() {
        let blobs = FakeBlobStore::new();
        let metadata = FakeMetadataStore::new();
        let older = seeded_record(&blobs, "landscapes", 10).await;
        let newer = seeded_record(&blobs, "landscapes", 20).await;
        metadata.fake_add_record(older.clone());
        metadata.fake_add_record(newer.clone());

        let demoted = arbiter(&blobs, &metadata)
            .promote("run", "landscapes")
            .await
            .unwrap();

        assert_eq!(demoted, Some(newer.key()));
        assert!(metadata.fake_record(&older.key()).unwrap().featured);
    }

    #[tokio::test]
    async fn failed_demotion_fails_promote() {
        let blobs = FakeBlobStore::new();
        let metadata = FakeMetadataStore::new();
        metadata.fake_add_record(seeded_record(&blobs, "landscapes", 10).await);
        metadata.fake_fail_updates(1);

        let result = arbiter(&blobs, &metadata)
            .promote("run", "landscapes")
            .await;

        assert!(matches!(
            result,
            Err(PipelineError::Metadata(MetadataError::WriteError(_)))
        ));
    }

    #[test]
    fn foreign_locators_are_skipped() {
        let blobs = FakeBlobStore::new();
        let mut record = create_test_record("landscapes", 1, false);
        record.variants.clear();
        record
            .variants
            .insert("576".to_string(), "https://elsewhere.example/a.jpeg".to_string());
        record.original = FakeBlobStore::fake_locator("landscapes-original-1.jpeg");

        let keys = record_blob_keys(&blobs, &record);
        assert_eq!(keys, vec!["landscapes-original-1.jpeg".to_string()]);
    }
}
