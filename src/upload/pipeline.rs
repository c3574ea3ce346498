use crate::blob::BlobStore;
use crate::config::PipelineConfig;
use crate::imaging::{device_classes, target_size, DeviceClass, Renderer};
use crate::metadata::{ImageRecord, MetadataStore};
use crate::upload::arbiter::FeaturedArbiter;
use crate::upload::clock::MonotonicClock;
use crate::upload::error::PipelineError;
use crate::upload::params::UploadParams;
use crate::upload::retry::RetryPolicy;
use bytes::Bytes;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Outcome of a successful upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadReport {
    pub record: ImageRecord,
    pub attempts: u32,
}

/// Renders every device class variant of an upload, stores the blobs,
/// retires the previous featured record when needed and commits one record.
///
/// Any failure restarts the whole sequence with fresh renders and keys.
/// Blobs written by an abandoned attempt are left in place.
pub struct UploadPipeline<B: BlobStore, M: MetadataStore, R: Renderer> {
    blob_store: Arc<B>,
    metadata_store: Arc<M>,
    renderer: Arc<R>,
    arbiter: FeaturedArbiter<B, M>,
    classes: Vec<DeviceClass>,
    featured_tag: String,
    retry: RetryPolicy,
    clock: Arc<MonotonicClock>,
}

impl<B: BlobStore, M: MetadataStore, R: Renderer> UploadPipeline<B, M, R> {
    pub fn new(
        blob_store: Arc<B>,
        metadata_store: Arc<M>,
        renderer: Arc<R>,
        config: &PipelineConfig,
        clock: Arc<MonotonicClock>,
    ) -> Self {
        Self {
            arbiter: FeaturedArbiter::new(Arc::clone(&blob_store), Arc::clone(&metadata_store)),
            blob_store,
            metadata_store,
            renderer,
            classes: device_classes(&config.device_classes),
            featured_tag: config.featured_tag.clone(),
            retry: RetryPolicy::from_config(config),
            clock,
        }
    }

    pub async fn run(
        &self,
        data: Bytes,
        params: UploadParams,
    ) -> Result<UploadReport, PipelineError> {
        let run_id = Uuid::new_v4().to_string();
        info!(
            "[Upload {}] Processing {} ({} bytes, {}) for category {}{}",
            run_id,
            params.file_stem,
            data.len(),
            params.source_resolution,
            params.category,
            if params.featured { " as featured" } else { "" }
        );

        let (record, attempts) = self
            .retry
            .run("upload", &run_id, |number| {
                self.attempt(&run_id, number, data.clone(), &params)
            })
            .await?;

        info!(
            "[Upload {}] Committed record {} after {} attempt(s)",
            run_id,
            record.key(),
            attempts
        );
        Ok(UploadReport { record, attempts })
    }

    async fn attempt(
        &self,
        run_id: &str,
        number: u32,
        data: Bytes,
        params: &UploadParams,
    ) -> Result<ImageRecord, PipelineError> {
        let attempt_time = self.clock.now_millis();
        debug!(
            "[Upload {}] Attempt {} rendering {} classes at {}",
            run_id,
            number,
            self.classes.len(),
            attempt_time
        );

        let mut record = draft_record(params);

        // Every upload runs to completion before any failure is reported
        let stored = join_all(self.classes.iter().map(|class| {
            self.render_and_store(run_id, class, data.clone(), params, attempt_time)
        }))
        .await;

        for (class, locator) in self.classes.iter().zip(stored) {
            let locator = locator?;
            match class.variant_slot() {
                Some(slot) => {
                    record.variants.insert(slot, locator);
                }
                None => record.original = locator,
            }
        }

        if params.featured {
            self.arbiter.promote(run_id, &params.category).await?;
        }

        let commit_time = self.clock.now_millis();
        record.upload_time = commit_time;
        record.update_time = commit_time;
        self.metadata_store.put_record(&record).await?;

        Ok(record)
    }

    async fn render_and_store(
        &self,
        run_id: &str,
        class: &DeviceClass,
        data: Bytes,
        params: &UploadParams,
        attempt_time: i64,
    ) -> Result<String, PipelineError> {
        let target = target_size(class, params.hints(), params.source_resolution);
        let renderer = Arc::clone(&self.renderer);

        let encoded = tokio::task::spawn_blocking(move || renderer.render(&data, target))
            .await
            .map_err(|e| PipelineError::TaskFailed(e.to_string()))??;

        let key = params.blob_key(
            class,
            &self.featured_tag,
            attempt_time,
            self.renderer.extension(),
        );
        debug!(
            "[Upload {}] Rendered {} at {} ({} bytes) -> {}",
            run_id,
            class.name(),
            target,
            encoded.len(),
            key
        );

        let locator = self
            .blob_store
            .put_object(&key, Bytes::from(encoded), self.renderer.content_type())
            .await?;
        Ok(locator)
    }
}

fn draft_record(params: &UploadParams) -> ImageRecord {
    ImageRecord {
        category: params.category.clone(),
        upload_time: 0,
        update_time: 0,
        variants: BTreeMap::new(),
        original: String::new(),
        featured: params.featured,
        panorama: params.panorama,
        portrait: params.portrait,
        description: params.description.clone(),
        source_resolution: params.source_resolution.to_string(),
        removed: false,
    }
}
