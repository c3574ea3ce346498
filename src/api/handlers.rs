use crate::api::request::{DeleteRequest, EditRequest, ImageSource, UploadRequest, UploadUrlRequest};
use crate::api::response::{ApiOperation, ApiResponse};
use crate::blob::BlobStore;
use crate::config::Config;
use crate::imaging::Renderer;
use crate::metadata::{MetadataStore, RecordFilter};
use crate::upload::{
    EditParams, MonotonicClock, PipelineError, RecordEditor, RetryPolicy, UploadPipeline,
    UploadReport,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Entry points of the service. Each turns a request into a response
/// envelope and never fails outright.
pub struct ImageService<B: BlobStore, M: MetadataStore, R: Renderer> {
    blob_store: Arc<B>,
    metadata_store: Arc<M>,
    pipeline: UploadPipeline<B, M, R>,
    editor: RecordEditor<B, M>,
    clock: Arc<MonotonicClock>,
    upload_prefix: String,
    presign_expiry: Duration,
}

impl<B: BlobStore, M: MetadataStore, R: Renderer> ImageService<B, M, R> {
    pub fn new(blob_store: Arc<B>, metadata_store: Arc<M>, renderer: Arc<R>, config: &Config) -> Self {
        let clock = Arc::new(MonotonicClock::new());

        Self {
            pipeline: UploadPipeline::new(
                Arc::clone(&blob_store),
                Arc::clone(&metadata_store),
                renderer,
                &config.pipeline,
                Arc::clone(&clock),
            ),
            editor: RecordEditor::new(
                Arc::clone(&blob_store),
                Arc::clone(&metadata_store),
                RetryPolicy::from_config(&config.pipeline),
                Arc::clone(&clock),
            ),
            blob_store,
            metadata_store,
            clock,
            upload_prefix: config.blob_store.upload_prefix.trim_end_matches('/').to_string(),
            presign_expiry: Duration::from_secs(config.blob_store.presign_expiry_seconds),
        }
    }

    pub async fn process_upload(&self, request: UploadRequest) -> ApiResponse {
        match self.try_process_upload(&request).await {
            Ok(report) => {
                info!(
                    "Processed upload {} into {} using {} attempt(s)",
                    request.image_name,
                    report.record.key(),
                    report.attempts
                );
                ApiResponse::success(ApiOperation::ProcessUpload).with_images(vec![report.record])
            }
            Err(e) => {
                error!("Failed to process upload {}: {}", request.image_name, e);
                ApiResponse::failure(ApiOperation::ProcessUpload)
            }
        }
    }

    async fn try_process_upload(
        &self,
        request: &UploadRequest,
    ) -> Result<UploadReport, PipelineError> {
        let params = request.params()?;

        match request.source()? {
            ImageSource::Inline(data) => self.pipeline.run(data, params).await,
            ImageSource::Stored(key) => {
                if !key.starts_with(&format!("{}/", self.upload_prefix)) {
                    return Err(PipelineError::InvalidRequest(format!(
                        "objectKey {} is outside {}/",
                        key, self.upload_prefix
                    )));
                }

                let data = self.blob_store.get_object(&key).await?;
                info!("Fetched uploaded object {} ({} bytes)", key, data.len());

                let report = self.pipeline.run(data, params).await?;

                if let Err(e) = self.blob_store.delete_objects(&[key.clone()]).await {
                    warn!("Failed to delete processed upload {}: {}", key, e);
                }
                Ok(report)
            }
        }
    }

    pub async fn edit_image(&self, request: EditRequest) -> ApiResponse {
        let params = EditParams::from(request);
        match self.editor.edit(&params).await {
            Ok(record) => ApiResponse::success(ApiOperation::EditImage).with_images(vec![record]),
            Err(e) => {
                error!("Failed to edit {}: {}", params.current_key(), e);
                ApiResponse::failure(ApiOperation::EditImage)
            }
        }
    }

    pub async fn delete_image(&self, request: DeleteRequest) -> ApiResponse {
        let key = request.key();
        match self.editor.delete(&key).await {
            Ok(_) => ApiResponse::success(ApiOperation::DeleteImage),
            Err(e) => {
                error!("Failed to delete {}: {}", key, e);
                ApiResponse::failure(ApiOperation::DeleteImage)
            }
        }
    }

    /// Pre-signed URL for a direct upload under the temporary prefix
    pub async fn upload_url(&self, request: UploadUrlRequest) -> ApiResponse {
        let file_name = request.file_name.replace(['/', '\\'], "_");
        if file_name.is_empty() {
            error!("Refusing to sign an upload without a file name");
            return ApiResponse::failure(ApiOperation::GetUploadUrl);
        }

        let object_key = format!(
            "{}/{}-{}",
            self.upload_prefix,
            self.clock.now_millis(),
            file_name
        );

        match self
            .blob_store
            .presign_upload(&object_key, &request.content_type, self.presign_expiry)
            .await
        {
            Ok(upload_url) => {
                info!("Generated pre-signed URL for {}", object_key);
                ApiResponse::success(ApiOperation::GetUploadUrl)
                    .with_upload_target(upload_url, object_key)
            }
            Err(e) => {
                error!("Failed to generate upload URL for {}: {}", object_key, e);
                ApiResponse::failure(ApiOperation::GetUploadUrl)
            }
        }
    }

    /// Live records of a category, newest first
    pub async fn fetch_images(&self, category: &str) -> ApiResponse {
        match self
            .metadata_store
            .query_category(category, RecordFilter::default())
            .await
        {
            Ok(records) => ApiResponse::success(ApiOperation::FetchImages)
                .with_images(records)
                .with_cache_control(),
            Err(e) => {
                error!("Failed to fetch images of {}: {}", category, e);
                ApiResponse::failure(ApiOperation::FetchImages)
            }
        }
    }
}
