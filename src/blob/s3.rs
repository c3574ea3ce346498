use crate::aws::load_sdk_config;
use crate::blob::error::BlobStoreError;
use crate::blob::storage::BlobStore;
use crate::config::{AwsConfig, BlobStoreConfig};
use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use aws_sdk_s3::Client;
use bytes::Bytes;
use std::time::Duration;
use tracing::{debug, info, warn};

/// S3 accepts at most this many keys per DeleteObjects request
const DELETE_BATCH_SIZE: usize = 1000;

/// Real S3 implementation of the BlobStore trait
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    locator_base: String,
}

impl S3BlobStore {
    /// Create a new S3BlobStore instance from configuration
    #[allow(dead_code)]
    pub async fn new(aws: &AwsConfig, config: &BlobStoreConfig) -> Result<Self, BlobStoreError> {
        if config.bucket.is_empty() {
            return Err(BlobStoreError::ConfigurationError(
                "blob_store.bucket must not be empty".to_string(),
            ));
        }

        let sdk_config = load_sdk_config(aws).await;
        Ok(Self::from_sdk_config(&sdk_config, &aws.region, config))
    }

    pub fn from_sdk_config(sdk_config: &SdkConfig, region: &str, config: &BlobStoreConfig) -> Self {
        let mut client_builder =
            aws_sdk_s3::config::Builder::from(sdk_config).force_path_style(config.force_path_style);

        // Create S3 client with endpoint override if provided
        if let Some(endpoint) = &config.endpoint {
            info!("Setting custom S3 endpoint: {}", endpoint);
            client_builder = client_builder.endpoint_url(endpoint);
        }

        let client = Client::from_conf(client_builder.build());
        let locator_base = locator_base(config, region);

        info!(
            "Created S3 blob store for bucket {} (locators under {})",
            config.bucket, locator_base
        );

        Self {
            client,
            bucket: config.bucket.clone(),
            locator_base,
        }
    }
}

/// Base URL under which stored objects are publicly addressed
fn locator_base(config: &BlobStoreConfig, region: &str) -> String {
    if let Some(base) = &config.public_base_url {
        return base.trim_end_matches('/').to_string();
    }

    match &config.endpoint {
        Some(endpoint) => format!("{}/{}", endpoint.trim_end_matches('/'), config.bucket),
        None => format!("https://{}.s3.{}.amazonaws.com", config.bucket, region),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn put_object(
        &self,
        key: &str,
        data: Bytes,
        content_type: &str,
    ) -> Result<String, BlobStoreError> {
        debug!("Uploading {} bytes to S3: {}", data.len(), key);

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| match e.code() {
                Some("AccessDenied") => {
                    BlobStoreError::AccessDenied(key.to_string(), e.to_string())
                }
                _ => BlobStoreError::WriteError(
                    key.to_string(),
                    DisplayErrorContext(&e).to_string(),
                ),
            })?;

        debug!("Successfully uploaded object to S3: {}", key);
        Ok(format!("{}/{}", self.locator_base, key))
    }

    async fn get_object(&self, key: &str) -> Result<Bytes, BlobStoreError> {
        debug!("Fetching object from S3: {}", key);

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| match e.code() {
                Some("NoSuchKey") | Some("KeyNotFound") => {
                    BlobStoreError::ObjectNotFound(key.to_string())
                }
                Some("AccessDenied") => {
                    BlobStoreError::AccessDenied(key.to_string(), e.to_string())
                }
                _ => BlobStoreError::ReadError(
                    key.to_string(),
                    DisplayErrorContext(&e).to_string(),
                ),
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| BlobStoreError::ReadError(key.to_string(), e.to_string()))?
            .into_bytes();

        debug!("Successfully fetched object from S3: {}", key);
        Ok(data)
    }

    async fn delete_objects(&self, keys: &[String]) -> Result<(), BlobStoreError> {
        if keys.is_empty() {
            return Ok(());
        }

        for batch in keys.chunks(DELETE_BATCH_SIZE) {
            let objects = batch
                .iter()
                .map(|key| ObjectIdentifier::builder().key(key).build())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| BlobStoreError::DeleteError(e.to_string()))?;

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .quiet(true)
                .build()
                .map_err(|e| BlobStoreError::DeleteError(e.to_string()))?;

            let output = self
                .client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| BlobStoreError::DeleteError(DisplayErrorContext(&e).to_string()))?;

            // Quiet mode only reports failures; missing keys are not among them
            let failed: Vec<&str> = output.errors().iter().filter_map(|e| e.key()).collect();
            if !failed.is_empty() {
                warn!("S3 refused to delete {} objects", failed.len());
                return Err(BlobStoreError::DeleteError(format!(
                    "failed to delete {}",
                    failed.join(", ")
                )));
            }
        }

        debug!("Deleted {} objects from S3", keys.len());
        Ok(())
    }

    async fn presign_upload(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> Result<String, BlobStoreError> {
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| BlobStoreError::PresignError(key.to_string(), e.to_string()))?;

        let request = self
            .client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .presigned(presigning)
            .await
            .map_err(|e| {
                BlobStoreError::PresignError(key.to_string(), DisplayErrorContext(&e).to_string())
            })?;

        info!("Generated pre-signed upload URL for {}", key);
        Ok(request.uri().to_string())
    }

    fn key_from_locator(&self, locator: &str) -> Option<String> {
        locator
            .strip_prefix(&self.locator_base)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|key| !key.is_empty())
            .map(str::to_string)
    }
}
