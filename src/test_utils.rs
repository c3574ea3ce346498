use crate::blob::FakeBlobStore;
use crate::config::{
    load_config, AwsConfig, BlobStoreConfig, Config, DeviceClassConfig, MetadataStoreConfig,
    PipelineConfig, RenderConfig,
};
use crate::metadata::ImageRecord;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage};
use std::collections::BTreeMap;
use std::io::Cursor;

/// Check if a test is enabled via environment variable
fn is_test_enabled(env_var: &str) -> bool {
    std::env::var(env_var)
        .map(|v| v.to_lowercase() == "true")
        .unwrap_or(false)
}

/// Check if S3 tests are enabled via environment variable
pub fn is_s3_enabled() -> bool {
    is_test_enabled("ENABLE_S3_TESTS")
}

/// Check if DynamoDB tests are enabled via environment variable
pub fn is_dynamo_enabled() -> bool {
    is_test_enabled("ENABLE_DYNAMO_TESTS")
}

/// Load test configuration from config.toml
pub fn load_test_config() -> Result<Config, anyhow::Error> {
    let config_path = "config.toml";

    load_config(config_path).map_err(|e| anyhow::anyhow!("Failed to load config.toml: {}", e))
}

/// In-memory configuration with two small device classes so renders stay fast
pub fn create_test_config() -> Config {
    Config {
        aws: AwsConfig {
            region: "us-east-1".to_string(),
            access_key_id: None,
            secret_access_key: None,
        },
        blob_store: BlobStoreConfig {
            bucket: "test-gallery".to_string(),
            endpoint: None,
            public_base_url: None,
            force_path_style: false,
            upload_prefix: "temp-uploads".to_string(),
            presign_expiry_seconds: 300,
        },
        metadata_store: MetadataStoreConfig {
            table: "test-images".to_string(),
            endpoint: None,
        },
        pipeline: PipelineConfig {
            max_attempts: 3,
            retry_delay_ms: 0,
            featured_tag: "biotc".to_string(),
            device_classes: vec![
                DeviceClassConfig {
                    name: "small".to_string(),
                    max_width: 64,
                    landscape_width: 48,
                    landscape_height: 32,
                    featured_width: 64,
                },
                DeviceClassConfig {
                    name: "large".to_string(),
                    max_width: 128,
                    landscape_width: 96,
                    landscape_height: 64,
                    featured_width: 128,
                },
            ],
        },
        render: RenderConfig::default(),
        logging: None,
    }
}

/// PNG bytes of a dark gradient with the given dimensions
pub fn sample_image_bytes(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 7 % 128) as u8, (y * 5 % 128) as u8, 100])
    });

    let mut bytes = Vec::new();
    DynamicImage::ImageRgb8(image)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .expect("Failed to encode sample image");
    bytes
}

/// Creates a live test record whose locators point into a `FakeBlobStore`
///
/// Keys are derived from the category and time, so records never share blobs.
pub fn create_test_record(category: &str, time: i64, featured: bool) -> ImageRecord {
    let variants: BTreeMap<String, String> = ["64", "128"]
        .iter()
        .map(|slot| {
            (
                slot.to_string(),
                FakeBlobStore::fake_locator(&format!("{}-{}-{}.jpeg", category, slot, time)),
            )
        })
        .collect();

    ImageRecord {
        category: category.to_string(),
        upload_time: time,
        update_time: time,
        variants,
        original: FakeBlobStore::fake_locator(&format!("{}-original-{}.jpeg", category, time)),
        featured,
        panorama: false,
        portrait: false,
        description: "test image".to_string(),
        source_resolution: "1200:800".to_string(),
        removed: false,
    }
}
