use anyhow::{bail, Result};
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub aws: AwsConfig,
    pub blob_store: BlobStoreConfig,
    pub metadata_store: MetadataStoreConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
    #[serde(default)]
    pub render: RenderConfig,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AwsConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlobStoreConfig {
    pub bucket: String,
    pub endpoint: Option<String>,
    /// Base URL locators are built from; derived from bucket/region when absent
    pub public_base_url: Option<String>,
    #[serde(default)]
    pub force_path_style: bool,
    #[serde(default = "default_upload_prefix")]
    pub upload_prefix: String,
    #[serde(default = "default_presign_expiry_seconds")]
    pub presign_expiry_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataStoreConfig {
    pub table: String,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default)]
    pub retry_delay_ms: u64,
    /// Inserted into blob keys of featured uploads
    #[serde(default = "default_featured_tag")]
    pub featured_tag: String,
    #[serde(default = "default_device_classes")]
    pub device_classes: Vec<DeviceClassConfig>,
}

/// Target constants for one viewport tier. The "original" class is implicit.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DeviceClassConfig {
    pub name: String,
    /// Viewport width threshold; keys the record's variant map
    pub max_width: u32,
    pub landscape_width: u32,
    pub landscape_height: u32,
    pub featured_width: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderConfig {
    #[serde(default = "default_quality")]
    pub quality: u8,
    #[serde(default = "default_background")]
    pub background: [u8; 3],
    /// Largest canvas, in pixels, a single variant may be rendered at
    #[serde(default = "default_max_pixels")]
    pub max_pixels: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    pub path: Option<String>,
    /// Rotation threshold in MiB
    #[serde(default = "default_log_size")]
    pub size: u64,
    #[serde(default = "default_log_max_files")]
    pub max_files: usize,
}

fn default_upload_prefix() -> String {
    "temp-uploads".to_string()
}

fn default_presign_expiry_seconds() -> u64 {
    300
}

fn default_max_attempts() -> u32 {
    3
}

fn default_featured_tag() -> String {
    "biotc".to_string()
}

fn default_device_classes() -> Vec<DeviceClassConfig> {
    vec![
        DeviceClassConfig {
            name: "handheld".to_string(),
            max_width: 576,
            landscape_width: 540,
            landscape_height: 360,
            featured_width: 576,
        },
        DeviceClassConfig {
            name: "tablet".to_string(),
            max_width: 992,
            landscape_width: 900,
            landscape_height: 600,
            featured_width: 992,
        },
        DeviceClassConfig {
            name: "laptop".to_string(),
            max_width: 1920,
            landscape_width: 1500,
            landscape_height: 1000,
            featured_width: 1920,
        },
    ]
}

fn default_quality() -> u8 {
    85
}

fn default_background() -> [u8; 3] {
    [255, 255, 255]
}

fn default_max_pixels() -> u64 {
    100_000_000
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_size() -> u64 {
    10
}

fn default_log_max_files() -> usize {
    5
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_delay_ms: 0,
            featured_tag: default_featured_tag(),
            device_classes: default_device_classes(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            quality: default_quality(),
            background: default_background(),
            max_pixels: default_max_pixels(),
        }
    }
}

impl Config {
    /// Reject configurations the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.pipeline.max_attempts == 0 {
            bail!("pipeline.max_attempts must be at least 1");
        }
        if self.pipeline.featured_tag.is_empty() {
            bail!("pipeline.featured_tag must not be empty");
        }
        if !(1..=100).contains(&self.render.quality) {
            bail!(
                "render.quality must be between 1 and 100, got {}",
                self.render.quality
            );
        }
        if self.render.max_pixels == 0 {
            bail!("render.max_pixels must be at least 1");
        }

        let mut names = HashSet::new();
        let mut widths = HashSet::new();
        for class in &self.pipeline.device_classes {
            if class.name.eq_ignore_ascii_case("original") {
                bail!("device class name 'original' is reserved");
            }
            if !names.insert(class.name.as_str()) {
                bail!("duplicate device class '{}'", class.name);
            }
            if !widths.insert(class.max_width) {
                bail!(
                    "device class '{}' reuses max_width {}",
                    class.name,
                    class.max_width
                );
            }
            if class.max_width == 0
                || class.landscape_width == 0
                || class.landscape_height == 0
                || class.featured_width == 0
            {
                bail!("device class '{}' has a zero dimension", class.name);
            }
        }

        Ok(())
    }
}

pub fn load_config(path: &str) -> Result<Config> {
    let config_text = fs::read_to_string(Path::new(path))?;
    let config: Config = toml::from_str(&config_text)?;
    config.validate()?;
    Ok(config)
}
