// src/main.rs
use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing::info;

mod api;
mod aws;
mod blob;
mod config;
mod imaging;
mod logging;
mod metadata;
mod upload;
#[cfg(test)]
mod test_utils;

use crate::api::{ApiResponse, DeleteRequest, EditRequest, ImageService, UploadRequest, UploadUrlRequest};
use crate::blob::S3BlobStore;
use crate::imaging::{probe_resolution, JpegRenderer};
use crate::metadata::DynamoMetadataStore;

type Service = ImageService<S3BlobStore, DynamoMetadataStore, JpegRenderer>;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(
        short,
        long,
        value_name = "FILE",
        default_value = "config.toml",
        global = true
    )]
    config: String,

    /// Show verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a local image file
    Upload {
        path: PathBuf,

        #[arg(long)]
        category: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Make this the featured image of its category
        #[arg(long)]
        featured: bool,

        #[arg(long)]
        portrait: bool,

        #[arg(long)]
        panorama: bool,

        /// Source dimensions as WIDTH:HEIGHT; read from the file when omitted
        #[arg(long)]
        resolution: Option<String>,
    },
    /// Run an upload request body (JSON)
    Process { request: PathBuf },
    /// Run an edit request body (JSON)
    Edit { request: PathBuf },
    /// Run a delete request body (JSON)
    Delete { request: PathBuf },
    /// Generate a pre-signed URL for a direct upload
    UploadUrl {
        #[arg(long)]
        file_name: String,

        #[arg(long)]
        content_type: String,
    },
    /// List the live images of a category
    List {
        #[arg(long)]
        category: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match config::load_config(&cli.config) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Failed to load configuration from {}: {:#}", cli.config, e);
            process::exit(1);
        }
    };

    let log_guard = logging::init_logging(config.logging.as_ref(), cli.verbose)?;
    info!("Gallery ingest v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from: {}", cli.config);

    let service = initialize_service(&config).await?;
    let response = dispatch(&service, cli.command).await?;

    println!("{}", serde_json::to_string_pretty(&response)?);

    if !response.is_success() {
        drop(log_guard);
        process::exit(1);
    }

    Ok(())
}

async fn dispatch(service: &Service, command: Commands) -> Result<ApiResponse> {
    let response = match command {
        Commands::Upload {
            path,
            category,
            description,
            featured,
            portrait,
            panorama,
            resolution,
        } => {
            let data = std::fs::read(&path)
                .with_context(|| format!("Failed to read image {}", path.display()))?;
            let resolution = match resolution {
                Some(resolution) => resolution,
                None => probe_resolution(&data)
                    .with_context(|| format!("Failed to read dimensions of {}", path.display()))?
                    .to_string(),
            };
            let image_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            service
                .process_upload(UploadRequest {
                    image: Some(STANDARD.encode(&data)),
                    object_key: None,
                    image_name,
                    category,
                    description,
                    resolution,
                    biotc: featured,
                    portrait,
                    panorama,
                })
                .await
        }
        Commands::Process { request } => {
            service
                .process_upload(read_request::<UploadRequest>(&request)?)
                .await
        }
        Commands::Edit { request } => {
            service
                .edit_image(read_request::<EditRequest>(&request)?)
                .await
        }
        Commands::Delete { request } => {
            service
                .delete_image(read_request::<DeleteRequest>(&request)?)
                .await
        }
        Commands::UploadUrl {
            file_name,
            content_type,
        } => {
            service
                .upload_url(UploadUrlRequest {
                    file_name,
                    content_type,
                })
                .await
        }
        Commands::List { category } => service.fetch_images(&category).await,
    };

    Ok(response)
}

fn read_request<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read request {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse request {}", path.display()))
}

/// Build the service over S3 and DynamoDB sharing one SDK configuration
async fn initialize_service(config: &config::Config) -> Result<Service> {
    let sdk_config = aws::load_sdk_config(&config.aws).await;

    let blob_store = S3BlobStore::from_sdk_config(&sdk_config, &config.aws.region, &config.blob_store);
    let metadata_store = DynamoMetadataStore::from_sdk_config(&sdk_config, &config.metadata_store);
    let renderer = JpegRenderer::new(&config.render);

    info!("Image service initialized successfully");

    Ok(ImageService::new(
        Arc::new(blob_store),
        Arc::new(metadata_store),
        Arc::new(renderer),
        config,
    ))
}
