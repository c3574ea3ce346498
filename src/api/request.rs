//! Inbound request bodies.

use crate::imaging::SourceResolution;
use crate::metadata::RecordKey;
use crate::upload::{file_stem, EditParams, PipelineError, UploadParams};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use bytes::Bytes;
use serde::Deserialize;

/// Body of an upload: either inline base64 `image` data or the `objectKey` of
/// a direct upload, never both
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub image: Option<String>,
    pub object_key: Option<String>,
    pub image_name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// `"<width>:<height>"` of the source image
    pub resolution: String,
    #[serde(default)]
    pub biotc: bool,
    #[serde(default)]
    pub portrait: bool,
    #[serde(default)]
    pub panorama: bool,
}

/// Where the raw upload bytes come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageSource {
    Inline(Bytes),
    Stored(String),
}

impl UploadRequest {
    pub fn source(&self) -> Result<ImageSource, PipelineError> {
        match (&self.image, &self.object_key) {
            (Some(_), Some(_)) => Err(PipelineError::InvalidRequest(
                "image and objectKey are mutually exclusive".to_string(),
            )),
            (None, None) => Err(PipelineError::InvalidRequest(
                "one of image or objectKey is required".to_string(),
            )),
            (Some(data), None) => decode_inline_image(data).map(ImageSource::Inline),
            (None, Some(key)) if key.is_empty() => Err(PipelineError::InvalidRequest(
                "objectKey must not be empty".to_string(),
            )),
            (None, Some(key)) => Ok(ImageSource::Stored(key.clone())),
        }
    }

    pub fn params(&self) -> Result<UploadParams, PipelineError> {
        if self.category.trim().is_empty() {
            return Err(PipelineError::InvalidRequest(
                "category must not be empty".to_string(),
            ));
        }

        let file_stem = file_stem(&self.image_name);
        if file_stem.is_empty() {
            return Err(PipelineError::InvalidRequest(
                "imageName must not be empty".to_string(),
            ));
        }

        Ok(UploadParams {
            category: self.category.clone(),
            description: self.description.clone(),
            file_stem,
            source_resolution: self.resolution.parse::<SourceResolution>()?,
            featured: self.biotc,
            portrait: self.portrait,
            panorama: self.panorama,
        })
    }
}

/// Decode bare base64 or a `data:<mime>;base64,<payload>` URL
pub fn decode_inline_image(data: &str) -> Result<Bytes, PipelineError> {
    let payload = match data.strip_prefix("data:") {
        Some(rest) => rest
            .split_once(";base64,")
            .map(|(_, payload)| payload)
            .ok_or_else(|| {
                PipelineError::InvalidRequest("data URL is not base64 encoded".to_string())
            })?,
        None => data,
    };

    STANDARD
        .decode(payload.trim())
        .map(Bytes::from)
        .map_err(|e| PipelineError::InvalidRequest(format!("image is not valid base64: {}", e)))
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditRequest {
    pub current_category: String,
    pub new_category: String,
    #[serde(default)]
    pub description: String,
    pub update_time: i64,
}

impl From<EditRequest> for EditParams {
    fn from(request: EditRequest) -> Self {
        EditParams {
            current_category: request.current_category,
            new_category: request.new_category,
            description: request.description,
            update_time: request.update_time,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteRequest {
    pub category: String,
    pub update_time: i64,
}

impl DeleteRequest {
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.category.clone(), self.update_time)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadUrlRequest {
    pub file_name: String,
    pub content_type: String,
}
