//! HTTP-shaped response envelope shared by every operation.

use crate::metadata::ImageRecord;
use serde::Serialize;
use std::collections::BTreeMap;

const CACHE_CONTROL: &str = "no-cache, max-age=2592000";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiOperation {
    ProcessUpload,
    FetchImages,
    EditImage,
    DeleteImage,
    GetUploadUrl,
}

impl ApiOperation {
    pub fn success_message(&self) -> &'static str {
        match self {
            ApiOperation::ProcessUpload => "Processed and stored image successfully.",
            ApiOperation::FetchImages => "Successfully fetched data.",
            ApiOperation::EditImage => "Updated image metadata successfully.",
            ApiOperation::DeleteImage => "Deleted image successfully.",
            ApiOperation::GetUploadUrl => "Generated upload URL.",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            ApiOperation::ProcessUpload => "Failed to process image.",
            ApiOperation::FetchImages => "Failed to fetch data.",
            ApiOperation::EditImage => "Failed to update image metadata.",
            ApiOperation::DeleteImage => "Failed to delete image.",
            ApiOperation::GetUploadUrl => "Failed to generate upload URL.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<ImageRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: ResponseBody,
}

impl ApiResponse {
    fn new(status_code: u16, message: &str) -> Self {
        Self {
            status_code,
            headers: BTreeMap::from([(
                "Access-Control-Allow-Origin".to_string(),
                "*".to_string(),
            )]),
            body: ResponseBody {
                message: message.to_string(),
                images: None,
                upload_url: None,
                object_key: None,
            },
        }
    }

    pub fn success(operation: ApiOperation) -> Self {
        Self::new(200, operation.success_message())
    }

    pub fn failure(operation: ApiOperation) -> Self {
        Self::new(500, operation.failure_message())
    }

    pub fn with_images(mut self, images: Vec<ImageRecord>) -> Self {
        self.body.images = Some(images);
        self
    }

    pub fn with_cache_control(mut self) -> Self {
        self.headers
            .insert("Cache-Control".to_string(), CACHE_CONTROL.to_string());
        self
    }

    pub fn with_upload_target(mut self, upload_url: String, object_key: String) -> Self {
        self.headers.insert(
            "Access-Control-Allow-Headers".to_string(),
            "Content-Type,Authorization".to_string(),
        );
        self.body.upload_url = Some(upload_url);
        self.body.object_key = Some(object_key);
        self
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}
