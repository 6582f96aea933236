use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request a presigned PUT URL for a new clip (authenticated).
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadRequest {
    pub event_id: i64,
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1, max = 127))]
    pub content_type: String,
    pub file_size: Option<i64>,
    /// Display position within the event. Reserved atomically when omitted.
    pub index: Option<i64>,
    /// Display name. Defaults to the filename.
    #[validate(length(max = 200))]
    pub name: Option<String>,
}

/// Request a presigned PUT URL through a public upload link.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicPresignRequest {
    #[validate(length(min = 1, max = 255))]
    pub filename: String,
    #[validate(length(min = 1, max = 127))]
    pub content_type: String,
    pub file_size: Option<i64>,
    pub index: Option<i64>,
    #[validate(length(max = 200))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub uploader_name: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresignUploadResponse {
    pub clip_id: i64,
    pub key: String,
    pub presigned_url: String,
    pub expires_at: DateTime<Utc>,
    pub index: i64,
}

/// Body posted by the first-party processing job.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessingCallback {
    pub clip_id: i64,
    pub duration_s: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub hls_prefix: Option<String>,
    #[serde(default)]
    pub failed: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CallbackAck {
    pub ok: bool,
}
