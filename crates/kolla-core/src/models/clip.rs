use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use super::team::Actor;

/// Lifecycle of a clip. The only legal path is
/// `uploading -> uploaded -> processing -> (ready | failed)`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ClipStatus {
    /// Row created by presign, bytes not yet confirmed
    Uploading,
    Uploaded,
    Processing,
    Ready,
    Failed,
}

impl ClipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ClipStatus::Uploading => "uploading",
            ClipStatus::Uploaded => "uploaded",
            ClipStatus::Processing => "processing",
            ClipStatus::Ready => "ready",
            ClipStatus::Failed => "failed",
        }
    }

    /// The single status a clip must be in to move to `self`.
    pub fn predecessor(&self) -> Option<ClipStatus> {
        match self {
            ClipStatus::Uploading => None,
            ClipStatus::Uploaded => Some(ClipStatus::Uploading),
            ClipStatus::Processing => Some(ClipStatus::Uploaded),
            ClipStatus::Ready | ClipStatus::Failed => Some(ClipStatus::Processing),
        }
    }

    pub fn can_transition_to(&self, next: ClipStatus) -> bool {
        next.predecessor() == Some(*self)
    }
}

impl Display for ClipStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClipStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "uploading" => Ok(ClipStatus::Uploading),
            "uploaded" => Ok(ClipStatus::Uploaded),
            "processing" => Ok(ClipStatus::Processing),
            "ready" => Ok(ClipStatus::Ready),
            "failed" => Ok(ClipStatus::Failed),
            other => Err(anyhow::anyhow!("Invalid clip status: {}", other)),
        }
    }
}

/// Approval gate for clips submitted through public upload links.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

impl ApprovalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalStatus::Pending => "pending",
            ApprovalStatus::Approved => "approved",
        }
    }
}

impl Display for ApprovalStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApprovalStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ApprovalStatus::Pending),
            "approved" => Ok(ApprovalStatus::Approved),
            other => Err(anyhow::anyhow!("Invalid approval status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Clip {
    pub id: i64,
    pub team_id: i64,
    pub event_id: i64,
    pub uploader_id: Option<Uuid>,
    pub uploader_name: Option<String>,
    pub name: String,
    pub storage_key: String,
    pub content_type: String,
    pub file_size: Option<i64>,
    pub hls_prefix: Option<String>,
    pub duration_s: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub status: ClipStatus,
    pub fail_reason: Option<String>,
    pub approval_status: ApprovalStatus,
    pub index: i64,
    pub transcoding_job_id: Option<String>,
    pub upload_link_id: Option<i64>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Clip {
    /// Key of the HLS master manifest, once the rendition exists.
    pub fn master_playlist_key(&self) -> Option<String> {
        self.hls_prefix
            .as_ref()
            .filter(|_| self.status == ClipStatus::Ready)
            .map(|prefix| format!("{}master.m3u8", prefix))
    }

    /// Clips awaiting approval are hidden from everyone but coaches.
    pub fn visible_to(&self, actor: &Actor) -> bool {
        actor.is_coach() || self.approval_status == ApprovalStatus::Approved
    }

    /// What an anonymous share link may expose.
    pub fn is_shareable(&self) -> bool {
        self.approval_status == ApprovalStatus::Approved && self.status == ClipStatus::Ready
    }
}

/// Insert payload for a new clip row.
#[derive(Debug, Clone)]
pub struct NewClip {
    pub team_id: i64,
    pub event_id: i64,
    pub uploader_id: Option<Uuid>,
    pub uploader_name: Option<String>,
    pub name: String,
    pub storage_key: String,
    pub content_type: String,
    pub file_size: Option<i64>,
    pub approval_status: ApprovalStatus,
    pub index: i64,
    pub upload_link_id: Option<i64>,
}

/// Media metadata from processing. Each field is write-once on the clip row.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClipMetadata {
    pub duration_s: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

impl ClipMetadata {
    pub fn is_empty(&self) -> bool {
        self.duration_s.is_none() && self.width.is_none() && self.height.is_none()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipResponse {
    pub id: i64,
    pub event_id: i64,
    pub name: String,
    pub status: ClipStatus,
    pub approval_status: ApprovalStatus,
    pub index: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploader_name: Option<String>,
    pub content_type: String,
    pub file_size: Option<i64>,
    pub duration_s: Option<f64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
    pub hls_prefix: Option<String>,
    pub fail_reason: Option<String>,
    pub transcoding_job_id: Option<String>,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub playback_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClipResponse {
    pub fn new(clip: Clip, playback_url: Option<String>) -> Self {
        ClipResponse {
            id: clip.id,
            event_id: clip.event_id,
            name: clip.name,
            status: clip.status,
            approval_status: clip.approval_status,
            index: clip.index,
            uploader_id: clip.uploader_id,
            uploader_name: clip.uploader_name,
            content_type: clip.content_type,
            file_size: clip.file_size,
            duration_s: clip.duration_s,
            width: clip.width,
            height: clip.height,
            hls_prefix: clip.hls_prefix,
            fail_reason: clip.fail_reason,
            transcoding_job_id: clip.transcoding_job_id,
            tags: clip.tags,
            playback_url,
            created_at: clip.created_at,
            updated_at: clip.updated_at,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClipRequest {
    pub name: Option<String>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveClipsRequest {
    pub clip_ids: Vec<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApproveClipsResponse {
    pub approved: Vec<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReserveIndicesRequest {
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReserveIndicesResponse {
    /// First reserved index; the batch owns `start..start + count`.
    pub start: i64,
    pub count: i64,
}

/// Body for any dense re-ordering endpoint (clips, segments, playlist items).
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub ids: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_only_advances_along_the_pipeline() {
        use ClipStatus::*;
        assert!(Uploading.can_transition_to(Uploaded));
        assert!(Uploaded.can_transition_to(Processing));
        assert!(Processing.can_transition_to(Ready));
        assert!(Processing.can_transition_to(Failed));

        assert!(!Uploaded.can_transition_to(Ready));
        assert!(!Uploaded.can_transition_to(Failed));
        assert!(!Ready.can_transition_to(Processing));
        assert!(!Failed.can_transition_to(Ready));
        assert!(!Ready.can_transition_to(Uploaded));
    }

    #[test]
    fn status_text_round_trip() {
        for status in [
            ClipStatus::Uploading,
            ClipStatus::Uploaded,
            ClipStatus::Processing,
            ClipStatus::Ready,
            ClipStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<ClipStatus>().unwrap(), status);
        }
        assert!("done".parse::<ClipStatus>().is_err());
    }

    #[test]
    fn response_serializes_camel_case() {
        let now = Utc::now();
        let clip = Clip {
            id: 9,
            team_id: 1,
            event_id: 5,
            uploader_id: None,
            uploader_name: Some("Sam".to_string()),
            name: "Corner kick".to_string(),
            storage_key: "originals/1/5/a.mp4".to_string(),
            content_type: "video/mp4".to_string(),
            file_size: None,
            hls_prefix: Some("hls/1/5/9/".to_string()),
            duration_s: Some(42.0),
            width: None,
            height: None,
            status: ClipStatus::Ready,
            fail_reason: None,
            approval_status: ApprovalStatus::Pending,
            index: 1,
            transcoding_job_id: Some("job-1".to_string()),
            upload_link_id: Some(3),
            tags: vec![],
            created_at: now,
            updated_at: now,
        };
        assert_eq!(clip.master_playlist_key().as_deref(), Some("hls/1/5/9/master.m3u8"));

        let json = serde_json::to_value(ClipResponse::new(clip, None)).unwrap();
        assert_eq!(json["hlsPrefix"], "hls/1/5/9/");
        assert_eq!(json["approvalStatus"], "pending");
        assert_eq!(json["durationS"], 42.0);
        assert!(json.get("playbackUrl").is_none());
    }
}
