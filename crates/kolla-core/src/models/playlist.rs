use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Playlist {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a playlist item points at. Never both.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum PlaylistItemRef {
    Clip(i64),
    Segment(i64),
}

impl PlaylistItemRef {
    pub fn clip_id(&self) -> Option<i64> {
        match self {
            PlaylistItemRef::Clip(id) => Some(*id),
            PlaylistItemRef::Segment(_) => None,
        }
    }

    pub fn segment_id(&self) -> Option<i64> {
        match self {
            PlaylistItemRef::Clip(_) => None,
            PlaylistItemRef::Segment(id) => Some(*id),
        }
    }

    /// Build from the two nullable columns or request fields.
    pub fn from_parts(clip_id: Option<i64>, segment_id: Option<i64>) -> Result<Self, AppError> {
        match (clip_id, segment_id) {
            (Some(clip), None) => Ok(PlaylistItemRef::Clip(clip)),
            (None, Some(segment)) => Ok(PlaylistItemRef::Segment(segment)),
            (Some(_), Some(_)) => Err(AppError::InvalidInput(
                "A playlist item references either a clip or a segment, not both".to_string(),
            )),
            (None, None) => Err(AppError::InvalidInput(
                "A playlist item must reference a clip or a segment".to_string(),
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistItem {
    pub id: i64,
    pub playlist_id: i64,
    pub item: PlaylistItemRef,
    pub position: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistWithItems {
    #[serde(flatten)]
    pub playlist: Playlist,
    pub items: Vec<PlaylistItem>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddPlaylistItemRequest {
    pub clip_id: Option<i64>,
    pub segment_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_ref_requires_exactly_one_target() {
        assert_eq!(
            PlaylistItemRef::from_parts(Some(3), None).unwrap(),
            PlaylistItemRef::Clip(3)
        );
        assert_eq!(
            PlaylistItemRef::from_parts(None, Some(8)).unwrap(),
            PlaylistItemRef::Segment(8)
        );
        assert!(PlaylistItemRef::from_parts(Some(3), Some(8)).is_err());
        assert!(PlaylistItemRef::from_parts(None, None).is_err());
    }

    #[test]
    fn item_ref_serializes_adjacently_tagged() {
        let json = serde_json::to_value(PlaylistItemRef::Segment(4)).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "segment", "id": 4}));
    }
}
