use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named sub-range `[start_s, end_s)` of a clip.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Segment {
    pub id: i64,
    pub team_id: i64,
    pub clip_id: i64,
    pub name: String,
    pub start_s: f64,
    pub end_s: f64,
    pub index: i64,
    pub tags: Vec<String>,
    pub player_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSegmentRequest {
    pub name: String,
    pub start_s: f64,
    pub end_s: f64,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub player_ids: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSegmentRequest {
    pub name: Option<String>,
    pub start_s: Option<f64>,
    pub end_s: Option<f64>,
    pub tags: Option<Vec<String>>,
    pub player_ids: Option<Vec<String>>,
}
