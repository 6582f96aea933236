//! Tokenized capabilities: upload links (write) and share links (read).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Time-boxed, unauthenticated upload rights for one event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadLink {
    pub id: i64,
    pub team_id: i64,
    pub event_id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl UploadLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum ShareTarget {
    Event(i64),
    Playlist(i64),
}

/// Read-only public access to an event's clips or a playlist's items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ShareLink {
    pub id: i64,
    pub team_id: i64,
    pub target: ShareTarget,
    pub token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl ShareLink {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateLinkRequest {
    pub expires_in_hours: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn share_link_without_expiry_never_expires() {
        let now = Utc::now();
        let link = ShareLink {
            id: 1,
            team_id: 1,
            target: ShareTarget::Event(2),
            token: "t".to_string(),
            expires_at: None,
            created_by: Uuid::nil(),
            created_at: now,
        };
        assert!(!link.is_expired(now + Duration::days(3650)));
    }

    #[test]
    fn upload_link_expires_at_its_timestamp() {
        let now = Utc::now();
        let link = UploadLink {
            id: 1,
            team_id: 1,
            event_id: 2,
            token: "t".to_string(),
            expires_at: now,
            created_by: Uuid::nil(),
            created_at: now - Duration::hours(1),
        };
        assert!(link.is_expired(now));
        assert!(!link.is_expired(now - Duration::seconds(1)));
    }
}
