use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Game,
    Practice,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Game => "game",
            EventKind::Practice => "practice",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "game" => Ok(EventKind::Game),
            "practice" => Ok(EventKind::Practice),
            other => Err(anyhow::anyhow!("Invalid event kind: {}", other)),
        }
    }
}

/// A game or practice session owned by a team.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: i64,
    pub team_id: i64,
    pub name: String,
    pub kind: EventKind,
    pub occurs_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub kind: EventKind,
    pub occurs_at: Option<DateTime<Utc>>,
}
