use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::AppError;

/// Role of a team member, carried on the bearer token.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TeamRole {
    Coach,
    Player,
}

impl Display for TeamRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            TeamRole::Coach => write!(f, "coach"),
            TeamRole::Player => write!(f, "player"),
        }
    }
}

impl FromStr for TeamRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "coach" => Ok(TeamRole::Coach),
            "player" => Ok(TeamRole::Player),
            other => Err(anyhow::anyhow!("Invalid team role: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// The authenticated caller of a team-scoped operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub team_id: i64,
    pub user_id: Uuid,
    pub role: TeamRole,
}

impl Actor {
    pub fn is_coach(&self) -> bool {
        self.role == TeamRole::Coach
    }

    /// Fails with `Forbidden` unless the actor is a coach.
    pub fn require_coach(&self, action: &str) -> Result<(), AppError> {
        match self.role {
            TeamRole::Coach => Ok(()),
            TeamRole::Player => Err(AppError::Forbidden(format!(
                "Only coaches can {}",
                action
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_cannot_act_as_coach() {
        let actor = Actor {
            team_id: 1,
            user_id: Uuid::new_v4(),
            role: TeamRole::Player,
        };
        let err = actor.require_coach("approve clips").unwrap_err();
        assert!(matches!(err, AppError::Forbidden(ref msg) if msg == "Only coaches can approve clips"));
    }

    #[test]
    fn role_round_trips_through_text() {
        assert_eq!("Coach".parse::<TeamRole>().unwrap(), TeamRole::Coach);
        assert_eq!(TeamRole::Player.to_string(), "player");
        assert!("admin".parse::<TeamRole>().is_err());
    }
}
