use chrono::Duration;
use kolla_api::auth::JwtService;
use kolla_core::{Actor, TeamRole};
use kolla_db::{SqlitePool, TeamRepository};
use uuid::Uuid;

use super::TEST_JWT_SECRET;

/// A team member with a bearer token signed by the test secret.
pub struct TestUser {
    pub team_id: i64,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub token: String,
}

impl TestUser {
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }
}

/// Create a team row; returns its id.
pub async fn create_test_team(pool: &SqlitePool, name: &str) -> i64 {
    TeamRepository::new(pool.clone())
        .create(name)
        .await
        .expect("Failed to create test team")
        .id
}

pub fn mint_user(team_id: i64, role: TeamRole) -> TestUser {
    let actor = Actor {
        team_id,
        user_id: Uuid::new_v4(),
        role,
    };
    let token = JwtService::new(TEST_JWT_SECRET)
        .issue(&actor, Duration::hours(1))
        .expect("Failed to mint test token");
    TestUser {
        team_id,
        user_id: actor.user_id,
        role,
        token,
    }
}

/// New team with a coach.
pub async fn register_coach(pool: &SqlitePool) -> TestUser {
    let team_id = create_test_team(pool, "Kolla FC").await;
    mint_user(team_id, TeamRole::Coach)
}

pub fn expired_token(team_id: i64) -> String {
    let actor = Actor {
        team_id,
        user_id: Uuid::new_v4(),
        role: TeamRole::Coach,
    };
    JwtService::new(TEST_JWT_SECRET)
        .issue(&actor, Duration::hours(-1))
        .expect("Failed to mint test token")
}
