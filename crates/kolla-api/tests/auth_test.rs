//! Authentication and service-surface integration tests.
//!
//! Run with: `cargo test -p kolla-api --test auth_test`

mod helpers;

use helpers::auth::{create_test_team, expired_token, mint_user, register_coach};
use helpers::fixtures::create_event;
use helpers::{api_path, setup_test_app};
use kolla_core::TeamRole;
use serde_json::{json, Value};

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = setup_test_app().await;

    let response = app.client().get(&api_path("/events")).await;
    assert_eq!(response.status_code(), 401);
    let body: Value = response.json();
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_malformed_and_expired_tokens_are_unauthorized() {
    let app = setup_test_app().await;
    let team_id = create_test_team(app.pool(), "Kolla FC").await;

    let malformed = app
        .client()
        .get(&api_path("/events"))
        .add_header("Authorization", "Token abc")
        .await;
    assert_eq!(malformed.status_code(), 401);

    let expired = app
        .client()
        .get(&api_path("/events"))
        .add_header("Authorization", format!("Bearer {}", expired_token(team_id)))
        .await;
    assert_eq!(expired.status_code(), 401);
}

#[tokio::test]
async fn test_teams_do_not_see_each_other() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;

    let other_team = create_test_team(app.pool(), "Rivals").await;
    let rival = mint_user(other_team, TeamRole::Coach);

    let response = app
        .client()
        .get(&api_path(&format!("/events/{}", event_id)))
        .add_header("Authorization", rival.bearer())
        .await;
    assert_eq!(response.status_code(), 404);

    let listed: Value = app
        .client()
        .get(&api_path("/events"))
        .add_header("Authorization", rival.bearer())
        .await
        .json();
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn test_players_read_but_do_not_create_events() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let player = mint_user(coach.team_id, TeamRole::Player);
    create_event(app.client(), &coach, "Cup final").await;

    let create = app
        .client()
        .post(&api_path("/events"))
        .add_header("Authorization", player.bearer())
        .json(&json!({ "name": "Pickup", "kind": "practice" }))
        .await;
    assert_eq!(create.status_code(), 403);

    let list = app
        .client()
        .get(&api_path("/events"))
        .add_header("Authorization", player.bearer())
        .await;
    assert_eq!(list.status_code(), 200);
}

#[tokio::test]
async fn test_invalid_body_is_reported_as_invalid_input() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;

    let response = app
        .client()
        .post(&api_path("/events"))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "name": "", "kind": "game" }))
        .await;
    assert_eq!(response.status_code(), 400);

    let unknown_kind = app
        .client()
        .post(&api_path("/events"))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "name": "Scrimmage", "kind": "friendly" }))
        .await;
    assert_eq!(unknown_kind.status_code(), 400);
}

#[tokio::test]
async fn test_health_and_docs_are_public() {
    let app = setup_test_app().await;

    let health = app.client().get("/health").await;
    assert_eq!(health.status_code(), 200);
    let health: Value = health.json();
    assert_eq!(health["database"], "ok");

    let spec = app.client().get("/api/openapi.json").await;
    assert_eq!(spec.status_code(), 200);
    let spec: Value = spec.json();
    assert!(spec["paths"]["/api/v0/uploads/presign"].is_object());
}

#[tokio::test]
async fn test_responses_carry_request_id_and_security_headers() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .get("/health")
        .add_header("x-request-id", "req-123")
        .await;
    assert_eq!(response.header("x-request-id"), "req-123");
    assert_eq!(response.header("x-content-type-options"), "nosniff");
}
