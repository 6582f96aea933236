//! Segment, playlist and comment integration tests.
//!
//! Run with: `cargo test -p kolla-api --test playlists_test`

mod helpers;

use helpers::auth::{mint_user, register_coach};
use helpers::fixtures::{create_event, upload_clip};
use helpers::{api_path, setup_test_app};
use kolla_core::TeamRole;
use serde_json::{json, Value};

fn item_ids(playlist: &Value) -> Vec<i64> {
    playlist["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["id"].as_i64()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_playlist_items_keep_dense_positions() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;
    let first = upload_clip(&app, &coach, event_id, "first.mp4").await.id();
    let second = upload_clip(&app, &coach, event_id, "second.mp4").await.id();

    let segment = app
        .client()
        .post(&api_path(&format!("/clips/{}/segments", second)))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "name": "Counter", "startS": 2.0, "endS": 7.5, "tags": ["Transition"] }))
        .await;
    assert_eq!(segment.status_code(), 201);
    let segment: Value = segment.json();
    assert_eq!(segment["index"], 1);
    let segment_id = segment["id"].as_i64().expect("segment id");

    let playlist = app
        .client()
        .post(&api_path("/playlists"))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "name": "Film session" }))
        .await;
    assert_eq!(playlist.status_code(), 201);
    let playlist_id = playlist.json::<Value>()["id"].as_i64().expect("playlist id");

    for body in [
        json!({ "clipId": first }),
        json!({ "segmentId": segment_id }),
        json!({ "clipId": second }),
    ] {
        let added = app
            .client()
            .post(&api_path(&format!("/playlists/{}/items", playlist_id)))
            .add_header("Authorization", coach.bearer())
            .json(&body)
            .await;
        assert_eq!(added.status_code(), 201);
    }

    let both = app
        .client()
        .post(&api_path(&format!("/playlists/{}/items", playlist_id)))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "clipId": first, "segmentId": segment_id }))
        .await;
    assert_eq!(both.status_code(), 400);

    let current: Value = app
        .client()
        .get(&api_path(&format!("/playlists/{}", playlist_id)))
        .add_header("Authorization", coach.bearer())
        .await
        .json();
    assert_eq!(current["name"], "Film session");
    let ids = item_ids(&current);
    assert_eq!(ids.len(), 3);

    let reversed: Vec<i64> = ids.iter().rev().copied().collect();
    let reordered = app
        .client()
        .put(&api_path(&format!("/playlists/{}/items/order", playlist_id)))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "ids": reversed }))
        .await;
    assert_eq!(reordered.status_code(), 200);
    let reordered: Value = reordered.json();
    assert_eq!(item_ids(&reordered), reversed);
    assert_eq!(reordered["items"][0]["item"], json!({ "kind": "clip", "id": second }));

    // Deleting the segment drops its item and closes the gap.
    let deleted = app
        .client()
        .delete(&api_path(&format!("/segments/{}", segment_id)))
        .add_header("Authorization", coach.bearer())
        .await;
    assert_eq!(deleted.status_code(), 204);

    let after: Value = app
        .client()
        .get(&api_path(&format!("/playlists/{}", playlist_id)))
        .add_header("Authorization", coach.bearer())
        .await
        .json();
    let positions: Vec<i64> = after["items"]
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["position"].as_i64()).collect())
        .unwrap_or_default();
    assert_eq!(positions, vec![0, 1]);
}

#[tokio::test]
async fn test_reorder_requires_exact_permutation() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;
    let a = upload_clip(&app, &coach, event_id, "a.mp4").await.id();
    let b = upload_clip(&app, &coach, event_id, "b.mp4").await.id();

    let partial = app
        .client()
        .put(&api_path(&format!("/events/{}/clips/order", event_id)))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "ids": [b] }))
        .await;
    assert_eq!(partial.status_code(), 400);

    let swapped = app
        .client()
        .put(&api_path(&format!("/events/{}/clips/order", event_id)))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "ids": [b, a] }))
        .await;
    assert_eq!(swapped.status_code(), 204);

    let listed: Value = app
        .client()
        .get(&api_path(&format!("/events/{}/clips", event_id)))
        .add_header("Authorization", coach.bearer())
        .await
        .json();
    assert_eq!(listed[0]["id"], b);
    assert_eq!(listed[0]["index"], 1);
    assert_eq!(listed[1]["index"], 2);
}

#[tokio::test]
async fn test_players_cannot_reorder_playlists() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let player = mint_user(coach.team_id, TeamRole::Player);

    let playlist_id = app
        .client()
        .post(&api_path("/playlists"))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "name": "Set pieces" }))
        .await
        .json::<Value>()["id"]
        .as_i64()
        .expect("playlist id");

    let response = app
        .client()
        .put(&api_path(&format!("/playlists/{}/items/order", playlist_id)))
        .add_header("Authorization", player.bearer())
        .json(&json!({ "ids": [] }))
        .await;
    assert_eq!(response.status_code(), 403);
}

#[tokio::test]
async fn test_playlist_share_is_public() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;
    let clip_id = upload_clip(&app, &coach, event_id, "goal.mp4").await.id();

    let playlist_id = app
        .client()
        .post(&api_path("/playlists"))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "name": "Highlights" }))
        .await
        .json::<Value>()["id"]
        .as_i64()
        .expect("playlist id");
    app.client()
        .post(&api_path(&format!("/playlists/{}/items", playlist_id)))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "clipId": clip_id }))
        .await;

    let link: Value = app
        .client()
        .post(&api_path(&format!("/playlists/{}/share-links", playlist_id)))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "expiresInHours": 24 }))
        .await
        .json();
    let token = link["token"].as_str().expect("token");
    assert!(link["expiresAt"].is_string());

    let shared = app
        .client()
        .get(&api_path(&format!("/public/playlists/{}", token)))
        .await;
    assert_eq!(shared.status_code(), 200);
    let shared: Value = shared.json();
    assert_eq!(shared["kind"], "playlist");
    assert_eq!(shared["playlist"]["name"], "Highlights");
    assert_eq!(shared["items"][0]["clip"]["id"], clip_id);
}

#[tokio::test]
async fn test_comments_thread_under_their_parent() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let player = mint_user(coach.team_id, TeamRole::Player);
    let event_id = create_event(app.client(), &coach, "Cup final").await;
    let clip_id = upload_clip(&app, &coach, event_id, "press.mp4").await.id();

    let root = app
        .client()
        .post(&api_path(&format!("/clips/{}/comments", clip_id)))
        .add_header("Authorization", coach.bearer())
        .json(&json!({ "body": "Watch the back line here" }))
        .await;
    assert_eq!(root.status_code(), 201);
    let root_id = root.json::<Value>()["id"].as_i64().expect("comment id");

    let reply = app
        .client()
        .post(&api_path(&format!("/clips/{}/comments", clip_id)))
        .add_header("Authorization", player.bearer())
        .json(&json!({ "body": "I stepped too early", "parentId": root_id }))
        .await;
    assert_eq!(reply.status_code(), 201);

    let threads: Value = app
        .client()
        .get(&api_path(&format!("/clips/{}/comments", clip_id)))
        .add_header("Authorization", player.bearer())
        .await
        .json();
    assert_eq!(threads.as_array().map(Vec::len), Some(1));
    assert_eq!(threads[0]["replies"][0]["body"], "I stepped too early");
}
