//! Test fixtures: video bytes and common request flows.

use axum_test::TestServer;
use serde_json::{json, Value};

use super::auth::TestUser;
use super::{api_path, TestApp};

/// An `ftyp` box: enough for anything that sniffs the container.
pub fn minimal_mp4() -> Vec<u8> {
    let mut data = Vec::new();
    data.extend_from_slice(&24u32.to_be_bytes());
    data.extend_from_slice(b"ftypisom");
    data.extend_from_slice(&0x200u32.to_be_bytes());
    data.extend_from_slice(b"isomiso2");
    data
}

pub async fn create_event(client: &TestServer, user: &TestUser, name: &str) -> i64 {
    let response = client
        .post(&api_path("/events"))
        .add_header("Authorization", user.bearer())
        .json(&json!({ "name": name, "kind": "game" }))
        .await;
    assert_eq!(response.status_code(), 201);
    let event: Value = response.json();
    event["id"].as_i64().expect("Expected 'id' in event response")
}

/// A confirmed clip and the key its original was written under.
pub struct UploadedClip {
    pub key: String,
    pub clip: Value,
}

impl UploadedClip {
    pub fn id(&self) -> i64 {
        self.clip["id"].as_i64().expect("Expected 'id' in clip response")
    }
}

/// Presign, write the object, confirm.
pub async fn upload_clip(
    app: &TestApp,
    user: &TestUser,
    event_id: i64,
    filename: &str,
) -> UploadedClip {
    let presign = app
        .client()
        .post(&api_path("/uploads/presign"))
        .add_header("Authorization", user.bearer())
        .json(&json!({
            "eventId": event_id,
            "filename": filename,
            "contentType": "video/mp4",
            "fileSize": 1024
        }))
        .await;
    assert_eq!(presign.status_code(), 201);
    let presign: Value = presign.json();

    let key = presign["key"].as_str().expect("Expected 'key'").to_string();
    app.put_object(&key).await;

    let clip_id = presign["clipId"].as_i64().expect("Expected 'clipId'");
    let confirm = app
        .client()
        .post(&api_path(&format!("/clips/{}/confirm", clip_id)))
        .add_header("Authorization", user.bearer())
        .await;
    assert_eq!(confirm.status_code(), 200);
    UploadedClip {
        key,
        clip: confirm.json(),
    }
}
