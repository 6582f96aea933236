//! Upload pipeline integration tests: presign, confirm, process, completion.
//!
//! Run with: `cargo test -p kolla-api --test uploads_test`

mod helpers;

use helpers::auth::register_coach;
use helpers::fixtures::{create_event, upload_clip};
use helpers::{api_path, setup_test_app, TEST_WEBHOOK_SECRET};
use kolla_services::testing::{MOCK_SIGNATURE_HEADER, TEST_CALLBACK_SECRET};
use serde_json::{json, Value};

#[tokio::test]
async fn test_presign_rejects_disallowed_content_type() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;

    let response = app
        .client()
        .post(&api_path("/uploads/presign"))
        .add_header("Authorization", coach.bearer())
        .json(&json!({
            "eventId": event_id,
            "filename": "notes.pdf",
            "contentType": "application/pdf"
        }))
        .await;

    assert_eq!(response.status_code(), 400);
    let body: Value = response.json();
    assert_eq!(body["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_confirm_before_upload_is_not_found() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;

    let presign = app
        .client()
        .post(&api_path("/uploads/presign"))
        .add_header("Authorization", coach.bearer())
        .json(&json!({
            "eventId": event_id,
            "filename": "kickoff.mp4",
            "contentType": "video/mp4"
        }))
        .await;
    assert_eq!(presign.status_code(), 201);
    let presign: Value = presign.json();
    assert_eq!(presign["index"], 1);

    let confirm = app
        .client()
        .post(&api_path(&format!("/clips/{}/confirm", presign["clipId"])))
        .add_header("Authorization", coach.bearer())
        .await;
    assert_eq!(confirm.status_code(), 404);
}

#[tokio::test]
async fn test_clip_becomes_ready_through_provider_webhook() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;

    let uploaded = upload_clip(&app, &coach, event_id, "goal.mp4").await;
    assert_eq!(uploaded.clip["status"], "uploaded");
    assert_eq!(uploaded.clip["approvalStatus"], "approved");
    let clip_id = uploaded.id();

    let process = app
        .client()
        .post(&api_path(&format!("/clips/{}/process", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await;
    assert_eq!(process.status_code(), 202);
    let processing: Value = process.json();
    assert_eq!(processing["status"], "processing");
    assert_eq!(processing["transcodingJobId"], "mock-job-1");
    assert_eq!(app.provider.submitted().len(), 1);

    // A second submission is refused while the job runs.
    let again = app
        .client()
        .post(&api_path(&format!("/clips/{}/process", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await;
    assert_eq!(again.status_code(), 409);

    let webhook = app
        .client()
        .post(&api_path("/webhooks/transcoding"))
        .add_header(MOCK_SIGNATURE_HEADER, TEST_WEBHOOK_SECRET)
        .json(&json!({ "jobId": "mock-job-1", "status": "completed" }))
        .await;
    assert_eq!(webhook.status_code(), 200);

    let ready: Value = app
        .client()
        .get(&api_path(&format!("/clips/{}", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await
        .json();
    assert_eq!(ready["status"], "ready");
    let prefix = format!("hls/{}/{}/{}/", coach.team_id, event_id, clip_id);
    assert_eq!(ready["hlsPrefix"], prefix.as_str());
    assert!(ready["playbackUrl"]
        .as_str()
        .is_some_and(|url| url.ends_with(&format!("{}master.m3u8", prefix))));
}

#[tokio::test]
async fn test_webhook_with_bad_signature_is_unauthorized() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/webhooks/transcoding"))
        .add_header(MOCK_SIGNATURE_HEADER, "wrong")
        .json(&json!({ "jobId": "mock-job-1", "status": "completed" }))
        .await;
    assert_eq!(response.status_code(), 401);

    let ping = app.client().get(&api_path("/webhooks/transcoding")).await;
    assert_eq!(ping.status_code(), 200);
}

#[tokio::test]
async fn test_webhook_for_unknown_job_is_acknowledged() {
    let app = setup_test_app().await;

    let response = app
        .client()
        .post(&api_path("/webhooks/transcoding"))
        .add_header(MOCK_SIGNATURE_HEADER, TEST_WEBHOOK_SECRET)
        .text("job_id=nobody&status=finished")
        .await;
    assert_eq!(response.status_code(), 200);
}

#[tokio::test]
async fn test_processing_callback_requires_job_secret() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Practice").await;
    let clip_id = upload_clip(&app, &coach, event_id, "drill.mp4").await.id();

    app.client()
        .post(&api_path(&format!("/clips/{}/process", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await;

    let body = json!({
        "clipId": clip_id,
        "durationS": 12.5,
        "width": 1920,
        "height": 1080,
        "hlsPrefix": format!("hls/{}/{}/{}", coach.team_id, event_id, clip_id)
    });

    let rejected = app
        .client()
        .post(&api_path("/internal/processing-callback"))
        .add_header("x-job-secret", "guess")
        .json(&body)
        .await;
    assert_eq!(rejected.status_code(), 401);

    let accepted = app
        .client()
        .post(&api_path("/internal/processing-callback"))
        .add_header("x-job-secret", TEST_CALLBACK_SECRET)
        .json(&body)
        .await;
    assert_eq!(accepted.status_code(), 200);
    let ack: Value = accepted.json();
    assert_eq!(ack["ok"], true);

    let ready: Value = app
        .client()
        .get(&api_path(&format!("/clips/{}", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await
        .json();
    assert_eq!(ready["status"], "ready");
    assert_eq!(ready["durationS"], 12.5);
    assert_eq!(ready["width"], 1920);
}

#[tokio::test]
async fn test_processing_callback_checks_secret_before_body() {
    let app = setup_test_app().await;

    let anonymous = app
        .client()
        .post(&api_path("/internal/processing-callback"))
        .text("{not json")
        .await;
    assert_eq!(anonymous.status_code(), 401);
    let body: Value = anonymous.json();
    assert_eq!(body["code"], "UNAUTHORIZED");

    let malformed = app
        .client()
        .post(&api_path("/internal/processing-callback"))
        .add_header("x-job-secret", TEST_CALLBACK_SECRET)
        .text("{not json")
        .await;
    assert_eq!(malformed.status_code(), 400);
}

#[tokio::test]
async fn test_provider_failure_marks_clip_failed() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;
    let clip_id = upload_clip(&app, &coach, event_id, "save.mp4").await.id();

    app.provider.fail_submit(Some("queue full"));
    let process = app
        .client()
        .post(&api_path(&format!("/clips/{}/process", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await;
    assert_eq!(process.status_code(), 502);

    let failed: Value = app
        .client()
        .get(&api_path(&format!("/clips/{}", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await
        .json();
    assert_eq!(failed["status"], "failed");
    assert!(failed["failReason"].as_str().is_some());
}

#[tokio::test]
async fn test_deleting_clip_removes_original() {
    let app = setup_test_app().await;
    let coach = register_coach(app.pool()).await;
    let event_id = create_event(app.client(), &coach, "Cup final").await;
    let uploaded = upload_clip(&app, &coach, event_id, "miss.mp4").await;
    let clip_id = uploaded.id();
    assert!(uploaded
        .key
        .starts_with(&format!("originals/{}/{}/", coach.team_id, event_id)));
    assert!(app.storage.exists(&uploaded.key).await.unwrap());

    let delete = app
        .client()
        .delete(&api_path(&format!("/clips/{}", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await;
    assert_eq!(delete.status_code(), 204);

    let gone = app
        .client()
        .get(&api_path(&format!("/clips/{}", clip_id)))
        .add_header("Authorization", coach.bearer())
        .await;
    assert_eq!(gone.status_code(), 404);
    assert!(!app.storage.exists(&uploaded.key).await.unwrap());
}
