//! In-memory doubles for service and API tests.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use http::HeaderMap;
use kolla_core::{models::ApprovalStatus, models::NewClip, StorageBackend};
use kolla_db::{ClipRepository, EventRepository, TeamRepository};
use kolla_storage::{Storage, StorageError, StorageOp, StorageResult};
use kolla_transcoding::{
    JobStatus, LocalWebhookPayload, ProviderError, ProviderWebhook, SubmitJob, SubmittedJob,
    TranscodingProvider, WebhookBody,
};
use kolla_db::SqlitePool;

use crate::settings::ServiceSettings;

/// Object store kept in a map. Presigned URLs are `mock://{method}/{key}`.
#[derive(Default)]
pub struct MockStorage {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_presign: Mutex<bool>,
    fail_delete: Mutex<bool>,
}

impl MockStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Pretend the client finished its PUT.
    pub fn put(&self, key: &str, data: &[u8]) {
        if let Ok(mut objects) = self.objects.lock() {
            objects.insert(key.to_string(), data.to_vec());
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects
            .lock()
            .map(|objects| objects.contains_key(key))
            .unwrap_or(false)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects
            .lock()
            .map(|objects| objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn fail_presign(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_presign.lock() {
            *flag = fail;
        }
    }

    pub fn fail_delete(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_delete.lock() {
            *flag = fail;
        }
    }

    fn flag(flag: &Mutex<bool>) -> bool {
        flag.lock().map(|f| *f).unwrap_or(false)
    }
}

#[async_trait]
impl Storage for MockStorage {
    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        if Self::flag(&self.fail_presign) {
            return Err(StorageError::failed(StorageOp::Sign, key, "presign unavailable"));
        }
        Ok(format!("mock://put/{}", key))
    }

    async fn presign_get(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
        if Self::flag(&self.fail_presign) {
            return Err(StorageError::failed(StorageOp::Sign, key, "presign unavailable"));
        }
        Ok(format!("mock://get/{}", key))
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        self.put(key, &data);
        Ok(format!("mock://get/{}", key))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        if Self::flag(&self.fail_delete) {
            return Err(StorageError::failed(StorageOp::Delete, key, "delete unavailable"));
        }
        if let Ok(mut objects) = self.objects.lock() {
            objects.remove(key);
        }
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<u64> {
        if Self::flag(&self.fail_delete) {
            return Err(StorageError::failed(StorageOp::Delete, prefix, "delete unavailable"));
        }
        let mut objects = self
            .objects
            .lock()
            .map_err(|e| StorageError::failed(StorageOp::Delete, prefix, e))?;
        let before = objects.len();
        objects.retain(|key, _| !key.starts_with(prefix));
        Ok((before - objects.len()) as u64)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        Ok(self.contains(key))
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }
}

/// Header the mock provider signs with: the raw secret, verbatim.
pub const MOCK_SIGNATURE_HEADER: &str = "x-mock-signature";

/// Scripted provider. Records submissions and cancellations.
#[derive(Default)]
pub struct MockProvider {
    secret: Option<String>,
    fail_submit: Mutex<Option<String>>,
    submitted: Mutex<Vec<SubmitJob>>,
    cancelled: Mutex<Vec<String>>,
    counter: Mutex<u64>,
}

impl MockProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_secret(secret: &str) -> Arc<Self> {
        Arc::new(Self {
            secret: Some(secret.to_string()),
            ..Self::default()
        })
    }

    /// Make the next submissions fail with a 503 carrying `body`.
    pub fn fail_submit(&self, body: Option<&str>) {
        if let Ok(mut fail) = self.fail_submit.lock() {
            *fail = body.map(String::from);
        }
    }

    pub fn submitted(&self) -> Vec<SubmitJob> {
        self.submitted.lock().map(|s| s.clone()).unwrap_or_default()
    }

    pub fn cancelled(&self) -> Vec<String> {
        self.cancelled.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl TranscodingProvider for MockProvider {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn submit(&self, job: &SubmitJob) -> Result<SubmittedJob, ProviderError> {
        if let Some(body) = self.fail_submit.lock().ok().and_then(|f| f.clone()) {
            return Err(ProviderError::Api { status: 503, body });
        }
        let mut counter = self
            .counter
            .lock()
            .map_err(|e| ProviderError::Request(e.to_string()))?;
        *counter += 1;
        if let Ok(mut submitted) = self.submitted.lock() {
            submitted.push(job.clone());
        }
        Ok(SubmittedJob {
            job_id: format!("mock-job-{}", *counter),
            status: JobStatus::Queued,
        })
    }

    async fn cancel(&self, job_id: &str) -> Result<(), ProviderError> {
        if let Ok(mut cancelled) = self.cancelled.lock() {
            cancelled.push(job_id.to_string());
        }
        Ok(())
    }

    fn verify_signature(&self, headers: &HeaderMap, _raw_body: &[u8]) -> Result<(), ProviderError> {
        let Some(secret) = self.secret.as_deref() else {
            return Ok(());
        };
        match headers.get(MOCK_SIGNATURE_HEADER).and_then(|v| v.to_str().ok()) {
            Some(value) if value == secret => Ok(()),
            _ => Err(ProviderError::InvalidSignature),
        }
    }

    fn parse_webhook(&self, body: WebhookBody) -> Result<ProviderWebhook, ProviderError> {
        let payload = match body {
            WebhookBody::Json(value) => serde_json::from_value::<LocalWebhookPayload>(value)
                .map_err(|e| ProviderError::InvalidPayload(e.to_string()))?,
            WebhookBody::Text(text) => LocalWebhookPayload::from_text(&text)?,
        };
        Ok(ProviderWebhook::Local(payload))
    }
}

pub const TEST_CALLBACK_SECRET: &str = "test-callback-secret";

pub fn test_settings() -> ServiceSettings {
    ServiceSettings {
        allowed_video_content_types: vec![
            "video/mp4".to_string(),
            "video/quicktime".to_string(),
        ],
        max_video_size_bytes: 100 * 1024 * 1024,
        presign_ttl: Duration::from_secs(900),
        playback_url_ttl: Duration::from_secs(3600),
        upload_link_default_hours: 72,
        output_bucket: "kolla-test".to_string(),
        source_url_ttl: Duration::from_secs(21600),
        webhook_url: "http://localhost:4000/api/v0/webhooks/transcoding".to_string(),
        processing_callback_secret: TEST_CALLBACK_SECRET.to_string(),
    }
}

/// A team with one event, created directly through the repositories.
pub struct Fixture {
    pub pool: SqlitePool,
    pub team_id: i64,
    pub event_id: i64,
}

impl Fixture {
    pub async fn new() -> Result<Self, kolla_core::AppError> {
        Self::with_team(kolla_db::memory_pool().await?, "Kolla FC").await
    }

    /// A second team with its own event, in the same database.
    pub async fn other_team(&self) -> Result<Self, kolla_core::AppError> {
        Self::with_team(self.pool.clone(), "Rival FC").await
    }

    async fn with_team(pool: SqlitePool, name: &str) -> Result<Self, kolla_core::AppError> {
        let team = TeamRepository::new(pool.clone()).create(name).await?;
        let event = EventRepository::new(pool.clone())
            .create(
                team.id,
                "Cup final",
                kolla_core::models::EventKind::Game,
                None,
            )
            .await?;
        Ok(Fixture {
            pool,
            team_id: team.id,
            event_id: event.id,
        })
    }

    /// Insert an approved clip in `uploading` and return its id.
    pub async fn clip(&self, name: &str) -> Result<i64, kolla_core::AppError> {
        self.insert_clip(name, ApprovalStatus::Approved).await
    }

    /// Same as [`Fixture::clip`], but awaiting approval like a link upload.
    pub async fn pending_clip(&self, name: &str) -> Result<i64, kolla_core::AppError> {
        self.insert_clip(name, ApprovalStatus::Pending).await
    }

    async fn insert_clip(
        &self,
        name: &str,
        approval_status: ApprovalStatus,
    ) -> Result<i64, kolla_core::AppError> {
        let clips = ClipRepository::new(self.pool.clone());
        let index = clips
            .reserve_indices(self.team_id, self.event_id, 1)
            .await?
            .unwrap_or(1);
        let clip = clips
            .create(&NewClip {
                team_id: self.team_id,
                event_id: self.event_id,
                uploader_id: None,
                uploader_name: None,
                name: name.to_string(),
                storage_key: format!("originals/{}/{}/{}.mp4", self.team_id, self.event_id, name),
                content_type: "video/mp4".to_string(),
                file_size: None,
                approval_status,
                index,
                upload_link_id: None,
            })
            .await?;
        Ok(clip.id)
    }
}
