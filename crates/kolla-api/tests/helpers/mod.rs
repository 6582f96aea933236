//! Test helpers: build AppState and router for integration tests.
//!
//! Run from workspace root: `cargo test -p kolla-api`. Each app gets its own
//! in-memory database and a local object store in a temporary directory.

#![allow(dead_code)]

pub mod auth;
pub mod fixtures;

use std::sync::Arc;

use axum_test::TestServer;
use kolla_api::constants;
use kolla_api::setup::{routes, services};
use kolla_core::{
    BaseConfig, Config, IngestConfig, StorageBackend, TranscoderKind, TranscodingSettings,
};
use kolla_db::SqlitePool;
use kolla_services::testing::{MockProvider, TEST_CALLBACK_SECRET};
use kolla_storage::{LocalStorage, Storage};
use tempfile::TempDir;

/// Secret the mock transcoder expects in `x-mock-signature`.
pub const TEST_WEBHOOK_SECRET: &str = "test-webhook-secret";

pub const TEST_JWT_SECRET: &str = "test-secret-key-min-32-characters-long-for-testing";

/// API path prefix for tests (e.g. `/api/v0`).
pub fn api_path(path: &str) -> String {
    format!("{}{}", constants::API_PREFIX, path)
}

/// Test application: server, pool, and owned resources.
pub struct TestApp {
    pub server: TestServer,
    pub pool: SqlitePool,
    pub storage: Arc<dyn Storage>,
    pub provider: Arc<MockProvider>,
    pub _temp_dir: TempDir,
}

impl TestApp {
    pub fn client(&self) -> &TestServer {
        &self.server
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stand in for the client's PUT to the presigned URL.
    pub async fn put_object(&self, key: &str) {
        self.storage
            .put_object(key, fixtures::minimal_mp4(), "video/mp4")
            .await
            .expect("Failed to write test object");
    }
}

/// Setup test app with isolated DB and local storage.
pub async fn setup_test_app() -> TestApp {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let storage_path = temp_dir.path().join("objects");
    let config = create_test_config(&storage_path.to_string_lossy());

    let pool = kolla_db::memory_pool()
        .await
        .expect("Failed to create test database");
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(&storage_path, "http://localhost:4000/media".to_string())
            .await
            .expect("Failed to create local storage"),
    );
    let provider = MockProvider::with_secret(TEST_WEBHOOK_SECRET);

    let state =
        services::initialize_services(&config, pool.clone(), storage.clone(), provider.clone());
    let app = routes::setup_routes(&config, state);
    let server = TestServer::new(app.into_make_service()).expect("Failed to create test server");

    TestApp {
        server,
        pool,
        storage,
        provider,
        _temp_dir: temp_dir,
    }
}

fn create_test_config(storage_path: &str) -> Config {
    let base = BaseConfig {
        server_port: 4000,
        cors_origins: vec!["*".to_string()],
        db_max_connections: 1,
        db_timeout_seconds: 5,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        environment: "test".to_string(),
        log_format: "compact".to_string(),
    };

    Config(Box::new(IngestConfig {
        base,
        database_url: "sqlite::memory:".to_string(),
        public_base_url: "http://localhost:4000".to_string(),
        storage_backend: StorageBackend::Local,
        s3_bucket: None,
        s3_region: None,
        s3_endpoint: None,
        local_storage_path: Some(storage_path.to_string()),
        local_storage_base_url: Some("http://localhost:4000/media".to_string()),
        presign_ttl_secs: 900,
        playback_url_ttl_secs: 3600,
        allowed_video_content_types: vec!["video/mp4".to_string(), "video/quicktime".to_string()],
        max_video_size_bytes: 100 * 1024 * 1024,
        upload_link_default_hours: 72,
        transcoding: TranscodingSettings {
            provider: TranscoderKind::Local,
            api_url: None,
            api_key: None,
            webhook_secret: Some(TEST_WEBHOOK_SECRET.to_string()),
            output_bucket: "kolla-test".to_string(),
            source_url_ttl_secs: 3600,
            request_timeout_secs: 5,
        },
        processing_callback_secret: TEST_CALLBACK_SECRET.to_string(),
    }))
}
