#[cfg(feature = "storage-local")]
use crate::LocalStorage;
#[cfg(feature = "storage-s3")]
use crate::S3Storage;
use crate::{Storage, StorageBackend, StorageError, StorageResult};
use kolla_core::Config;
use std::sync::Arc;

/// A setting the selected backend cannot run without.
#[cfg(any(feature = "storage-s3", feature = "storage-local"))]
fn required(value: Option<&str>, var: &str) -> StorageResult<String> {
    value
        .map(str::to_string)
        .ok_or_else(|| StorageError::Misconfigured(format!("{} is not set", var)))
}

fn not_compiled_in(backend: StorageBackend) -> StorageError {
    StorageError::Misconfigured(format!(
        "the {} backend is not compiled into this build",
        backend
    ))
}

/// Build the backend named by `STORAGE_BACKEND`.
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    let backend = config.storage_backend();
    let storage: Arc<dyn Storage> = match backend {
        #[cfg(feature = "storage-s3")]
        StorageBackend::S3 => Arc::new(S3Storage::new(
            required(config.s3_bucket(), "S3_BUCKET")?,
            required(config.s3_region(), "S3_REGION")?,
            config.s3_endpoint().map(str::to_string),
        )?),
        #[cfg(feature = "storage-local")]
        StorageBackend::Local => Arc::new(
            LocalStorage::new(
                required(config.local_storage_path(), "LOCAL_STORAGE_PATH")?,
                required(config.local_storage_base_url(), "LOCAL_STORAGE_BASE_URL")?,
            )
            .await?,
        ),
        #[allow(unreachable_patterns)]
        other => return Err(not_compiled_in(other)),
    };
    Ok(storage)
}
