//! The object store seam.

use crate::StorageBackend;
use async_trait::async_trait;
use kolla_core::AppError;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Object store operation, carried in errors and log fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageOp {
    Sign,
    Put,
    Delete,
    List,
    Head,
}

impl fmt::Display for StorageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StorageOp::Sign => "sign",
            StorageOp::Put => "put",
            StorageOp::Delete => "delete",
            StorageOp::List => "list",
            StorageOp::Head => "head",
        })
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    /// Empty, absolute, or traversing keys.
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),

    #[error("storage misconfigured: {0}")]
    Misconfigured(String),

    #[error("{op} failed for `{key}`: {reason}")]
    Failed {
        op: StorageOp,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StorageError {
    pub fn failed(op: StorageOp, key: &str, reason: impl fmt::Display) -> Self {
        StorageError::Failed {
            op,
            key: key.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::InvalidKey(_) => AppError::InvalidInput(err.to_string()),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Object store used for clip originals and HLS renditions.
///
/// Video bytes never pass through the service: clients PUT to a presigned
/// URL and players GET from one. Services hold an `Arc<dyn Storage>`.
#[async_trait]
pub trait Storage: Send + Sync {
    /// URL a client can `PUT` the object body to until `expires_in` elapses.
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String>;

    /// URL for reading an object, used for playback and as transcoder input.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String>;

    /// Write `data` under `key` directly. Returns the object URL.
    async fn put_object(&self, key: &str, data: Vec<u8>, content_type: &str)
        -> StorageResult<String>;

    /// Missing objects are not an error.
    async fn delete_object(&self, key: &str) -> StorageResult<()>;

    /// Delete everything under `prefix`, returning the number of objects removed.
    async fn delete_prefix(&self, prefix: &str) -> StorageResult<u64>;

    async fn exists(&self, key: &str) -> StorageResult<bool>;

    fn backend(&self) -> StorageBackend;
}
