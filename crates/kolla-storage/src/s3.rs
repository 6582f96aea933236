use crate::keys;
use crate::traits::{Storage, StorageError, StorageOp, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use futures::TryStreamExt;
use http::Method;
use object_store::aws::{AmazonS3, AmazonS3Builder};
use object_store::path::Path;
use object_store::signer::Signer;
use object_store::Error as ObjectStoreError;
use object_store::{ObjectStore, ObjectStoreExt, PutPayload};
use std::time::{Duration, Instant};

/// S3 or an S3-compatible store (MinIO, R2) through `object_store`.
///
/// Credentials come from the usual `AWS_*` environment variables.
#[derive(Clone)]
pub struct S3Storage {
    store: AmazonS3,
    bucket: String,
    /// Base for object URLs, without a trailing slash.
    public_base: String,
}

impl S3Storage {
    /// `endpoint` switches to path-style URLs for S3-compatible providers,
    /// e.g. `http://localhost:9000` for MinIO.
    pub fn new(bucket: String, region: String, endpoint: Option<String>) -> StorageResult<Self> {
        let mut builder = AmazonS3Builder::from_env()
            .with_region(&region)
            .with_bucket_name(&bucket);

        let public_base = match endpoint {
            Some(endpoint) => {
                builder = builder
                    .with_allow_http(endpoint.starts_with("http://"))
                    .with_endpoint(&endpoint);
                format!("{}/{}", endpoint.trim_end_matches('/'), bucket)
            }
            None => format!("https://{}.s3.{}.amazonaws.com", bucket, region),
        };

        let store = builder
            .build()
            .map_err(|e| StorageError::Misconfigured(e.to_string()))?;

        Ok(S3Storage {
            store,
            bucket,
            public_base,
        })
    }

    fn path(key: &str) -> StorageResult<Path> {
        if keys::is_safe_key(key) {
            Ok(Path::from(key))
        } else {
            Err(StorageError::InvalidKey(key.to_string()))
        }
    }

    async fn sign(&self, method: Method, key: &str, expires_in: Duration) -> StorageResult<String> {
        let url = self
            .store
            .signed_url(method, &Self::path(key)?, expires_in)
            .await
            .map_err(|e| StorageError::failed(StorageOp::Sign, key, e))?;
        Ok(url.to_string())
    }
}

fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

#[async_trait]
impl Storage for S3Storage {
    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        expires_in: Duration,
    ) -> StorageResult<String> {
        self.sign(Method::PUT, key, expires_in).await
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> StorageResult<String> {
        self.sign(Method::GET, key, expires_in).await
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let location = Self::path(key)?;
        let size_bytes = data.len();
        let start = Instant::now();

        if let Err(e) = self
            .store
            .put(&location, PutPayload::from(Bytes::from(data)))
            .await
        {
            tracing::error!(
                error = %e,
                bucket = %self.bucket,
                key = %key,
                duration_ms = elapsed_ms(start),
                "S3 put failed"
            );
            return Err(StorageError::failed(StorageOp::Put, key, e));
        }

        tracing::info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes,
            duration_ms = elapsed_ms(start),
            "S3 put complete"
        );
        Ok(format!("{}/{}", self.public_base, key))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        match self.store.delete(&Self::path(key)?).await {
            Ok(()) | Err(ObjectStoreError::NotFound { .. }) => Ok(()),
            Err(e) => {
                tracing::error!(error = %e, bucket = %self.bucket, key = %key, "S3 delete failed");
                Err(StorageError::failed(StorageOp::Delete, key, e))
            }
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<u64> {
        let start = Instant::now();
        let listed: Vec<_> = self
            .store
            .list(Some(&Self::path(prefix)?))
            .try_collect()
            .await
            .map_err(|e| StorageError::failed(StorageOp::List, prefix, e))?;

        let mut removed = 0u64;
        for object in listed {
            match self.store.delete(&object.location).await {
                Ok(()) => removed += 1,
                Err(ObjectStoreError::NotFound { .. }) => {}
                Err(e) => {
                    return Err(StorageError::failed(
                        StorageOp::Delete,
                        object.location.as_ref(),
                        e,
                    ))
                }
            }
        }

        tracing::info!(
            bucket = %self.bucket,
            prefix = %prefix,
            removed,
            duration_ms = elapsed_ms(start),
            "S3 prefix deleted"
        );
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        match self.store.head(&Self::path(key)?).await {
            Ok(_) => Ok(true),
            Err(ObjectStoreError::NotFound { .. }) => Ok(false),
            Err(e) => Err(StorageError::failed(StorageOp::Head, key, e)),
        }
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::S3
    }
}
