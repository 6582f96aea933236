use crate::keys;
use crate::traits::{Storage, StorageError, StorageOp, StorageResult};
use crate::StorageBackend;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Objects as files under a root directory, for development and tests.
///
/// "Presigned" URLs are `{base_url}/{key}` without a signature. Whatever
/// serves `base_url` must accept the PUT and serve the GET.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
    base_url: String,
}

impl LocalStorage {
    pub async fn new(root: impl Into<PathBuf>, base_url: String) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root).await.map_err(|e| {
            StorageError::Misconfigured(format!("cannot create {}: {}", root.display(), e))
        })?;

        Ok(LocalStorage {
            root,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn resolve(&self, key: &str) -> StorageResult<PathBuf> {
        if !keys::is_safe_key(key) {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.root.join(key.trim_end_matches('/')))
    }

    fn url_for(&self, key: &str) -> String {
        format!("{}/{}", self.base_url, key)
    }

    async fn is_present(path: &Path) -> bool {
        fs::try_exists(path).await.unwrap_or(false)
    }

    /// Regular files below `dir`, recursively.
    async fn file_count(dir: &Path) -> StorageResult<u64> {
        let mut files = 0;
        let mut stack = vec![dir.to_path_buf()];
        while let Some(next) = stack.pop() {
            let mut entries = fs::read_dir(&next).await?;
            while let Some(entry) = entries.next_entry().await? {
                if entry.file_type().await?.is_dir() {
                    stack.push(entry.path());
                } else {
                    files += 1;
                }
            }
        }
        Ok(files)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn presign_put(
        &self,
        key: &str,
        _content_type: &str,
        _expires_in: Duration,
    ) -> StorageResult<String> {
        self.resolve(key)?;
        Ok(self.url_for(key))
    }

    async fn presign_get(&self, key: &str, _expires_in: Duration) -> StorageResult<String> {
        self.resolve(key)?;
        Ok(self.url_for(key))
    }

    async fn put_object(
        &self,
        key: &str,
        data: Vec<u8>,
        _content_type: &str,
    ) -> StorageResult<String> {
        let path = self.resolve(key)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let write = async {
            let mut file = fs::File::create(&path).await?;
            file.write_all(&data).await?;
            file.sync_all().await
        };
        write
            .await
            .map_err(|e| StorageError::failed(StorageOp::Put, key, e))?;

        tracing::debug!(key = %key, size_bytes = data.len(), "Wrote local object");
        Ok(self.url_for(key))
    }

    async fn delete_object(&self, key: &str) -> StorageResult<()> {
        let path = self.resolve(key)?;
        if !Self::is_present(&path).await {
            return Ok(());
        }

        fs::remove_file(&path)
            .await
            .map_err(|e| StorageError::failed(StorageOp::Delete, key, e))?;
        tracing::debug!(key = %key, "Deleted local object");
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> StorageResult<u64> {
        let dir = self.resolve(prefix)?;
        if !Self::is_present(&dir).await {
            return Ok(0);
        }

        let removed = Self::file_count(&dir).await?;
        fs::remove_dir_all(&dir)
            .await
            .map_err(|e| StorageError::failed(StorageOp::Delete, prefix, e))?;
        tracing::debug!(prefix = %prefix, removed, "Deleted local prefix");
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> StorageResult<bool> {
        let path = self.resolve(key)?;
        Ok(Self::is_present(&path).await)
    }

    fn backend(&self) -> StorageBackend {
        StorageBackend::Local
    }
}
