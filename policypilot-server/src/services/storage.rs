//! Object storage boundary
//!
//! The core only ever talks to storage through this trait: byte upload and
//! signed-URL issuance. The shipped implementation keeps objects on the
//! local filesystem under the configured data directory; production
//! deployments point the same interface at a hosted object store.

use async_trait::async_trait;
use chrono::Utc;
use policypilot_common::{Error, Result};
use std::path::{Component, Path, PathBuf};

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store bytes at a storage path, overwriting any prior object
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()>;

    /// Issue one time-limited URL per path; None for paths with no object
    async fn create_signed_urls(
        &self,
        paths: &[String],
        ttl_seconds: u64,
    ) -> Result<Vec<Option<String>>>;
}

/// Filesystem-backed object storage rooted at one directory
pub struct LocalObjectStorage {
    root: PathBuf,
}

impl LocalObjectStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Resolve a storage path under the root, rejecting traversal
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(Error::Storage(format!("Invalid storage path: {}", path)));
        }

        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl ObjectStorage for LocalObjectStorage {
    async fn upload(&self, path: &str, bytes: &[u8], content_type: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::Storage(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        tokio::fs::write(&target, bytes)
            .await
            .map_err(|e| Error::Storage(format!("Failed to write {}: {}", target.display(), e)))?;

        tracing::debug!(
            path = path,
            bytes = bytes.len(),
            content_type = content_type,
            "Stored object"
        );

        Ok(())
    }

    async fn create_signed_urls(
        &self,
        paths: &[String],
        ttl_seconds: u64,
    ) -> Result<Vec<Option<String>>> {
        let expires = Utc::now().timestamp() + ttl_seconds as i64;

        let mut urls = Vec::with_capacity(paths.len());
        for path in paths {
            let target = self.resolve(path)?;
            if tokio::fs::try_exists(&target).await.unwrap_or(false) {
                urls.push(Some(format!("/media/{}?expires={}", path, expires)));
            } else {
                urls.push(None);
            }
        }

        Ok(urls)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn uploads_and_signs_existing_objects() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path().to_path_buf());

        storage
            .upload("org/abc/policy-1-file.pdf", b"content", "application/pdf")
            .await
            .unwrap();

        let urls = storage
            .create_signed_urls(
                &[
                    "org/abc/policy-1-file.pdf".to_string(),
                    "org/abc/missing.pdf".to_string(),
                ],
                3600,
            )
            .await
            .unwrap();

        assert!(urls[0].as_deref().unwrap().contains("org/abc/policy-1-file.pdf"));
        assert!(urls[1].is_none());
    }

    #[tokio::test]
    async fn rejects_traversal_paths() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalObjectStorage::new(dir.path().to_path_buf());

        let result = storage.upload("../outside.txt", b"x", "text/plain").await;
        assert!(result.is_err());
    }
}
