//! Blob storage layer - pluggable persistence for icons and backgrounds.
//!
//! Two interchangeable backends behind the [`BlobStore`] trait:
//! - [`LocalStore`]: flat per-category directories on the local filesystem,
//!   served by the router under `/icons` and `/backgrounds`.
//! - [`ObjectStore`]: S3-compatible object store (MinIO), addressed by
//!   bucket + object name.
//!
//! The backend is selected once at startup from [`StorageStrategy`] and
//! shared by all requests; there is no runtime switching.

pub mod local;
pub mod object;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::blob::{BlobCategory, TemporaryBlob};
use crate::config::{AppConfig, Paths, StorageStrategy};
use crate::Result;

pub use local::LocalStore;
pub use object::ObjectStore;

/// Opaque locator for a persisted blob: a root-relative path for the local
/// backend, a fully qualified URL for the object store. Produced only by a
/// backend, only after the bytes are durably written. Callers embed it in
/// config documents without interpreting its shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredReference(String);

impl StoredReference {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for StoredReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A listed blob: its reference plus a display name.
#[derive(Debug, Clone, Serialize)]
pub struct StoredEntry {
    #[serde(rename = "url")]
    pub reference: StoredReference,
    pub name: String,
}

/// Persistence backend for icon/background blobs. Implementations must be
/// safe to share across concurrent requests behind an `Arc`.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Durably persist the blob under `category` and return its reference.
    /// Single attempt; failures are reported, never retried.
    async fn store(&self, blob: &TemporaryBlob, category: BlobCategory) -> Result<StoredReference>;

    /// Enumerate stored blobs for `category`. An absent directory or bucket
    /// yields an empty sequence, not an error.
    async fn list(&self, category: BlobCategory) -> Result<Vec<StoredEntry>>;
}

/// Select the active backend from startup configuration. An unrecognized
/// strategy falls back to local so the process stays usable.
pub fn select_backend(config: &AppConfig, paths: &Paths) -> Arc<dyn BlobStore> {
    match config.icon_storage.strategy {
        StorageStrategy::Local => Arc::new(LocalStore::new(
            paths.icon_dir.clone(),
            paths.background_dir.clone(),
        )),
        StorageStrategy::Minio => Arc::new(ObjectStore::connect(config.minio.as_ref())),
        StorageStrategy::Other => {
            tracing::warn!("unrecognized storage strategy; falling back to local");
            Arc::new(LocalStore::new(
                paths.icon_dir.clone(),
                paths.background_dir.clone(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_strategy_falls_back_to_local() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::under(dir.path());
        let config: AppConfig =
            serde_yaml::from_str("icon_storage:\n  strategy: carrier-pigeon\n").unwrap();

        let store = select_backend(&config, &paths);
        let blob = TemporaryBlob::from_bytes(&paths.scratch_dir, ".png", b"pixels").unwrap();
        let reference = store.store(&blob, BlobCategory::Icon).await.unwrap();
        assert!(reference.as_str().starts_with("/icons/"));
    }

    #[tokio::test]
    async fn test_minio_strategy_without_credentials_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::under(dir.path());
        let config: AppConfig =
            serde_yaml::from_str("icon_storage:\n  strategy: minio\n").unwrap();

        let store = select_backend(&config, &paths);
        let blob = TemporaryBlob::from_bytes(&paths.scratch_dir, ".png", b"pixels").unwrap();
        let err = store.store(&blob, BlobCategory::Icon).await.unwrap_err();
        assert!(matches!(err, crate::Error::BackendUnavailable));
    }
}
