//! Local filesystem backend: one flat directory per category, references
//! are root-relative paths served by the router's static routes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::blob::{BlobCategory, TemporaryBlob};
use crate::{Error, Result};

use super::{BlobStore, StoredEntry, StoredReference};

pub struct LocalStore {
    icon_dir: PathBuf,
    background_dir: PathBuf,
}

impl LocalStore {
    pub fn new(icon_dir: PathBuf, background_dir: PathBuf) -> Self {
        Self { icon_dir, background_dir }
    }

    fn dir(&self, category: BlobCategory) -> &Path {
        match category {
            BlobCategory::Icon => &self.icon_dir,
            BlobCategory::Background => &self.background_dir,
        }
    }
}

#[async_trait]
impl BlobStore for LocalStore {
    async fn store(&self, blob: &TemporaryBlob, category: BlobCategory) -> Result<StoredReference> {
        let dir = self.dir(category);
        tokio::fs::create_dir_all(dir).await?;
        let destination = dir.join(blob.file_name());
        tokio::fs::copy(blob.path(), &destination)
            .await
            .map_err(|e| Error::Storage(format!("saving to {}: {e}", destination.display())))?;
        Ok(StoredReference::new(format!(
            "{}/{}",
            category.route_prefix(),
            blob.file_name()
        )))
    }

    async fn list(&self, category: BlobCategory) -> Result<Vec<StoredEntry>> {
        let dir = self.dir(category);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        let mut read_dir = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = read_dir.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            entries.push(StoredEntry {
                reference: StoredReference::new(format!("{}/{name}", category.route_prefix())),
                name,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &Path) -> LocalStore {
        LocalStore::new(dir.join("icons"), dir.join("backgrounds"))
    }

    #[tokio::test]
    async fn test_store_roundtrip_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let blob = TemporaryBlob::from_bytes(&dir.path().join("scratch"), ".png", b"PNG-BYTES")
            .unwrap();
        let reference = store.store(&blob, BlobCategory::Icon).await.unwrap();

        let file_name = reference.as_str().strip_prefix("/icons/").unwrap();
        let stored = std::fs::read(dir.path().join("icons").join(file_name)).unwrap();
        assert_eq!(stored, b"PNG-BYTES");
    }

    #[tokio::test]
    async fn test_stored_background_appears_in_list() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let blob =
            TemporaryBlob::from_upload(&dir.path().join("scratch"), "bg.png", b"bg").unwrap();
        let reference = store.store(&blob, BlobCategory::Background).await.unwrap();
        assert!(reference.as_str().starts_with("/backgrounds/"));
        assert!(reference.as_str().ends_with("-bg.png"));

        let listed = store.list(BlobCategory::Background).await.unwrap();
        assert!(listed.iter().any(|e| e.reference == reference));
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert!(store.list(BlobCategory::Icon).await.unwrap().is_empty());
    }
}
