//! Temporary blob handling - scratch files awaiting a storage decision.
//!
//! Every downloaded or uploaded image lands here first. Filenames carry a
//! uuid so concurrent requests never collide in the shared scratch
//! directory, and the file is removed on `Drop` so cleanup happens on every
//! exit path of a resolution, including errors.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use crate::Result;

/// Logical category of a stored blob. Determines the destination directory
/// (local backend) or bucket and object-name prefix (object store).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobCategory {
    Icon,
    Background,
}

impl BlobCategory {
    /// Plural directory / prefix name: `icons` or `backgrounds`.
    pub fn plural(&self) -> &'static str {
        match self {
            BlobCategory::Icon => "icons",
            BlobCategory::Background => "backgrounds",
        }
    }

    /// Root-relative serving prefix for the local backend.
    pub fn route_prefix(&self) -> String {
        format!("/{}", self.plural())
    }
}

impl std::fmt::Display for BlobCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.plural())
    }
}

/// An ephemeral file holding downloaded or uploaded bytes before
/// persistence. Owned exclusively by the request flow that created it;
/// deleted when dropped.
#[derive(Debug)]
pub struct TemporaryBlob {
    path: PathBuf,
    file_name: String,
}

impl TemporaryBlob {
    /// Write `bytes` to a fresh scratch file named `<uuid><ext>`.
    /// `ext` includes the leading dot (".ico", ".png").
    pub fn from_bytes(scratch_dir: &Path, ext: &str, bytes: &[u8]) -> Result<Self> {
        let file_name = format!("{}{}", Uuid::new_v4(), ext);
        Self::write(scratch_dir, file_name, bytes)
    }

    /// Write an uploaded file to a scratch file named `<uuid>-<basename>`,
    /// keeping the original name visible in the stored result.
    pub fn from_upload(scratch_dir: &Path, original_name: &str, bytes: &[u8]) -> Result<Self> {
        let base = Path::new(original_name)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let file_name = format!("{}-{}", Uuid::new_v4(), base);
        Self::write(scratch_dir, file_name, bytes)
    }

    fn write(scratch_dir: &Path, file_name: String, bytes: &[u8]) -> Result<Self> {
        std::fs::create_dir_all(scratch_dir)?;
        let path = scratch_dir.join(&file_name);
        std::fs::write(&path, bytes)?;
        Ok(Self { path, file_name })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generated filename, unique across concurrent requests.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn read(&self) -> Result<Vec<u8>> {
        Ok(std::fs::read(&self.path)?)
    }
}

impl Drop for TemporaryBlob {
    fn drop(&mut self) {
        // Best effort; the scratch dir is wiped on restart anyway.
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blob_removed_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = {
            let blob = TemporaryBlob::from_bytes(dir.path(), ".png", b"abc").unwrap();
            assert!(blob.path().exists());
            blob.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_unique_names() {
        let dir = tempfile::tempdir().unwrap();
        let a = TemporaryBlob::from_bytes(dir.path(), ".ico", b"a").unwrap();
        let b = TemporaryBlob::from_bytes(dir.path(), ".ico", b"b").unwrap();
        assert_ne!(a.file_name(), b.file_name());
    }

    #[test]
    fn test_upload_keeps_basename() {
        let dir = tempfile::tempdir().unwrap();
        let blob = TemporaryBlob::from_upload(dir.path(), "/some/dir/bg.png", b"x").unwrap();
        assert!(blob.file_name().ends_with("-bg.png"));
        assert_eq!(blob.read().unwrap(), b"x");
    }

    #[test]
    fn test_category_prefixes() {
        assert_eq!(BlobCategory::Icon.route_prefix(), "/icons");
        assert_eq!(BlobCategory::Background.plural(), "backgrounds");
    }
}
