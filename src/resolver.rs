//! Icon/background resolution - the orchestration between uploads, favicon
//! discovery, and the active storage backend.
//!
//! Precedence for an item's icon, first match wins:
//! 1. an uploaded file,
//! 2. an existing reference (returned unchanged, no network, no writes),
//! 3. favicon discovery against the item's URL.
//!
//! A missing icon never blocks saving an item: discovery and storage
//! failures degrade to "no icon" while the enclosing operation succeeds.

use std::path::PathBuf;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::blob::{BlobCategory, TemporaryBlob};
use crate::discovery::IconDiscovery;
use crate::storage::{BlobStore, StoredEntry, StoredReference};
use crate::{Error, Result};

/// Markers the frontend sends for "no current icon".
fn is_sentinel(reference: &str) -> bool {
    let reference = reference.trim();
    reference.is_empty() || reference == "null" || reference == "undefined"
}

/// A dashboard entry ready to be embedded in the services document.
/// Constructed fresh per request; persistence is the config store's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemSpec {
    pub name: String,
    pub href: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<StoredReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub abbr: Option<String>,
}

pub struct IconResolver {
    store: Arc<dyn BlobStore>,
    discovery: IconDiscovery,
    scratch_dir: PathBuf,
}

impl IconResolver {
    pub fn new(store: Arc<dyn BlobStore>, discovery: IconDiscovery, scratch_dir: PathBuf) -> Self {
        Self { store, discovery, scratch_dir }
    }

    /// Determine the final reference for `category`, given at most one of an
    /// uploaded blob, an existing reference, or a URL to discover from.
    /// `None` means "no icon", never an error.
    pub async fn resolve(
        &self,
        category: BlobCategory,
        uploaded: Option<TemporaryBlob>,
        existing: Option<&str>,
        discover_url: Option<&str>,
    ) -> Option<StoredReference> {
        let blob = match uploaded {
            Some(blob) => Some(blob),
            None => {
                if let Some(existing) = existing.filter(|r| !is_sentinel(r)) {
                    // Idempotent no-op: keep what the caller already has.
                    return Some(StoredReference::new(existing));
                }
                match discover_url {
                    Some(url) => self.discovery.discover(url).await,
                    None => None,
                }
            }
        };

        // The blob is dropped (and its scratch file removed) when this
        // scope exits, whatever the store attempt did.
        let blob = blob?;
        match self.store.store(&blob, category).await {
            Ok(reference) => Some(reference),
            Err(e) => {
                tracing::warn!("storing {category} blob failed: {e}");
                None
            }
        }
    }

    /// Build an [`ItemSpec`] for the dashboard, resolving its icon along the
    /// way. Fails only on invalid input; icon problems degrade silently.
    pub async fn prepare_item(
        &self,
        name: &str,
        href: &str,
        description: Option<&str>,
        abbr: Option<&str>,
        icon_file: Option<(&str, &[u8])>,
        current_icon: Option<&str>,
    ) -> Result<ItemSpec> {
        let name = name.trim();
        let abbr = abbr.map(str::trim).filter(|a| !a.is_empty());
        if name.is_empty() && abbr.is_none() {
            return Err(Error::Validation("name or abbreviation is required".into()));
        }
        if href.trim().is_empty() {
            return Err(Error::Validation("href is required".into()));
        }

        let uploaded = self.blob_from_upload(icon_file);
        let icon = self
            .resolve(BlobCategory::Icon, uploaded, current_icon, Some(href))
            .await;

        Ok(ItemSpec {
            name: name.to_string(),
            href: href.to_string(),
            description: description.map(str::trim).filter(|d| !d.is_empty()).map(String::from),
            icon,
            abbr: abbr.map(String::from),
        })
    }

    /// Store an uploaded background. Unlike icon resolution this surfaces
    /// storage failures: the upload is the whole operation here.
    pub async fn upload_background(&self, file_name: &str, bytes: &[u8]) -> Result<StoredReference> {
        if file_name.is_empty() || bytes.is_empty() {
            return Err(Error::Validation("no file supplied".into()));
        }
        let blob = TemporaryBlob::from_upload(&self.scratch_dir, file_name, bytes)?;
        self.store.store(&blob, BlobCategory::Background).await
    }

    pub async fn list_backgrounds(&self) -> Result<Vec<StoredEntry>> {
        self.store.list(BlobCategory::Background).await
    }

    fn blob_from_upload(&self, icon_file: Option<(&str, &[u8])>) -> Option<TemporaryBlob> {
        let (file_name, bytes) = icon_file?;
        if file_name.is_empty() || bytes.is_empty() {
            return None;
        }
        match TemporaryBlob::from_upload(&self.scratch_dir, file_name, bytes) {
            Ok(blob) => Some(blob),
            Err(e) => {
                tracing::warn!("could not stage uploaded icon: {e}");
                None
            }
        }
    }
}
