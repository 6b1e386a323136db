//! Config store - structured read/write of the dashboard's YAML documents.
//!
//! The three documents (services, bookmarks, settings) are treated as
//! opaque structured data: the HTTP layer ships them as JSON, this module
//! translates to and from YAML on disk. A missing file reads as the
//! document's empty shape; I/O and parse failures surface to the caller.

use std::collections::BTreeSet;
use std::path::PathBuf;

use serde_json::{json, Value};

use crate::config::Paths;
use crate::{Error, Result};

/// The named YAML documents the dashboard consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Services,
    Settings,
    Bookmarks,
}

impl Document {
    fn file_name(&self) -> &'static str {
        match self {
            Document::Services => "services.yaml",
            Document::Settings => "settings.yaml",
            Document::Bookmarks => "bookmarks.yaml",
        }
    }

    /// What an absent document reads as: services and bookmarks are
    /// sequences of groups, settings is a mapping.
    fn empty_value(&self) -> Value {
        match self {
            Document::Services | Document::Bookmarks => json!([]),
            Document::Settings => json!({}),
        }
    }
}

/// Group names and layout extracted across documents, for the editor's
/// group picker.
#[derive(Debug, serde::Serialize)]
pub struct Overview {
    pub groups: Vec<String>,
    pub layout: Value,
}

pub struct ConfigStore {
    services: PathBuf,
    settings: PathBuf,
    bookmarks: PathBuf,
}

impl ConfigStore {
    pub fn new(paths: &Paths) -> Self {
        Self {
            services: paths.services.clone(),
            settings: paths.settings.clone(),
            bookmarks: paths.bookmarks.clone(),
        }
    }

    fn path(&self, document: Document) -> &PathBuf {
        match document {
            Document::Services => &self.services,
            Document::Settings => &self.settings,
            Document::Bookmarks => &self.bookmarks,
        }
    }

    /// Read a document. Missing file yields the document's empty shape.
    pub fn read(&self, document: Document) -> Result<Value> {
        let path = self.path(document);
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(document.empty_value());
            }
            Err(e) => {
                return Err(Error::ConfigStore(format!(
                    "reading {} failed: {e}",
                    document.file_name()
                )));
            }
        };
        let value: Value = serde_yaml::from_str(&contents).map_err(|e| {
            Error::ConfigStore(format!("parsing {} failed: {e}", document.file_name()))
        })?;
        // An empty YAML file parses as null.
        if value.is_null() {
            return Ok(document.empty_value());
        }
        Ok(value)
    }

    /// Overwrite a document with `data`, creating parent directories as
    /// needed.
    pub fn write(&self, document: Document, data: &Value) -> Result<()> {
        let path = self.path(document);
        let yaml = serde_yaml::to_string(data).map_err(|e| {
            Error::ConfigStore(format!("serializing {} failed: {e}", document.file_name()))
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, yaml).map_err(|e| {
            Error::ConfigStore(format!("writing {} failed: {e}", document.file_name()))
        })
    }

    /// Merge a new `background` section into the settings document, leaving
    /// every other key untouched.
    pub fn set_background(&self, background: Value) -> Result<()> {
        let mut settings = self.read(Document::Settings)?;
        if !settings.is_object() {
            settings = json!({});
        }
        settings["background"] = background;
        self.write(Document::Settings, &settings)
    }

    /// Collect group names from services and bookmarks plus the layout from
    /// settings. Each source is best-effort: an unreadable document simply
    /// contributes nothing.
    pub fn overview(&self) -> Overview {
        let mut groups = BTreeSet::new();
        for document in [Document::Services, Document::Bookmarks] {
            let Ok(Value::Array(entries)) = self.read(document) else {
                continue;
            };
            for entry in entries {
                if let Value::Object(map) = entry {
                    if let Some(name) = map.keys().next() {
                        groups.insert(name.clone());
                    }
                }
            }
        }
        let layout = self
            .read(Document::Settings)
            .ok()
            .and_then(|s| s.get("layout").cloned())
            .unwrap_or_else(|| json!({}));
        Overview { groups: groups.into_iter().collect(), layout }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &std::path::Path) -> ConfigStore {
        ConfigStore::new(&Paths::under(dir))
    }

    #[test]
    fn test_missing_documents_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());
        assert_eq!(store.read(Document::Services).unwrap(), json!([]));
        assert_eq!(store.read(Document::Settings).unwrap(), json!({}));
    }

    #[test]
    fn test_write_read_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        let services = json!([
            {"Media": [{"name": "Jellyfin", "href": "https://media.lan"}]},
            {"Infra": [{"name": "Proxmox", "href": "https://pve.lan:8006"}]}
        ]);
        store.write(Document::Services, &services).unwrap();
        assert_eq!(store.read(Document::Services).unwrap(), services);
    }

    #[test]
    fn test_set_background_preserves_other_settings() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        store
            .write(Document::Settings, &json!({"title": "Home", "layout": {"Media": {}}}))
            .unwrap();
        store.set_background(json!({"image": "/backgrounds/x.png"})).unwrap();

        let settings = store.read(Document::Settings).unwrap();
        assert_eq!(settings["title"], "Home");
        assert_eq!(settings["background"]["image"], "/backgrounds/x.png");
    }

    #[test]
    fn test_overview_merges_groups_from_both_documents() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(dir.path());

        store
            .write(Document::Services, &json!([{"Media": []}, {"Infra": []}]))
            .unwrap();
        store
            .write(Document::Bookmarks, &json!([{"Reading": []}, {"Media": []}]))
            .unwrap();
        store
            .write(Document::Settings, &json!({"layout": {"Media": {"style": "row"}}}))
            .unwrap();

        let overview = store.overview();
        assert_eq!(overview.groups, vec!["Infra", "Media", "Reading"]);
        assert_eq!(overview.layout["Media"]["style"], "row");
    }
}
