//! Startup configuration.
//!
//! Loaded once from a YAML file and never mutated afterwards; every
//! component receives it by reference (or `Arc`). A missing or unparsable
//! file falls back to safe defaults with a warning so the process always
//! comes up serving, matching the dashboard's "usable out of the box"
//! expectation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Which blob backend receives icon/background writes. Selected once at
/// startup; immutable for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageStrategy {
    #[default]
    Local,
    Minio,
    /// Anything unrecognized in the config file. Resolved to the local
    /// backend at selection time with a warning rather than aborting.
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct IconStorageConfig {
    #[serde(default)]
    pub strategy: StorageStrategy,
}

/// Connection settings for an S3-compatible object store (MinIO). Every
/// field is individually optional so a partially filled section still
/// parses; the client reports whatever is missing when it initializes,
/// leaving the backend unavailable rather than silently rerouting writes
/// to the local strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStoreConfig {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
    pub icons_bucket: Option<String>,
    pub background_bucket: Option<String>,
    #[serde(default = "default_use_ssl")]
    pub use_ssl: bool,
}

fn default_use_ssl() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub icon_storage: IconStorageConfig,
    pub minio: Option<ObjectStoreConfig>,
    pub docker_api_endpoint: Option<String>,
}

impl AppConfig {
    /// Load configuration from `path`. Any failure (missing file, bad YAML)
    /// yields defaults: local storage, no object store, no Docker endpoint.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str::<AppConfig>(&contents) {
                Ok(config) => {
                    tracing::info!(
                        strategy = ?config.icon_storage.strategy,
                        "loaded configuration from {}",
                        path.display()
                    );
                    config
                }
                Err(e) => {
                    tracing::warn!("could not parse {}: {e}; using defaults", path.display());
                    AppConfig::default()
                }
            },
            Err(e) => {
                tracing::warn!("could not read {}: {e}; using defaults", path.display());
                AppConfig::default()
            }
        }
    }
}

/// Filesystem layout: where the dashboard's YAML documents live and where
/// blobs are kept. Fixed paths in the container image, overridable for
/// tests and local runs.
#[derive(Debug, Clone)]
pub struct Paths {
    pub services: PathBuf,
    pub settings: PathBuf,
    pub bookmarks: PathBuf,
    pub scratch_dir: PathBuf,
    pub icon_dir: PathBuf,
    pub background_dir: PathBuf,
}

impl Default for Paths {
    fn default() -> Self {
        Self {
            services: PathBuf::from("/app/homepage/config/services.yaml"),
            settings: PathBuf::from("/app/homepage/config/settings.yaml"),
            bookmarks: PathBuf::from("/app/homepage/config/bookmarks.yaml"),
            scratch_dir: PathBuf::from("/tmp/homedash-uploads"),
            icon_dir: PathBuf::from("/app/data/icons"),
            background_dir: PathBuf::from("/app/data/backgrounds"),
        }
    }
}

impl Paths {
    /// Root everything under `base` (development / test layout).
    pub fn under(base: &Path) -> Self {
        Self {
            services: base.join("config/services.yaml"),
            settings: base.join("config/settings.yaml"),
            bookmarks: base.join("config/bookmarks.yaml"),
            scratch_dir: base.join("uploads"),
            icon_dir: base.join("icons"),
            background_dir: base.join("backgrounds"),
        }
    }

    pub fn ensure_dirs(&self) -> crate::Result<()> {
        std::fs::create_dir_all(&self.scratch_dir)?;
        std::fs::create_dir_all(&self.icon_dir)?;
        std::fs::create_dir_all(&self.background_dir)?;
        Ok(())
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("/app/data/config.yaml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_strategy_parses() {
        let config: AppConfig =
            serde_yaml::from_str("icon_storage:\n  strategy: webdav\n").unwrap();
        assert_eq!(config.icon_storage.strategy, StorageStrategy::Other);
    }

    #[test]
    fn test_minio_strategy() {
        let yaml = r#"
icon_storage:
  strategy: minio
minio:
  endpoint: https://minio.lan:9000
  access_key: ak
  secret_key: sk
  icons_bucket: icons
  background_bucket: backgrounds
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.icon_storage.strategy, StorageStrategy::Minio);
        let minio = config.minio.unwrap();
        assert!(minio.use_ssl); // default
        assert_eq!(minio.icons_bucket.as_deref(), Some("icons"));
    }

    #[test]
    fn test_partial_minio_section_keeps_strategy() {
        // A minio section missing some keys must not fail the whole parse
        // and reset the strategy to local.
        let yaml = r#"
icon_storage:
  strategy: minio
minio:
  endpoint: https://minio.lan:9000
  access_key: ak
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.icon_storage.strategy, StorageStrategy::Minio);
        let minio = config.minio.unwrap();
        assert_eq!(minio.endpoint.as_deref(), Some("https://minio.lan:9000"));
        assert!(minio.secret_key.is_none());
    }

    #[test]
    fn test_load_missing_file_defaults() {
        let config = AppConfig::load(Path::new("/nonexistent/config.yaml"));
        assert_eq!(config.icon_storage.strategy, StorageStrategy::Local);
        assert!(config.minio.is_none());
    }
}
