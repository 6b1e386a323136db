//! # Homedash - Dashboard configuration backend
//!
//! HTTP backend for editing a Homepage-style dashboard's YAML configuration.
//!
//! Homedash provides:
//! - YAML CRUD for services, bookmarks, and settings documents
//! - Favicon discovery (direct `/favicon.ico` probe, then HTML `<link>` scan)
//! - Pluggable blob storage for icons and backgrounds (local filesystem or
//!   S3-compatible object store, selected once at startup)
//! - Docker Engine container listing with suggested service URLs

pub mod blob;
pub mod config;
pub mod configstore;
pub mod discovery;
pub mod docker;
pub mod resolver;
pub mod server;
pub mod storage;

// Re-exports for convenient access
pub use blob::{BlobCategory, TemporaryBlob};
pub use config::{AppConfig, StorageStrategy};
pub use resolver::{IconResolver, ItemSpec};
pub use storage::{BlobStore, StoredReference};

/// Result type alias for Homedash operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Homedash operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad caller input; maps to a 4xx response.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Config document read/write failure; surfaced verbatim to the caller.
    #[error("Config store error: {0}")]
    ConfigStore(String),

    /// Blob backend write/upload/list failure.
    #[error("Storage error: {0}")]
    Storage(String),

    /// The object-store client never initialized; every store attempt
    /// short-circuits here without retrying the connection.
    #[error("Object storage backend is not available")]
    BackendUnavailable,

    /// Upstream HTTP failure (Docker Engine API).
    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
