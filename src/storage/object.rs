//! S3-compatible object-store backend (MinIO) via OpenDAL.
//!
//! Object names are `<category-plural>/<uuid>_<filename>` so concurrent
//! uploads never collide; references are the fully qualified
//! `<endpoint>/<bucket>/<object>` URL. A client that failed to initialize
//! at startup (missing endpoint or credentials) short-circuits every store
//! attempt without retrying the connection.

use async_trait::async_trait;
use opendal::services::S3;
use opendal::{ErrorKind, Operator};
use uuid::Uuid;

use crate::blob::{BlobCategory, TemporaryBlob};
use crate::config::ObjectStoreConfig;
use crate::{Error, Result};

use super::{BlobStore, StoredEntry, StoredReference};

pub struct ObjectStore {
    inner: Option<Inner>,
}

struct Inner {
    /// Endpoint with scheme and no trailing slash, used to build references.
    public_endpoint: String,
    icons: Operator,
    icons_bucket: String,
    backgrounds: Operator,
    background_bucket: String,
}

impl ObjectStore {
    /// Build the backend from configuration. Missing or invalid settings
    /// leave the client uninitialized; all later operations then report
    /// `BackendUnavailable`.
    pub fn connect(config: Option<&ObjectStoreConfig>) -> Self {
        let Some(config) = config else {
            tracing::warn!("object storage selected but no connection settings configured");
            return Self { inner: None };
        };
        match Inner::build(config) {
            Ok(inner) => {
                tracing::info!(endpoint = %inner.public_endpoint, "object storage client ready");
                Self { inner: Some(inner) }
            }
            Err(e) => {
                tracing::error!("object storage client failed to initialize: {e}");
                Self { inner: None }
            }
        }
    }

    fn inner(&self) -> Result<&Inner> {
        self.inner.as_ref().ok_or(Error::BackendUnavailable)
    }
}

impl Inner {
    fn build(config: &ObjectStoreConfig) -> Result<Self> {
        let endpoint = require(config.endpoint.as_deref(), "endpoint")?;
        let access_key = require(config.access_key.as_deref(), "access_key")?;
        let secret_key = require(config.secret_key.as_deref(), "secret_key")?;
        let icons_bucket = require(config.icons_bucket.as_deref(), "icons_bucket")?;
        let background_bucket = require(config.background_bucket.as_deref(), "background_bucket")?;

        let public_endpoint = normalize_endpoint(endpoint, config.use_ssl);
        let icons = operator(&public_endpoint, access_key, secret_key, icons_bucket)?;
        let backgrounds = operator(&public_endpoint, access_key, secret_key, background_bucket)?;
        Ok(Self {
            public_endpoint,
            icons,
            icons_bucket: icons_bucket.to_string(),
            backgrounds,
            background_bucket: background_bucket.to_string(),
        })
    }

    fn operator_for(&self, category: BlobCategory) -> (&Operator, &str) {
        match category {
            BlobCategory::Icon => (&self.icons, &self.icons_bucket),
            BlobCategory::Background => (&self.backgrounds, &self.background_bucket),
        }
    }

    fn reference(&self, bucket: &str, object_name: &str) -> StoredReference {
        StoredReference::new(format!("{}/{bucket}/{object_name}", self.public_endpoint))
    }
}

fn require<'a>(field: Option<&'a str>, name: &str) -> Result<&'a str> {
    field
        .filter(|value| !value.is_empty())
        .ok_or_else(|| Error::Storage(format!("missing object storage setting: {name}")))
}

fn operator(endpoint: &str, access_key: &str, secret_key: &str, bucket: &str) -> Result<Operator> {
    let builder = S3::default()
        .endpoint(endpoint)
        .bucket(bucket)
        .access_key_id(access_key)
        .secret_access_key(secret_key)
        .region("us-east-1")
        .disable_config_load()
        .disable_ec2_metadata();
    let op = Operator::new(builder)
        .map_err(|e| Error::Storage(e.to_string()))?
        .finish();
    Ok(op)
}

/// Ensure the endpoint carries a scheme (derived from the TLS flag when
/// absent) and no trailing slash.
fn normalize_endpoint(endpoint: &str, use_ssl: bool) -> String {
    let endpoint = endpoint.trim_end_matches('/');
    if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        endpoint.to_string()
    } else if use_ssl {
        format!("https://{endpoint}")
    } else {
        format!("http://{endpoint}")
    }
}

#[async_trait]
impl BlobStore for ObjectStore {
    async fn store(&self, blob: &TemporaryBlob, category: BlobCategory) -> Result<StoredReference> {
        let inner = self.inner()?;
        let (op, bucket) = inner.operator_for(category);

        let object_name = format!("{}/{}_{}", category.plural(), Uuid::new_v4(), blob.file_name());
        let bytes = blob.read()?;
        op.write(&object_name, bytes)
            .await
            .map_err(|e| Error::Storage(format!("upload of {object_name} failed: {e}")))?;
        Ok(inner.reference(bucket, &object_name))
    }

    async fn list(&self, category: BlobCategory) -> Result<Vec<StoredEntry>> {
        let inner = self.inner()?;
        let (op, bucket) = inner.operator_for(category);

        let entries = match op.list_with("").recursive(true).await {
            Ok(entries) => entries,
            // Absent bucket reads as an empty collection.
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::Storage(e.to_string())),
        };

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.path().ends_with('/'))
            .map(|entry| StoredEntry {
                reference: inner.reference(bucket, entry.path()),
                name: entry.path().to_string(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_endpoint() {
        assert_eq!(
            normalize_endpoint("https://minio.lan:9000/", true),
            "https://minio.lan:9000"
        );
        assert_eq!(normalize_endpoint("minio.lan:9000", false), "http://minio.lan:9000");
        assert_eq!(normalize_endpoint("minio.lan:9000", true), "https://minio.lan:9000");
    }

    #[tokio::test]
    async fn test_unconfigured_client_short_circuits() {
        let store = ObjectStore::connect(None);
        let err = store.list(BlobCategory::Background).await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable));
    }

    #[tokio::test]
    async fn test_partial_settings_leave_client_unavailable() {
        let config: ObjectStoreConfig =
            serde_yaml::from_str("endpoint: minio.lan:9000\naccess_key: ak\n").unwrap();
        let store = ObjectStore::connect(Some(&config));
        let err = store.list(BlobCategory::Icon).await.unwrap_err();
        assert!(matches!(err, Error::BackendUnavailable));
    }
}
