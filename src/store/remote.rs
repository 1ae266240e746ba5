//! Remote object store (S3-compatible or in-memory)
//!
//! Key layout under the configured prefix:
//! - `<prefix>/index.json` for the manifest
//! - `<prefix>/<hex[0..2]>/<digest>` for each content object

use std::sync::Arc;

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use tracing::{debug, info};

use crate::config::StoreConfig;
use crate::digest::{self, DigestHex};
use crate::error::SyncError;
use crate::manifest::Manifest;

/// File name of the published manifest
pub const MANIFEST_NAME: &str = "index.json";

/// Wrapper around the object store backend and the key prefix
#[derive(Debug, Clone)]
pub struct RemoteStore {
    inner: Arc<dyn ObjectStore>,
    prefix: String,
}

impl RemoteStore {
    /// Build an S3 client from configuration
    pub fn from_config(config: &StoreConfig) -> Result<Self, SyncError> {
        let mut builder = AmazonS3Builder::new()
            .with_bucket_name(&config.bucket)
            .with_region(&config.region)
            .with_access_key_id(&config.access_key)
            .with_secret_access_key(&config.secret_key)
            .with_virtual_hosted_style_request(!config.path_style);

        if !config.endpoint.is_empty() {
            builder = builder
                .with_endpoint(&config.endpoint)
                .with_allow_http(config.endpoint.starts_with("http://"));
        }

        let store = builder
            .build()
            .map_err(|e| SyncError::ConfigError(format!("Invalid object store settings: {}", e)))?;

        Ok(Self::with_store(Arc::new(store), &config.prefix))
    }

    /// Use an existing backend
    pub fn with_store(inner: Arc<dyn ObjectStore>, prefix: &str) -> Self {
        Self {
            inner,
            prefix: prefix.trim_matches('/').to_string(),
        }
    }

    /// In-memory backend
    pub fn memory(prefix: &str) -> Self {
        Self::with_store(Arc::new(InMemory::new()), prefix)
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    fn key(&self, parts: &[&str]) -> ObjectPath {
        ObjectPath::from_iter(
            self.prefix
                .split('/')
                .chain(parts.iter().copied())
                .filter(|p| !p.is_empty()),
        )
    }

    /// `<prefix>/index.json`
    pub fn manifest_key(&self) -> ObjectPath {
        self.key(&[MANIFEST_NAME])
    }

    /// `<prefix>/<hex[0..2]>/<digest>`
    pub fn object_key(&self, digest: &DigestHex) -> ObjectPath {
        let (shard, name) = digest::storage_path(digest);
        self.key(&[shard, name])
    }

    /// Fetch the previously published manifest
    ///
    /// A missing manifest is the first-run signal and yields an empty
    /// baseline. A manifest that exists but does not decode is an error.
    pub async fn load_manifest(&self) -> Result<Manifest, SyncError> {
        let key = self.manifest_key();
        match self.inner.get(&key).await {
            Ok(result) => {
                let bytes = result.bytes().await?;
                let manifest = Manifest::from_slice(&bytes)?;
                info!(key = %key, entries = manifest.len(), "Loaded baseline manifest");
                Ok(manifest)
            }
            Err(object_store::Error::NotFound { .. }) => {
                info!(key = %key, "No baseline manifest, starting empty");
                Ok(Manifest::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Existence probe for a content object
    pub async fn has_object(&self, digest: &DigestHex) -> Result<bool, SyncError> {
        match self.inner.head(&self.object_key(digest)).await {
            Ok(_) => Ok(true),
            Err(object_store::Error::NotFound { .. }) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// Upload a content object
    pub async fn put_object(&self, digest: &DigestHex, data: Bytes) -> Result<(), SyncError> {
        let key = self.object_key(digest);
        debug!(key = %key, bytes = data.len(), "Uploading object");
        self.inner.put(&key, data.into()).await?;
        Ok(())
    }

    /// Overwrite the published manifest
    pub async fn put_manifest(&self, manifest: &Manifest) -> Result<(), SyncError> {
        let key = self.manifest_key();
        let data = Bytes::from(manifest.serialize()?);
        self.inner.put(&key, data.into()).await?;
        Ok(())
    }

    /// Raw read by full key
    pub async fn get_bytes(&self, key: &ObjectPath) -> Result<Option<Bytes>, SyncError> {
        match self.inner.get(key).await {
            Ok(result) => Ok(Some(result.bytes().await?)),
            Err(object_store::Error::NotFound { .. }) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Raw write by full key
    pub async fn put_bytes(&self, key: &ObjectPath, data: Bytes) -> Result<(), SyncError> {
        self.inner.put(key, data.into()).await?;
        Ok(())
    }
}
