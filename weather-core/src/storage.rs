//! Writing records to object storage.

use std::{
    collections::HashMap,
    fmt::Debug,
    path::PathBuf,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use object_store::{
    Attribute, Attributes, ObjectStore, PutOptions, PutPayload, aws::AmazonS3Builder,
    local::LocalFileSystem, memory::InMemory, path::Path as ObjectPath,
};
use tracing::debug;

use crate::{error::StorageError, model::WeatherRecord};

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Blob-level contract: create or overwrite one object.
#[async_trait]
pub trait BlobStore: Send + Sync + Debug {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &'static str,
    ) -> Result<(), StorageError>;
}

/// Where buckets live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    /// Amazon S3, configured from the standard `AWS_*` environment.
    S3,
    /// One directory per bucket under the given root.
    Local(PathBuf),
    /// Process memory; contents vanish with the store.
    Memory,
}

/// [`BlobStore`] backed by the `object_store` crate.
///
/// Each bucket gets its own store, built on first use and reused afterwards.
#[derive(Debug)]
pub struct ObjectStoreBlobStore {
    backend: StorageBackend,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl ObjectStoreBlobStore {
    pub fn new(backend: StorageBackend) -> Self {
        Self {
            backend,
            stores: Mutex::new(HashMap::new()),
        }
    }

    /// The underlying store for `bucket`, opening it if needed.
    pub fn store_for(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        let setup_err = |reason: String| StorageError::Setup {
            bucket: bucket.to_string(),
            reason,
        };

        let mut stores = self
            .stores
            .lock()
            .map_err(|_| setup_err("store cache lock poisoned".to_string()))?;

        if let Some(store) = stores.get(bucket) {
            return Ok(Arc::clone(store));
        }

        let store: Arc<dyn ObjectStore> = match &self.backend {
            StorageBackend::S3 => Arc::new(
                AmazonS3Builder::from_env()
                    .with_bucket_name(bucket)
                    .build()
                    .map_err(|e| setup_err(e.to_string()))?,
            ),
            StorageBackend::Local(root) => {
                let dir = root.join(bucket);
                std::fs::create_dir_all(&dir)
                    .map_err(|e| setup_err(format!("{}: {e}", dir.display())))?;
                Arc::new(LocalFileSystem::new_with_prefix(&dir).map_err(|e| setup_err(e.to_string()))?)
            }
            StorageBackend::Memory => Arc::new(InMemory::new()),
        };

        debug!(bucket, backend = ?self.backend, "opened object store");
        stores.insert(bucket.to_string(), Arc::clone(&store));
        Ok(store)
    }

    fn supports_attributes(&self) -> bool {
        !matches!(self.backend, StorageBackend::Local(_))
    }
}

#[async_trait]
impl BlobStore for ObjectStoreBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &'static str,
    ) -> Result<(), StorageError> {
        let path = ObjectPath::parse(key).map_err(|source| StorageError::InvalidKey {
            key: key.to_string(),
            source,
        })?;
        let store = self.store_for(bucket)?;

        // The local filesystem has nowhere to keep a content type.
        let mut opts = PutOptions::default();
        if self.supports_attributes() {
            let mut attributes = Attributes::new();
            attributes.insert(Attribute::ContentType, content_type.into());
            opts.attributes = attributes;
        }

        store
            .put_opts(&path, PutPayload::from(body), opts)
            .await
            .map_err(|source| StorageError::Backend {
                bucket: bucket.to_string(),
                key: key.to_string(),
                source,
            })?;

        Ok(())
    }
}

/// Serializes records and hands them to a [`BlobStore`].
#[derive(Debug, Clone)]
pub struct StorageWriter {
    store: Arc<dyn BlobStore>,
}

impl StorageWriter {
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self { store }
    }

    /// Write `record` as one line of compact JSON at `bucket/key`.
    pub async fn write(&self, bucket: &str, key: &str, record: &WeatherRecord) -> Result<(), StorageError> {
        let body = encode_record(record)?;
        self.store.put(bucket, key, body, JSON_CONTENT_TYPE).await
    }
}

/// Compact JSON followed by a newline.
pub fn encode_record(record: &WeatherRecord) -> Result<Vec<u8>, StorageError> {
    let mut body = serde_json::to_vec(record)?;
    body.push(b'\n');
    Ok(body)
}
