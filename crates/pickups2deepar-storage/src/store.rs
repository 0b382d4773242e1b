//! OpenDAL-backed object store.
//!
//! One operator per run, built from `StorageConfig` and handed to the fetch
//! and upload stages explicitly.

use opendal::{EntryMode, ErrorKind, Operator};
use pickups2deepar_config::{StorageBackend, StorageConfig};
use tracing::{debug, info};

use crate::error::{Result, StorageError};

#[derive(Clone, Debug)]
pub struct ObjectStore {
    operator: Operator,
}

impl ObjectStore {
    /// Build the operator for the configured backend.
    pub fn from_config(config: &StorageConfig) -> Result<Self> {
        let operator = match config.backend {
            StorageBackend::Fs => {
                let fs = config.fs.as_ref().ok_or_else(|| {
                    StorageError::invalid_config("fs config required for filesystem backend")
                })?;
                info!("Using filesystem storage at: {}", fs.path);

                let fs_builder = opendal::services::Fs::default().root(&fs.path);
                Operator::new(fs_builder)
                    .map_err(|e| {
                        StorageError::invalid_config(format!(
                            "Failed to create filesystem operator: {}",
                            e
                        ))
                    })?
                    .finish()
            }
            StorageBackend::S3 => {
                let s3 = config.s3.as_ref().ok_or_else(|| {
                    StorageError::invalid_config("s3 config required for S3 backend")
                })?;
                info!(
                    "Using S3 storage: bucket={}, region={}",
                    s3.bucket, s3.region
                );

                let mut s3_builder = opendal::services::S3::default()
                    .bucket(&s3.bucket)
                    .region(&s3.region);

                if let Some(endpoint) = &s3.endpoint {
                    s3_builder = s3_builder.endpoint(endpoint);
                }

                Operator::new(s3_builder)
                    .map_err(|e| {
                        StorageError::invalid_config(format!("Failed to create S3 operator: {}", e))
                    })?
                    .finish()
            }
        };

        debug!("Storage operator initialized");
        Ok(Self { operator })
    }

    /// Wrap an existing operator (memory backend in tests, custom services).
    pub fn from_operator(operator: Operator) -> Self {
        Self { operator }
    }

    pub fn operator(&self) -> &Operator {
        &self.operator
    }

    /// File keys under `prefix`, recursively, in lexicographic order.
    pub async fn list_files(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self
            .operator
            .list_with(prefix)
            .recursive(true)
            .await
            .map_err(|e| StorageError::fetch_failure(prefix, e))?;

        let mut keys: Vec<String> = entries
            .into_iter()
            .filter(|entry| entry.metadata().mode() == EntryMode::FILE)
            .map(|entry| entry.path().to_string())
            .collect();
        keys.sort();
        Ok(keys)
    }

    /// Object size in bytes.
    pub async fn size(&self, key: &str) -> Result<u64> {
        let meta = self
            .operator
            .stat(key)
            .await
            .map_err(|e| StorageError::fetch_failure(key, e))?;
        Ok(meta.content_length())
    }

    /// Read `[start, end)` of an object.
    pub async fn read_range(&self, key: &str, start: u64, end: u64) -> Result<Vec<u8>> {
        let reader = self
            .operator
            .reader(key)
            .await
            .map_err(|e| StorageError::fetch_failure(key, e))?;
        let buffer = reader
            .read(start..end)
            .await
            .map_err(|e| StorageError::fetch_failure(key, e))?;
        Ok(buffer.to_vec())
    }

    /// Create or overwrite an object.
    pub async fn put(&self, key: &str, data: Vec<u8>) -> Result<()> {
        self.operator
            .write(key, data)
            .await
            .map_err(|e| StorageError::upload_failure(key, e))?;
        Ok(())
    }

    /// Check if an object exists
    pub async fn exists(&self, key: &str) -> Result<bool> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::fetch_failure(key, e)),
        }
    }
}
