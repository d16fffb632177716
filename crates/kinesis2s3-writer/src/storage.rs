//! Object store access
//!
//! The operator is built once per process by the caller and handed to the
//! archiver; nothing here keeps global state.

use async_trait::async_trait;
use kinesis2s3_config::{StorageBackend, StorageConfig};
use opendal::{ErrorKind, Operator};

use crate::error::{Result, WriterError};

/// The two object-store calls the archiver makes
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `body` at `path`, replacing anything already there.
    async fn put_object(&self, path: &str, body: Vec<u8>) -> Result<()>;

    /// Whether an object exists at `path`. Errors other than "not found"
    /// surface as `Err`.
    async fn object_exists(&self, path: &str) -> Result<bool>;
}

#[async_trait]
impl ObjectStore for Operator {
    async fn put_object(&self, path: &str, body: Vec<u8>) -> Result<()> {
        self.write(path, body)
            .await
            .map_err(|e| WriterError::write_failure(path, e.to_string()))?;
        Ok(())
    }

    async fn object_exists(&self, path: &str) -> Result<bool> {
        match self.stat(path).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(WriterError::stat_failure(path, e.to_string())),
        }
    }
}

/// Build an operator for the configured backend.
///
/// The first segment of `bucket_path` names the bucket. For the filesystem
/// backend it becomes a directory under the configured root.
pub fn initialize_storage(config: &StorageConfig) -> Result<Operator> {
    let target = config.target();

    let operator = match config.backend {
        StorageBackend::Fs => {
            let root = config.fs.clone().unwrap_or_default().path;
            let root = if target.bucket.is_empty() {
                root
            } else {
                format!("{}/{}", root.trim_end_matches('/'), target.bucket)
            };

            let fs_builder = opendal::services::Fs::default().root(&root);
            Operator::new(fs_builder)
                .map_err(|e| {
                    WriterError::invalid_config(format!(
                        "Failed to create filesystem operator: {}",
                        e
                    ))
                })?
                .finish()
        }
        StorageBackend::S3 => {
            if target.bucket.is_empty() {
                return Err(WriterError::invalid_config(
                    "bucket_path must name a bucket for the S3 backend".to_string(),
                ));
            }

            let mut s3_builder = opendal::services::S3::default()
                .bucket(&target.bucket)
                .region(&config.s3.region);

            if let Some(endpoint) = &config.s3.endpoint {
                s3_builder = s3_builder.endpoint(endpoint);
            }

            Operator::new(s3_builder)
                .map_err(|e| {
                    WriterError::invalid_config(format!("Failed to create S3 operator: {}", e))
                })?
                .finish()
        }
        StorageBackend::Memory => Operator::new(opendal::services::Memory::default())
            .map_err(|e| {
                WriterError::invalid_config(format!("Failed to create memory operator: {}", e))
            })?
            .finish(),
    };

    tracing::debug!(
        backend = %config.backend,
        bucket = %target.bucket,
        prefix = %target.prefix,
        "Storage operator initialized"
    );

    Ok(operator)
}
