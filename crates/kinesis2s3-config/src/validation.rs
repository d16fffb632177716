// Configuration validation
//
// Validates that required fields are present and values are sensible

use super::*;
use anyhow::{bail, Result};
use tracing::warn;

pub fn validate_config(config: &RuntimeConfig) -> Result<()> {
    validate_storage_config(&config.storage)?;
    validate_archive_config(&config.archive)?;
    validate_trigger_config(&config.trigger)?;
    Ok(())
}

fn validate_storage_config(config: &StorageConfig) -> Result<()> {
    match config.backend {
        StorageBackend::S3 => {
            if config.target().bucket.is_empty() {
                bail!("storage.bucket_path must name a bucket for the S3 backend");
            }
            if config.s3.region.is_empty() {
                bail!("storage.s3.region is required for S3 backend");
            }
        }
        StorageBackend::Fs => {
            if let Some(fs) = config.fs.as_ref() {
                if fs.path.is_empty() {
                    bail!("storage.fs.path must not be empty");
                }
            }
        }
        StorageBackend::Memory => {
            warn!("memory storage backend selected; archived objects are not persisted");
        }
    }

    Ok(())
}

fn validate_archive_config(config: &ArchiveConfig) -> Result<()> {
    if config.timestamp_field.is_empty() {
        bail!("archive.timestamp_field must not be empty");
    }
    Ok(())
}

fn validate_trigger_config(config: &TriggerConfig) -> Result<()> {
    if config.name.is_empty() {
        bail!("trigger.name must not be empty");
    }
    if config.name.contains('/') {
        bail!("trigger.name must not contain '/'");
    }
    Ok(())
}
