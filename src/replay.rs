//! Replaying captured Kinesis events
//!
//! A captured event is the JSON document Lambda hands the handler, i.e. an
//! object with a `Records` array.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use kinesis2s3_config::{RuntimeConfig, StorageBackend};
use kinesis2s3_core::KinesisEvent;
use kinesis2s3_lambda::{Handler, HandlerState};
use kinesis2s3_writer::{ArchiveOutcome, Archiver, ObjectStore};
use serde_json::{json, Value};

/// Parse a captured event document.
pub fn parse_event(bytes: &[u8]) -> Result<KinesisEvent> {
    serde_json::from_slice(bytes).context("Failed to parse Kinesis event JSON")
}

/// Read and parse a captured event from disk.
pub async fn load_event(path: impl AsRef<Path>) -> Result<KinesisEvent> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("Failed to read event file: {}", path.display()))?;
    parse_event(&bytes).with_context(|| format!("Invalid event file: {}", path.display()))
}

/// Apply command-line overrides and validate the result.
///
/// `--output` switches storage to the filesystem backend. Only the archive
/// handler touches storage, so the other handlers skip validation the same
/// way the Lambda binaries do.
pub fn apply_overrides(
    mut config: RuntimeConfig,
    handler: Handler,
    output: Option<&Path>,
    log_level: Option<&str>,
) -> Result<RuntimeConfig> {
    if let Some(output) = output {
        config.storage.backend = StorageBackend::Fs;
        let fs_config = config.storage.fs.get_or_insert_with(Default::default);
        fs_config.path = output.to_string_lossy().to_string();
    }
    if let Some(level) = log_level {
        config.logging.level = level.to_string();
    }

    if handler == Handler::Archive {
        config.validate()?;
    }
    Ok(config)
}

/// Run `handler` over `event` and report what it did.
///
/// The archive handler reports every object it wrote; the others report the
/// same value the Lambda binary would return.
pub async fn replay_event(
    handler: Handler,
    config: &RuntimeConfig,
    store: Option<Arc<dyn ObjectStore>>,
    event: &KinesisEvent,
) -> Result<Value> {
    match handler {
        Handler::Archive => {
            let store = store.context("archive replay requires a storage backend")?;
            let outcome = Archiver::from_config(store, config).process(event).await?;
            Ok(outcome_json(&outcome))
        }
        Handler::Aggregate | Handler::DecodeLog => {
            let state = HandlerState::new(handler, config.clone())?;
            Ok(state.invoke(event).await?)
        }
    }
}

fn outcome_json(outcome: &ArchiveOutcome) -> Value {
    json!({
        "records_processed": outcome.records_processed,
        "logical_records": outcome.logical_records,
        "objects": outcome.objects,
        "trigger": outcome.trigger,
    })
}
