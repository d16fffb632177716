//! Hour-partitioned archiving of one Kinesis event
//!
//! 1. Validate the envelope (empty events are a no-op)
//! 2. Decode and deaggregate every record, then parse each as JSON
//! 3. Split the sequence into runs sharing a UTC hour-of-day
//! 4. Upload every run concurrently as a JSON Lines object
//! 5. If the whole event was a single run, mark the previous hour complete

use std::sync::Arc;

use futures::future::join_all;
use kinesis2s3_config::{HashAlgorithm, RuntimeConfig};
use kinesis2s3_core::{
    batch_location, partition_by_hour, serialize_batch, trigger_path, ArchiveError,
    DecodedRecord, Deaggregator, KinesisEvent, KplDeaggregator, PassthroughDeaggregator,
    RecordDecoder, Result,
};

use crate::expand::expand_event;
use crate::storage::ObjectStore;

/// Where and how batches are written
#[derive(Debug, Clone)]
pub struct ArchiveSettings {
    /// Key prefix inside the bucket
    pub prefix: String,
    pub key_base: String,
    pub hash_algorithm: HashAlgorithm,
    /// Sentinel name, when trigger files are enabled
    pub trigger_name: Option<String>,
}

impl ArchiveSettings {
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self {
            prefix: config.storage.target().prefix,
            key_base: config.storage.key_base.clone(),
            hash_algorithm: config.archive.hash_algorithm,
            trigger_name: config
                .trigger
                .enabled
                .then(|| config.trigger.name.clone()),
        }
    }
}

/// What one invocation did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArchiveOutcome {
    /// Records delivered by Kinesis
    pub records_processed: usize,
    /// Records after deaggregation
    pub logical_records: usize,
    /// Paths of the objects written, in batch order
    pub objects: Vec<String>,
    /// Path of the sentinel written, if any
    pub trigger: Option<String>,
}

/// Archives Kinesis events into an object store
pub struct Archiver {
    store: Arc<dyn ObjectStore>,
    deaggregator: Arc<dyn Deaggregator>,
    decoder: RecordDecoder,
    settings: ArchiveSettings,
}

impl Archiver {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        deaggregator: Arc<dyn Deaggregator>,
        decoder: RecordDecoder,
        settings: ArchiveSettings,
    ) -> Self {
        Self {
            store,
            deaggregator,
            decoder,
            settings,
        }
    }

    pub fn from_config(store: Arc<dyn ObjectStore>, config: &RuntimeConfig) -> Self {
        let deaggregator: Arc<dyn Deaggregator> = if config.archive.deaggregate {
            Arc::new(KplDeaggregator)
        } else {
            Arc::new(PassthroughDeaggregator)
        };

        Self::new(
            store,
            deaggregator,
            RecordDecoder::new(&config.archive),
            ArchiveSettings::from_config(config),
        )
    }

    pub async fn process(&self, event: &KinesisEvent) -> Result<ArchiveOutcome> {
        if event.is_empty() {
            tracing::warn!("Received Kinesis event with no records; nothing to archive");
            return Ok(ArchiveOutcome::default());
        }

        event.validate()?;

        let payloads = expand_event(event, self.deaggregator.as_ref()).await?;
        let records = payloads
            .into_iter()
            .enumerate()
            .map(|(index, bytes)| self.decoder.decode(index, bytes))
            .collect::<Result<Vec<_>>>()?;

        let batches = partition_by_hour(&records);
        tracing::debug!(
            records = event.len(),
            logical_records = records.len(),
            batches = batches.len(),
            "Partitioned Kinesis records by hour"
        );

        let objects = self
            .upload_batches(batches.iter().map(|range| range.slice(&records)))
            .await?;

        let trigger = match (&self.settings.trigger_name, batches.as_slice()) {
            (Some(name), [only]) => {
                self.write_trigger(only.start, &records[only.start], name)
                    .await?
            }
            _ => None,
        };

        tracing::info!(
            records = event.len(),
            objects = objects.len(),
            trigger = trigger.as_deref().unwrap_or("-"),
            "Archived Kinesis batch"
        );

        Ok(ArchiveOutcome {
            records_processed: event.len(),
            logical_records: records.len(),
            objects,
            trigger,
        })
    }

    /// Upload every batch concurrently, letting all attempts settle.
    async fn upload_batches<'a>(
        &self,
        batches: impl Iterator<Item = &'a [DecodedRecord]>,
    ) -> Result<Vec<String>> {
        let uploads = batches.map(|batch| {
            let serialized = serialize_batch(batch, self.settings.hash_algorithm);
            let location = batch_location(
                &self.settings.prefix,
                &self.settings.key_base,
                &batch[0].timestamp,
                &serialized.hash,
            );
            let path = location.path();
            let store = Arc::clone(&self.store);

            async move {
                tracing::debug!(
                    path = %path,
                    records = serialized.record_count,
                    bytes = serialized.body.len(),
                    "Uploading batch"
                );
                store
                    .put_object(&path, serialized.body)
                    .await
                    .map(|_| path)
                    .map_err(ArchiveError::from)
            }
        });

        let settled = join_all(uploads).await;

        let mut written = Vec::with_capacity(settled.len());
        let mut first_error = None;
        for result in settled {
            match result {
                Ok(path) => written.push(path),
                Err(err) => {
                    tracing::error!(error = %err, "Batch upload failed");
                    first_error.get_or_insert(err);
                }
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(written),
        }
    }

    /// Write the previous hour's sentinel unless it already exists.
    ///
    /// A failed existence check is treated like "absent".
    async fn write_trigger(
        &self,
        index: usize,
        first: &DecodedRecord,
        name: &str,
    ) -> Result<Option<String>> {
        let path = trigger_path(&self.settings.prefix, &first.timestamp, name)
            .ok_or_else(|| ArchiveError::InvalidTimestamp {
                index,
                value: first.timestamp.timestamp().to_string(),
            })?
            .path();

        match self.store.object_exists(&path).await {
            Ok(true) => {
                tracing::debug!(path = %path, "Trigger file already present");
                return Ok(None);
            }
            Ok(false) => {}
            Err(err) => {
                tracing::warn!(
                    path = %path,
                    error = %err,
                    "Trigger existence check failed; writing anyway"
                );
            }
        }

        self.store.put_object(&path, Vec::new()).await?;
        tracing::info!(path = %path, "Wrote trigger file");
        Ok(Some(path))
    }
}
