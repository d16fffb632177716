// Kinesis event handlers
//
// Each handler sees one delivered batch and either succeeds as a whole or
// fails as a whole; a failure makes Lambda retry the batch.

use kinesis2s3_config::RuntimeConfig;
use kinesis2s3_core::{
    decode_text, ArchiveError, Deaggregator, KinesisEvent, KplDeaggregator,
    PassthroughDeaggregator, Result,
};
use kinesis2s3_writer::{expand_event, Archiver};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

const UNKNOWN_KEY: &str = "unknown";

/// Archive the event; returns the number of delivered records processed.
pub(crate) async fn archive(event: &KinesisEvent, archiver: &Archiver) -> Result<usize> {
    let outcome = archiver.process(event).await?;
    Ok(outcome.records_processed)
}

/// Per-key record count produced by the aggregator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateCount {
    pub plid: String,
    pub exchange: String,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregateSummary {
    pub records_processed: usize,
    pub groups: Vec<AggregateCount>,
}

/// Tally records by `plid` and `exchange`.
///
/// Results are only logged and returned; persisting them is left to the
/// document store integration.
pub(crate) async fn aggregate(
    event: &KinesisEvent,
    config: &RuntimeConfig,
) -> Result<AggregateSummary> {
    if event.is_empty() {
        tracing::warn!("Received Kinesis event with no records; nothing to aggregate");
        return Ok(AggregateSummary::default());
    }
    event.validate()?;

    let deaggregator = deaggregator_for(config);
    let payloads = expand_event(event, deaggregator.as_ref()).await?;

    let mut counts: BTreeMap<(String, String), usize> = BTreeMap::new();
    for (index, bytes) in payloads.into_iter().enumerate() {
        let encoding = config.archive.text_encoding;
        let text =
            decode_text(bytes, encoding).ok_or(ArchiveError::TextEncoding { index, encoding })?;
        let record: Value =
            serde_json::from_str(&text).map_err(|source| ArchiveError::Json { index, source })?;

        let plid = key_field(&record, "plid");
        let exchange = key_field(&record, "exchange");
        tracing::info!(
            "Aggregating by plid: {} and exchange: {}",
            plid,
            exchange
        );
        *counts.entry((plid, exchange)).or_default() += 1;
    }

    Ok(AggregateSummary {
        records_processed: event.len(),
        groups: counts
            .into_iter()
            .map(|((plid, exchange), count)| AggregateCount {
                plid,
                exchange,
                count,
            })
            .collect(),
    })
}

/// Decode every payload and log it. No parsing, no envelope checks.
pub(crate) fn decode_log(event: &KinesisEvent, config: &RuntimeConfig) -> Result<usize> {
    let encoding = config.archive.text_encoding;
    for (index, record) in event.records.iter().enumerate() {
        let payload = record.payload(index)?;
        let text =
            decode_text(payload, encoding).ok_or(ArchiveError::TextEncoding { index, encoding })?;
        tracing::debug!("Decoded payload: {}", text);
    }
    Ok(event.len())
}

fn deaggregator_for(config: &RuntimeConfig) -> Box<dyn Deaggregator> {
    if config.archive.deaggregate {
        Box::new(KplDeaggregator)
    } else {
        Box::new(PassthroughDeaggregator)
    }
}

fn key_field(record: &Value, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => UNKNOWN_KEY.to_string(),
        Some(other) => other.to_string(),
    }
}
