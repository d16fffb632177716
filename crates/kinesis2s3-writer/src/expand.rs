// Fan-out over delivered records: base64 decode and deaggregate each one.
//
// Every record is attempted even if an earlier one fails; the first failure
// in record order is reported once all have settled.

use futures::future::join_all;
use kinesis2s3_core::{ArchiveError, Deaggregator, KinesisEvent, Result};

/// Expand every delivered record into its logical payloads, preserving order.
pub async fn expand_event(
    event: &KinesisEvent,
    deaggregator: &dyn Deaggregator,
) -> Result<Vec<Vec<u8>>> {
    let attempts = event
        .records
        .iter()
        .enumerate()
        .map(|(index, record)| async move {
            let payload = record.payload(index)?;
            deaggregator
                .deaggregate(payload)
                .map_err(|message| ArchiveError::Deaggregation { index, message })
        });

    let settled = join_all(attempts).await;

    let mut payloads = Vec::with_capacity(settled.len());
    let mut first_error = None;
    for result in settled {
        match result {
            Ok(expanded) => payloads.extend(expanded),
            Err(err) => {
                tracing::error!(error = %err, "Failed to decode Kinesis record");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(payloads),
    }
}
