// Archiver behaviour against an in-memory object store

use async_trait::async_trait;
use kinesis2s3_config::RuntimeConfig;
use kinesis2s3_core::deagg::aggregate;
use kinesis2s3_core::{
    content_hash, ArchiveError, ErrorKind, HashAlgorithm, KinesisEvent, KinesisEventRecord,
};
use kinesis2s3_writer::opendal::{services, Operator};
use kinesis2s3_writer::{Archiver, ObjectStore, WriterError};
use std::sync::{Arc, Mutex};

// 2024-01-15 10:00:00 UTC
const HOUR_10: i64 = 1_705_312_800;

/// Memory store that records every call and can be told to fail some of them
struct RecordingStore {
    op: Operator,
    puts: Mutex<Vec<String>>,
    fail_puts_containing: Option<String>,
    fail_stats: bool,
}

impl RecordingStore {
    fn new() -> Self {
        Self {
            op: Operator::new(services::Memory::default()).unwrap().finish(),
            puts: Mutex::new(Vec::new()),
            fail_puts_containing: None,
            fail_stats: false,
        }
    }

    fn puts(&self) -> Vec<String> {
        self.puts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for RecordingStore {
    async fn put_object(&self, path: &str, body: Vec<u8>) -> kinesis2s3_writer::Result<()> {
        if let Some(needle) = &self.fail_puts_containing {
            if path.contains(needle.as_str()) {
                return Err(WriterError::write_failure(path, "injected failure".into()));
            }
        }
        self.puts.lock().unwrap().push(path.to_string());
        self.op.put_object(path, body).await
    }

    async fn object_exists(&self, path: &str) -> kinesis2s3_writer::Result<bool> {
        if self.fail_stats {
            return Err(WriterError::stat_failure(path, "access denied".into()));
        }
        self.op.object_exists(path).await
    }
}

fn config(trigger: bool) -> RuntimeConfig {
    let mut config = RuntimeConfig::default();
    config.storage.bucket_path = "archive-bucket/raw".to_string();
    config.storage.key_base = "wins-".to_string();
    config.trigger.enabled = trigger;
    config
}

fn event_at(offsets: &[i64]) -> KinesisEvent {
    KinesisEvent {
        records: offsets
            .iter()
            .enumerate()
            .map(|(i, offset)| {
                let payload = format!(r#"{{"id":{},"tstamp":{}}}"#, i, HOUR_10 + offset);
                KinesisEventRecord::from_payload(payload.as_bytes())
            })
            .collect(),
    }
}

async fn read(store: &RecordingStore, path: &str) -> String {
    let buffer = store.op.read(path).await.unwrap();
    String::from_utf8(buffer.to_vec()).unwrap()
}

#[tokio::test]
async fn empty_event_is_a_no_op() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(true));

    let outcome = archiver.process(&KinesisEvent::default()).await.unwrap();
    assert_eq!(outcome.records_processed, 0);
    assert!(outcome.objects.is_empty());
    assert!(store.puts().is_empty());
}

#[tokio::test]
async fn wrong_event_source_is_rejected() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(true));

    let mut event = event_at(&[0, 60]);
    event.records[1].event_source = Some("aws:dynamodb".to_string());

    let err = archiver.process(&event).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InputRejected);
    assert!(err.to_string().contains("Invalid Event Source"));
    assert!(store.puts().is_empty());
}

#[tokio::test]
async fn wrong_schema_version_is_rejected() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(false));

    let mut event = event_at(&[0]);
    event.records[0].kinesis.kinesis_schema_version = None;

    let err = archiver.process(&event).await.unwrap_err();
    assert!(matches!(err, ArchiveError::UnsupportedSchemaVersion { .. }));
    assert!(store.puts().is_empty());
}

#[tokio::test]
async fn hour_boundary_produces_two_objects_and_no_trigger() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(true));

    // 10:00:05, 10:59:59, 11:00:00
    let outcome = archiver
        .process(&event_at(&[5, 3599, 3600]))
        .await
        .unwrap();

    assert_eq!(outcome.records_processed, 3);
    assert_eq!(outcome.objects.len(), 2);
    assert_eq!(outcome.trigger, None);
    assert_eq!(store.puts().len(), 2);

    let first_body = format!(
        "{{\"id\":0,\"tstamp\":{}}}\n{{\"id\":1,\"tstamp\":{}}}\n",
        HOUR_10 + 5,
        HOUR_10 + 3599
    );
    let first_hash = content_hash(first_body.as_bytes(), HashAlgorithm::Md5);
    assert_eq!(
        outcome.objects[0],
        format!("raw/2024/01/15/10/wins-2024-01-15-10-00-05-{}", first_hash)
    );
    assert_eq!(read(&store, &outcome.objects[0]).await, first_body);

    assert!(outcome.objects[1].starts_with("raw/2024/01/15/11/wins-2024-01-15-11-00-00-"));
    assert_eq!(
        read(&store, &outcome.objects[1]).await,
        format!("{{\"id\":2,\"tstamp\":{}}}\n", HOUR_10 + 3600)
    );
}

#[tokio::test]
async fn single_hour_writes_trigger_for_previous_hour_once() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(true));

    let outcome = archiver.process(&event_at(&[0, 10, 20])).await.unwrap();
    assert_eq!(outcome.objects.len(), 1);
    assert_eq!(
        outcome.trigger.as_deref(),
        Some("raw/2024/01/15/09/complete.trigger")
    );
    assert!(read(&store, "raw/2024/01/15/09/complete.trigger")
        .await
        .is_empty());

    // Same hour again: sentinel already there, only the batch is written
    let outcome = archiver.process(&event_at(&[30, 40])).await.unwrap();
    assert_eq!(outcome.trigger, None);

    let puts = store.puts();
    assert_eq!(puts.len(), 3);
    assert_eq!(
        puts.iter()
            .filter(|p| p.ends_with("complete.trigger"))
            .count(),
        1
    );
}

#[tokio::test]
async fn trigger_disabled_writes_no_sentinel() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(false));

    let outcome = archiver.process(&event_at(&[0, 10])).await.unwrap();
    assert_eq!(outcome.trigger, None);
    assert_eq!(store.puts().len(), 1);
}

#[tokio::test]
async fn failed_existence_check_still_writes_trigger() {
    let mut store = RecordingStore::new();
    store.fail_stats = true;
    let store = Arc::new(store);
    let archiver = Archiver::from_config(store.clone(), &config(true));

    let outcome = archiver.process(&event_at(&[0])).await.unwrap();
    assert_eq!(
        outcome.trigger.as_deref(),
        Some("raw/2024/01/15/09/complete.trigger")
    );
}

#[tokio::test]
async fn keys_are_deterministic() {
    let event = event_at(&[0, 1, 3600, 3601]);

    let first = Archiver::from_config(Arc::new(RecordingStore::new()), &config(false))
        .process(&event)
        .await
        .unwrap();
    let second = Archiver::from_config(Arc::new(RecordingStore::new()), &config(false))
        .process(&event)
        .await
        .unwrap();

    assert_eq!(first.objects, second.objects);
}

#[tokio::test]
async fn one_failed_upload_fails_invocation_after_others_settle() {
    let mut store = RecordingStore::new();
    store.fail_puts_containing = Some("/2024/01/15/10/".to_string());
    let store = Arc::new(store);
    let archiver = Archiver::from_config(store.clone(), &config(true));

    let err = archiver
        .process(&event_at(&[0, 3600, 7200]))
        .await
        .unwrap_err();

    assert!(err.is_retryable());
    assert!(matches!(err, ArchiveError::Storage { ref path, .. } if path.contains("/10/")));

    // The 11:00 and 12:00 batches were still attempted and written
    let puts = store.puts();
    assert_eq!(puts.len(), 2);
    assert!(puts.iter().any(|p| p.contains("/2024/01/15/11/")));
    assert!(puts.iter().any(|p| p.contains("/2024/01/15/12/")));
}

#[tokio::test]
async fn decode_failure_writes_nothing() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(true));

    let mut event = event_at(&[0, 10]);
    event.records.push(KinesisEventRecord::from_payload(b"{\"id\": 9"));

    let err = archiver.process(&event).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DecodeFailure);
    assert!(matches!(err, ArchiveError::Json { index: 2, .. }));
    assert!(store.puts().is_empty());
}

#[tokio::test]
async fn aggregated_records_are_archived_individually() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(false));

    let inner_a = format!(r#"{{"id":"a","tstamp":{}}}"#, HOUR_10);
    let inner_b = format!(r#"{{"id":"b","tstamp":{}}}"#, HOUR_10 + 1);
    let event = KinesisEvent {
        records: vec![KinesisEventRecord::from_payload(&aggregate(
            "pk",
            &[inner_a.as_bytes(), inner_b.as_bytes()],
        ))],
    };

    let outcome = archiver.process(&event).await.unwrap();
    assert_eq!(outcome.records_processed, 1);
    assert_eq!(outcome.logical_records, 2);
    assert_eq!(
        read(&store, &outcome.objects[0]).await,
        format!("{}\n{}\n", inner_a, inner_b)
    );
}

#[tokio::test]
async fn failed_trigger_write_fails_invocation() {
    let mut store = RecordingStore::new();
    store.fail_puts_containing = Some("complete.trigger".to_string());
    let store = Arc::new(store);
    let archiver = Archiver::from_config(store.clone(), &config(true));

    let err = archiver.process(&event_at(&[0, 10])).await.unwrap_err();
    assert!(matches!(
        err,
        ArchiveError::Storage { ref path, .. } if path == "raw/2024/01/15/09/complete.trigger"
    ));

    // The batch itself went out before the sentinel was attempted
    let puts = store.puts();
    assert_eq!(puts.len(), 1);
    assert!(puts[0].starts_with("raw/2024/01/15/10/wins-2024-01-15-10-00-00-"));
}

#[tokio::test]
async fn trigger_before_earliest_hour_is_rejected() {
    let store = Arc::new(RecordingStore::new());
    let archiver = Archiver::from_config(store.clone(), &config(true));

    let earliest = chrono::DateTime::<chrono::Utc>::MIN_UTC.timestamp();
    let payload = format!(r#"{{"id":0,"tstamp":{}}}"#, earliest);
    let event = KinesisEvent {
        records: vec![KinesisEventRecord::from_payload(payload.as_bytes())],
    };

    let err = archiver.process(&event).await.unwrap_err();
    assert!(matches!(err, ArchiveError::InvalidTimestamp { index: 0, .. }));
    assert!(!err.is_retryable());
    assert_eq!(store.puts().len(), 1);
}
