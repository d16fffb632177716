//! Kinesis event envelope as delivered to a Lambda function

use crate::error::{ArchiveError, Result};
use base64::Engine;
use serde::{Deserialize, Serialize};

/// The only `eventSource` the handlers accept
pub const SOURCE_TAG: &str = "aws:kinesis";

/// The only `kinesisSchemaVersion` the handlers accept
pub const SCHEMA_VERSION: &str = "1.0";

/// One delivered batch. A missing `Records` array is an empty batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KinesisEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<KinesisEventRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisEventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_source: Option<String>,
    #[serde(
        rename = "eventSourceARN",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub event_source_arn: Option<String>,
    #[serde(rename = "eventID", default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,
    pub kinesis: KinesisData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KinesisData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kinesis_schema_version: Option<String>,
    /// Base64 payload
    pub data: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partition_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_arrival_timestamp: Option<f64>,
}

impl KinesisEvent {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Reject envelopes from any other source or schema version.
    ///
    /// Every record is checked; the first mismatch wins.
    pub fn validate(&self) -> Result<()> {
        for record in &self.records {
            let source = record.event_source.as_deref().unwrap_or_default();
            if source != SOURCE_TAG {
                return Err(ArchiveError::InvalidEventSource {
                    expected: SOURCE_TAG,
                    found: source.to_string(),
                });
            }

            let version = record
                .kinesis
                .kinesis_schema_version
                .as_deref()
                .unwrap_or_default();
            if version != SCHEMA_VERSION {
                return Err(ArchiveError::UnsupportedSchemaVersion {
                    expected: SCHEMA_VERSION,
                    found: version.to_string(),
                });
            }
        }
        Ok(())
    }
}

impl KinesisEventRecord {
    /// Build a record carrying `payload`, as the Kinesis trigger would deliver it.
    pub fn from_payload(payload: &[u8]) -> Self {
        Self {
            event_source: Some(SOURCE_TAG.to_string()),
            kinesis: KinesisData {
                kinesis_schema_version: Some(SCHEMA_VERSION.to_string()),
                data: base64::engine::general_purpose::STANDARD.encode(payload),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    /// Decode the base64 payload. `index` is only used for error reporting.
    pub fn payload(&self, index: usize) -> Result<Vec<u8>> {
        base64::engine::general_purpose::STANDARD
            .decode(self.kinesis.data.trim())
            .map_err(|source| ArchiveError::Base64 { index, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const SAMPLE: &str = r#"{
        "Records": [
            {
                "eventID": "shardId-000000000000:49545115243490985018280067714973144582180062593244200961",
                "eventVersion": "1.0",
                "kinesis": {
                    "partitionKey": "partitionKey-3",
                    "data": "eyJ0c3RhbXAiOjE3MDUzMjc4MDB9",
                    "kinesisSchemaVersion": "1.0",
                    "sequenceNumber": "49545115243490985018280067714973144582180062593244200961",
                    "approximateArrivalTimestamp": 1428537600.0
                },
                "invokeIdentityArn": "arn:aws:iam::EXAMPLE",
                "eventName": "aws:kinesis:record",
                "eventSourceARN": "arn:aws:kinesis:EXAMPLE",
                "eventSource": "aws:kinesis",
                "awsRegion": "us-east-1"
            }
        ]
    }"#;

    #[test]
    fn test_deserialize_lambda_event() {
        let event: KinesisEvent = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(event.len(), 1);

        let record = &event.records[0];
        assert_eq!(record.event_source.as_deref(), Some("aws:kinesis"));
        assert_eq!(
            record.event_source_arn.as_deref(),
            Some("arn:aws:kinesis:EXAMPLE")
        );
        assert_eq!(record.payload(0).unwrap(), br#"{"tstamp":1705327800}"#);
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_missing_records_is_empty() {
        let event: KinesisEvent = serde_json::from_str("{}").unwrap();
        assert!(event.is_empty());
        assert!(event.validate().is_ok());
    }

    #[test]
    fn test_rejects_other_sources() {
        let mut event = KinesisEvent {
            records: vec![KinesisEventRecord::from_payload(b"{}")],
        };
        event.records[0].event_source = Some("aws:sqs".to_string());

        let err = event.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InputRejected);
        assert!(err.to_string().contains("Invalid Event Source"));
        assert!(err.to_string().contains("aws:sqs"));
    }

    #[test]
    fn test_rejects_other_schema_versions() {
        let mut event = KinesisEvent {
            records: vec![
                KinesisEventRecord::from_payload(b"{}"),
                KinesisEventRecord::from_payload(b"{}"),
            ],
        };
        event.records[1].kinesis.kinesis_schema_version = Some("2.0".to_string());

        let err = event.validate().unwrap_err();
        assert!(matches!(
            err,
            ArchiveError::UnsupportedSchemaVersion { ref found, .. } if found == "2.0"
        ));
    }

    #[test]
    fn test_invalid_base64() {
        let mut record = KinesisEventRecord::from_payload(b"{}");
        record.kinesis.data = "not base64!".to_string();
        assert!(matches!(
            record.payload(7),
            Err(ArchiveError::Base64 { index: 7, .. })
        ));
    }
}
