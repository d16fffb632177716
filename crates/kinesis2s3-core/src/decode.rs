//! Turning logical record bytes into timestamped JSON documents

use crate::error::{ArchiveError, Result};
use chrono::{DateTime, Timelike, Utc};
use kinesis2s3_config::{ArchiveConfig, TextEncoding, TimestampUnit};
use serde_json::Value;

/// A parsed record together with the timestamp it is bucketed by
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedRecord {
    pub value: Value,
    pub timestamp: DateTime<Utc>,
}

impl DecodedRecord {
    /// UTC hour-of-day (0-23). Bucketing compares only this.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// Decode bytes using the configured text encoding.
///
/// `ascii` keeps the low seven bits of every byte and `latin1` maps each byte
/// to the code point of the same value; neither can fail.
pub fn decode_text(bytes: Vec<u8>, encoding: TextEncoding) -> Option<String> {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8(bytes).ok(),
        TextEncoding::Ascii => Some(bytes.into_iter().map(|b| char::from(b & 0x7F)).collect()),
        TextEncoding::Latin1 => Some(bytes.into_iter().map(char::from).collect()),
    }
}

/// Parses logical records according to the archive settings
#[derive(Debug, Clone)]
pub struct RecordDecoder {
    encoding: TextEncoding,
    timestamp_field: String,
    timestamp_unit: TimestampUnit,
}

impl RecordDecoder {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            encoding: config.text_encoding,
            timestamp_field: config.timestamp_field.clone(),
            timestamp_unit: config.timestamp_unit,
        }
    }

    pub fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Decode and parse one logical record. `index` is its position in the
    /// decoded sequence and only feeds error messages.
    pub fn decode(&self, index: usize, bytes: Vec<u8>) -> Result<DecodedRecord> {
        let text = decode_text(bytes, self.encoding).ok_or(ArchiveError::TextEncoding {
            index,
            encoding: self.encoding,
        })?;
        let value: Value =
            serde_json::from_str(&text).map_err(|source| ArchiveError::Json { index, source })?;
        let timestamp = self.timestamp_of(index, &value)?;
        Ok(DecodedRecord { value, timestamp })
    }

    fn timestamp_of(&self, index: usize, value: &Value) -> Result<DateTime<Utc>> {
        let raw = value.get(&self.timestamp_field).filter(|v| v.is_number());
        let Some(raw) = raw else {
            return Err(ArchiveError::MissingTimestamp {
                index,
                field: self.timestamp_field.clone(),
            });
        };

        let invalid = || ArchiveError::InvalidTimestamp {
            index,
            value: raw.to_string(),
        };

        let parsed = match self.timestamp_unit {
            TimestampUnit::Seconds => match raw.as_i64() {
                Some(secs) => DateTime::from_timestamp(secs, 0),
                None => {
                    let secs = raw.as_f64().ok_or_else(invalid)?;
                    float_to_i64(secs.floor()).and_then(|s| DateTime::from_timestamp(s, 0))
                }
            },
            TimestampUnit::Milliseconds => match raw.as_i64() {
                Some(millis) => DateTime::from_timestamp_millis(millis),
                None => {
                    let millis = raw.as_f64().ok_or_else(invalid)?;
                    float_to_i64(millis.floor()).and_then(DateTime::from_timestamp_millis)
                }
            },
        };

        parsed.ok_or_else(invalid)
    }
}

fn float_to_i64(value: f64) -> Option<i64> {
    if value.is_finite() && value >= i64::MIN as f64 && value <= i64::MAX as f64 {
        Some(value as i64)
    } else {
        None
    }
}
