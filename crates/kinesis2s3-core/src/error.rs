//! Error taxonomy for one archive invocation
//!
//! The unit of failure is the whole delivered event: any error below makes the
//! handler report failure so the stream redelivers the batch.

use kinesis2s3_config::TextEncoding;
use thiserror::Error;

/// Coarse classification used for logging and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The envelope itself is unusable; redelivery won't help.
    InputRejected,
    /// A payload could not be turned into a JSON record.
    DecodeFailure,
    /// The object store call failed; safe to redeliver.
    UpstreamWriteFailure,
}

#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Invalid Event Source: expected '{expected}', found '{found}'")]
    InvalidEventSource {
        expected: &'static str,
        found: String,
    },

    #[error("Unsupported Kinesis schema version: expected '{expected}', found '{found}'")]
    UnsupportedSchemaVersion {
        expected: &'static str,
        found: String,
    },

    #[error("record {index}: invalid base64 payload: {source}")]
    Base64 {
        index: usize,
        #[source]
        source: base64::DecodeError,
    },

    #[error("record {index}: deaggregation failed: {message}")]
    Deaggregation { index: usize, message: String },

    #[error("record {index}: payload is not valid {encoding}")]
    TextEncoding {
        index: usize,
        encoding: TextEncoding,
    },

    #[error("record {index}: invalid JSON document: {source}")]
    Json {
        index: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("record {index}: missing numeric timestamp field '{field}'")]
    MissingTimestamp { index: usize, field: String },

    #[error("record {index}: timestamp {value} is out of range")]
    InvalidTimestamp { index: usize, value: String },

    #[error("storage write to '{path}' failed: {message}")]
    Storage { path: String, message: String },
}

impl ArchiveError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidEventSource { .. } | Self::UnsupportedSchemaVersion { .. } => {
                ErrorKind::InputRejected
            }
            Self::Base64 { .. }
            | Self::Deaggregation { .. }
            | Self::TextEncoding { .. }
            | Self::Json { .. }
            | Self::MissingTimestamp { .. }
            | Self::InvalidTimestamp { .. } => ErrorKind::DecodeFailure,
            Self::Storage { .. } => ErrorKind::UpstreamWriteFailure,
        }
    }

    /// Error type string for logs
    pub fn error_type(&self) -> &'static str {
        match self {
            Self::InvalidEventSource { .. } => "InvalidEventSource",
            Self::UnsupportedSchemaVersion { .. } => "UnsupportedSchemaVersion",
            Self::Base64 { .. } => "InvalidBase64",
            Self::Deaggregation { .. } => "DeaggregationFailed",
            Self::TextEncoding { .. } => "InvalidTextEncoding",
            Self::Json { .. } => "InvalidJson",
            Self::MissingTimestamp { .. } => "MissingTimestamp",
            Self::InvalidTimestamp { .. } => "InvalidTimestamp",
            Self::Storage { .. } => "StorageFailed",
        }
    }

    /// Whether redelivering the same event can succeed.
    ///
    /// Writes are keyed by content hash, so a retried batch overwrites the
    /// same objects instead of duplicating them.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::UpstreamWriteFailure
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let err = ArchiveError::InvalidEventSource {
            expected: "aws:kinesis",
            found: "aws:sqs".into(),
        };
        assert_eq!(err.kind(), ErrorKind::InputRejected);
        assert!(!err.is_retryable());
        assert!(err.to_string().starts_with("Invalid Event Source"));

        let err = ArchiveError::MissingTimestamp {
            index: 3,
            field: "tstamp".into(),
        };
        assert_eq!(err.kind(), ErrorKind::DecodeFailure);
        assert!(!err.is_retryable());

        let err = ArchiveError::Storage {
            path: "a/b".into(),
            message: "timeout".into(),
        };
        assert_eq!(err.kind(), ErrorKind::UpstreamWriteFailure);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_error_types() {
        let err = ArchiveError::UnsupportedSchemaVersion {
            expected: "1.0",
            found: "2.0".into(),
        };
        assert_eq!(err.error_type(), "UnsupportedSchemaVersion");

        let err = ArchiveError::TextEncoding {
            index: 0,
            encoding: TextEncoding::Utf8,
        };
        assert_eq!(err.error_type(), "InvalidTextEncoding");
        assert!(err.to_string().contains("utf-8"));
    }
}
