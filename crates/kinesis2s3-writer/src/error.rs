//! Error types for the storage side of the archiver

use kinesis2s3_core::ArchiveError;
use thiserror::Error;

/// Error codes for programmatic handling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// E001: Storage configuration missing or invalid
    E001InvalidConfig,
    /// E002: Object write failed
    E002WriteFailure,
    /// E003: Object existence check failed
    E003StatFailure,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::E001InvalidConfig => "E001",
            Self::E002WriteFailure => "E002",
            Self::E003StatFailure => "E003",
        }
    }
}

/// Errors that can occur while talking to the object store
#[derive(Debug, Error)]
pub enum WriterError {
    /// Invalid configuration provided
    #[error("[{code}] Invalid storage configuration: {message}")]
    InvalidConfig { code: &'static str, message: String },

    /// Write operation failed
    #[error("[{code}] Write to '{path}' failed: {message}")]
    WriteFailure {
        code: &'static str,
        path: String,
        message: String,
    },

    /// Stat operation failed for a reason other than the object being absent
    #[error("[{code}] Existence check for '{path}' failed: {message}")]
    StatFailure {
        code: &'static str,
        path: String,
        message: String,
    },
}

impl WriterError {
    /// Create an invalid config error with error code
    pub fn invalid_config(message: String) -> Self {
        Self::InvalidConfig {
            code: ErrorCode::E001InvalidConfig.as_str(),
            message,
        }
    }

    /// Create a write failure error with error code
    pub fn write_failure(path: &str, message: String) -> Self {
        Self::WriteFailure {
            code: ErrorCode::E002WriteFailure.as_str(),
            path: path.to_string(),
            message,
        }
    }

    /// Create a stat failure error with error code
    pub fn stat_failure(path: &str, message: String) -> Self {
        Self::StatFailure {
            code: ErrorCode::E003StatFailure.as_str(),
            path: path.to_string(),
            message,
        }
    }
}

impl From<WriterError> for ArchiveError {
    fn from(err: WriterError) -> Self {
        let path = match &err {
            WriterError::WriteFailure { path, .. } | WriterError::StatFailure { path, .. } => {
                path.clone()
            }
            WriterError::InvalidConfig { .. } => String::new(),
        };
        ArchiveError::Storage {
            path,
            message: err.to_string(),
        }
    }
}

/// Result type alias for WriterError
pub type Result<T> = std::result::Result<T, WriterError>;
