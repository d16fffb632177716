// kinesis2s3-config - Unified configuration for the Kinesis handlers
//
// Supports configuration from multiple sources:
// 1. Environment variables (highest priority)
// 2. Config file path from KINESIS2S3_CONFIG env var
// 3. Config file contents from KINESIS2S3_CONFIG_CONTENT env var
// 4. Default config file locations (./config.toml, ./.kinesis2s3.toml)
// 5. Built-in defaults (lowest priority)

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod env_overrides;
mod sources;
mod validation;

pub use env_overrides::{apply_env_overrides, EnvSource, ENV_PREFIX};
pub use sources::{load_from_file_path, StdEnvSource};

/// Main runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub archive: ArchiveConfig,

    #[serde(default)]
    pub trigger: TriggerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// A configured `<bucket>[/<prefix>]` target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketPath {
    pub bucket: String,
    /// Key prefix inside the bucket, without leading or trailing `/`
    pub prefix: String,
}

impl BucketPath {
    /// Split on the first `/` after trimming outer slashes.
    pub fn parse(path: &str) -> Self {
        let trimmed = path.trim_matches('/');
        match trimmed.split_once('/') {
            Some((bucket, prefix)) => Self {
                bucket: bucket.to_string(),
                prefix: prefix.trim_matches('/').to_string(),
            },
            None => Self {
                bucket: trimmed.to_string(),
                prefix: String::new(),
            },
        }
    }
}

/// Where archived batches land
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// `<bucket>[/<prefix>]`; the first segment names the bucket.
    #[serde(default)]
    pub bucket_path: String,

    /// Prepended to every object name.
    #[serde(default)]
    pub key_base: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<FsConfig>,

    #[serde(default)]
    pub s3: S3Config,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            bucket_path: String::new(),
            key_base: String::new(),
            fs: None,
            s3: S3Config::default(),
        }
    }
}

impl StorageConfig {
    /// `bucket_path` split into bucket and in-bucket prefix
    pub fn target(&self) -> BucketPath {
        BucketPath::parse(&self.bucket_path)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Fs,
    #[default]
    S3,
    Memory,
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Fs => write!(f, "fs"),
            StorageBackend::S3 => write!(f, "s3"),
            StorageBackend::Memory => write!(f, "memory"),
        }
    }
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "fs" | "filesystem" => Ok(StorageBackend::Fs),
            "s3" | "aws" => Ok(StorageBackend::S3),
            "memory" | "mem" => Ok(StorageBackend::Memory),
            _ => anyhow::bail!("Unsupported storage backend: {}. Supported: fs, s3, memory", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsConfig {
    pub path: String,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            path: "./data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint: None,
        }
    }
}

/// How incoming records are decoded and keyed
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_timestamp_field")]
    pub timestamp_field: String,
    #[serde(default)]
    pub timestamp_unit: TimestampUnit,
    #[serde(default)]
    pub text_encoding: TextEncoding,
    #[serde(default)]
    pub hash_algorithm: HashAlgorithm,
    #[serde(default = "default_true")]
    pub deaggregate: bool,
}

fn default_timestamp_field() -> String {
    "tstamp".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            timestamp_field: default_timestamp_field(),
            timestamp_unit: TimestampUnit::default(),
            text_encoding: TextEncoding::default(),
            hash_algorithm: HashAlgorithm::default(),
            deaggregate: true,
        }
    }
}

/// Completion sentinel written for the previous hour
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriggerConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_trigger_name")]
    pub name: String,
}

fn default_trigger_name() -> String {
    "complete.trigger".to_string()
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            name: default_trigger_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub debug: bool,
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            debug: false,
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

impl LoggingConfig {
    /// Filter directive to hand to the subscriber. The debug flag wins.
    pub fn effective_level(&self) -> &str {
        if self.debug {
            "debug"
        } else {
            &self.level
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimestampUnit {
    #[default]
    Seconds,
    Milliseconds,
}

impl FromStr for TimestampUnit {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "s" | "sec" | "secs" | "seconds" => Ok(TimestampUnit::Seconds),
            "ms" | "millis" | "milliseconds" => Ok(TimestampUnit::Milliseconds),
            _ => anyhow::bail!("Unsupported timestamp unit: {}. Supported: seconds, milliseconds", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    #[serde(rename = "ascii")]
    Ascii,
    #[serde(rename = "latin1", alias = "binary")]
    Latin1,
}

impl fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextEncoding::Utf8 => write!(f, "utf-8"),
            TextEncoding::Ascii => write!(f, "ascii"),
            TextEncoding::Latin1 => write!(f, "latin1"),
        }
    }
}

impl FromStr for TextEncoding {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(TextEncoding::Utf8),
            "ascii" => Ok(TextEncoding::Ascii),
            "latin1" | "binary" | "iso-8859-1" => Ok(TextEncoding::Latin1),
            _ => anyhow::bail!("Unsupported text encoding: {}. Supported: utf-8, ascii, latin1", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Md5,
    Blake3,
}

impl FromStr for HashAlgorithm {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Ok(HashAlgorithm::Md5),
            "blake3" => Ok(HashAlgorithm::Blake3),
            _ => anyhow::bail!("Unsupported hash algorithm: {}. Supported: md5, blake3", s),
        }
    }
}

impl RuntimeConfig {
    /// Load configuration from all sources with priority
    pub fn load() -> Result<Self> {
        sources::load_config()
    }

    /// Load configuration starting from an explicit file (CLI `--config`)
    pub fn load_from_path(path: impl AsRef<std::path::Path>) -> Result<Self> {
        sources::load_from_file_path(path)
    }

    /// Load file and environment layers, leaving validation to the caller
    pub fn load_unvalidated(path: Option<&std::path::Path>) -> Result<Self> {
        sources::load_unvalidated(path)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_backend_from_str() {
        assert_eq!("fs".parse::<StorageBackend>().unwrap(), StorageBackend::Fs);
        assert_eq!("S3".parse::<StorageBackend>().unwrap(), StorageBackend::S3);
        assert_eq!(
            "memory".parse::<StorageBackend>().unwrap(),
            StorageBackend::Memory
        );
        assert!("gcs".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.storage.backend, StorageBackend::S3);
        assert_eq!(config.archive.timestamp_field, "tstamp");
        assert_eq!(config.archive.timestamp_unit, TimestampUnit::Seconds);
        assert_eq!(config.archive.text_encoding, TextEncoding::Utf8);
        assert_eq!(config.archive.hash_algorithm, HashAlgorithm::Md5);
        assert!(config.archive.deaggregate);
        assert!(!config.trigger.enabled);
        assert_eq!(config.trigger.name, "complete.trigger");
        assert_eq!(config.logging.effective_level(), "info");
    }

    #[test]
    fn test_debug_flag_overrides_level() {
        let logging = LoggingConfig {
            debug: true,
            level: "warn".to_string(),
            format: LogFormat::Text,
        };
        assert_eq!(logging.effective_level(), "debug");
    }

    #[test]
    fn test_parse_toml() {
        let config: RuntimeConfig = toml::from_str(
            r#"
            [storage]
            backend = "fs"
            bucket_path = "archive-bucket/raw"
            key_base = "wins-"

            [storage.fs]
            path = "/tmp/kinesis2s3"

            [archive]
            timestamp_field = "ts"
            timestamp_unit = "milliseconds"
            text_encoding = "ascii"
            hash_algorithm = "blake3"

            [trigger]
            enabled = true
            "#,
        )
        .unwrap();

        assert_eq!(config.storage.backend, StorageBackend::Fs);
        assert_eq!(config.storage.bucket_path, "archive-bucket/raw");
        assert_eq!(config.storage.fs.unwrap().path, "/tmp/kinesis2s3");
        assert_eq!(config.archive.timestamp_unit, TimestampUnit::Milliseconds);
        assert_eq!(config.archive.text_encoding, TextEncoding::Ascii);
        assert_eq!(config.archive.hash_algorithm, HashAlgorithm::Blake3);
        assert!(config.trigger.enabled);
        assert_eq!(config.trigger.name, "complete.trigger");
        assert_eq!(config.storage.s3.region, "us-east-1");
    }
}
