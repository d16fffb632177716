use super::{FsConfig, LogFormat, RuntimeConfig, StorageBackend};
use anyhow::{anyhow, Context, Result};

pub const ENV_PREFIX: &str = "KINESIS2S3_";

/// Abstraction over environment-variable lookups so tests can supply their
/// own source of overrides.
pub trait EnvSource {
    fn get(&self, key: &str) -> Option<String>;

    /// Get an environment variable WITHOUT the KINESIS2S3_ prefix.
    /// Used for AWS standard variables and the names older deployments set.
    fn get_raw(&self, key: &str) -> Option<String>;
}

/// Apply environment-variable overrides (highest priority) to the runtime config.
///
/// Prefixed names win over the unprefixed legacy names.
pub fn apply_env_overrides<E: EnvSource>(config: &mut RuntimeConfig, env: &E) -> Result<()> {
    // Storage
    if let Some(backend) = get_env_string(env, "STORAGE_BACKEND") {
        config.storage.backend = backend
            .parse::<StorageBackend>()
            .context("Invalid KINESIS2S3_STORAGE_BACKEND value")?;
    }
    if let Some(path) = get_env_or_legacy(env, "BUCKET_PATH", "TARGET_BUCKET") {
        config.storage.bucket_path = path;
    }
    if let Some(key_base) = get_env_or_legacy(env, "KEY_BASE", "TARGET_KEY") {
        config.storage.key_base = key_base;
    }
    if let Some(path) = get_env_string(env, "STORAGE_PATH") {
        config.storage.fs.get_or_insert_with(FsConfig::default).path = path;
    }
    if let Some(region) = get_env_or_legacy(env, "REGION", "AWS_REGION") {
        config.storage.s3.region = region;
    }
    if let Some(endpoint) = get_env_or_legacy(env, "S3_ENDPOINT", "AWS_ENDPOINT_URL") {
        config.storage.s3.endpoint = Some(endpoint);
    }

    // Record decoding
    if let Some(field) = get_env_or_legacy(env, "TIMESTAMP_FIELD", "TSTAMP_FIELD") {
        config.archive.timestamp_field = field;
    }
    if let Some(unit) = get_env_string(env, "TIMESTAMP_UNIT") {
        config.archive.timestamp_unit = unit
            .parse()
            .context("Invalid KINESIS2S3_TIMESTAMP_UNIT value")?;
    }
    if let Some(encoding) = get_env_string(env, "TEXT_ENCODING") {
        config.archive.text_encoding = encoding
            .parse()
            .context("Invalid KINESIS2S3_TEXT_ENCODING value")?;
    }
    if let Some(algorithm) = get_env_string(env, "HASH_ALGORITHM") {
        config.archive.hash_algorithm = algorithm
            .parse()
            .context("Invalid KINESIS2S3_HASH_ALGORITHM value")?;
    }
    if let Some(val) = get_env_bool(env, "DEAGGREGATE", None)? {
        config.archive.deaggregate = val;
    }

    // Trigger files
    if let Some(val) = get_env_bool(env, "TRIGGER_ENABLED", Some("WRITE_TRIGGER_FILE"))? {
        config.trigger.enabled = val;
    }
    if let Some(name) = get_env_or_legacy(env, "TRIGGER_NAME", "TRIGGER_FILE_NAME") {
        config.trigger.name = name;
    }

    // Logging
    if let Some(val) = get_env_bool(env, "DEBUG", Some("DEBUG"))? {
        config.logging.debug = val;
    }
    if let Some(level) = get_env_string(env, "LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = get_env_string(env, "LOG_FORMAT") {
        config.logging.format = match format.to_lowercase().as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Text,
        };
    }

    Ok(())
}

fn get_env_string<E: EnvSource>(env: &E, key: &str) -> Option<String> {
    env.get(key).filter(|v| !v.is_empty())
}

fn get_env_or_legacy<E: EnvSource>(env: &E, key: &str, legacy: &str) -> Option<String> {
    get_env_string(env, key).or_else(|| env.get_raw(legacy).filter(|v| !v.is_empty()))
}

fn get_env_bool<E: EnvSource>(env: &E, key: &str, legacy: Option<&str>) -> Result<Option<bool>> {
    let (name, value) = match get_env_string(env, key) {
        Some(val) => (format!("{}{}", ENV_PREFIX, key), val),
        None => match legacy.and_then(|l| env.get_raw(l).map(|v| (l.to_string(), v))) {
            Some((name, val)) if !val.is_empty() => (name, val),
            _ => return Ok(None),
        },
    };
    parse_bool(&value)
        .map(Some)
        .ok_or_else(|| anyhow!("Failed to parse {} (expected bool): {}", name, value))
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
