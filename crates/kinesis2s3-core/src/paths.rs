//! Storage location layout
//!
//! `<prefix>/YYYY/MM/DD/HH/<key_base>YYYY-MM-DD-HH-mm-ss-<hash>`
//!
//! All components come from the first record of a batch, in UTC.

use chrono::{DateTime, Duration, Utc};
use std::fmt;

pub use kinesis2s3_config::BucketPath;

/// An object's directory (bucket-relative) and name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLocation {
    pub dir: String,
    pub name: String,
}

impl ObjectLocation {
    pub fn path(&self) -> String {
        format!("{}/{}", self.dir, self.name)
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.dir, self.name)
    }
}

/// Hour directory for `timestamp` under `prefix`.
pub fn hour_path(prefix: &str, timestamp: &DateTime<Utc>) -> String {
    let hour = timestamp.format("%Y/%m/%d/%H");
    if prefix.is_empty() {
        hour.to_string()
    } else {
        format!("{}/{}", prefix, hour)
    }
}

/// Object name for a batch whose first record has `timestamp`.
pub fn object_name(key_base: &str, timestamp: &DateTime<Utc>, hash: &str) -> String {
    format!(
        "{}{}-{}",
        key_base,
        timestamp.format("%Y-%m-%d-%H-%M-%S"),
        hash
    )
}

/// Where a batch starting at `timestamp` with content `hash` is stored.
pub fn batch_location(
    prefix: &str,
    key_base: &str,
    timestamp: &DateTime<Utc>,
    hash: &str,
) -> ObjectLocation {
    ObjectLocation {
        dir: hour_path(prefix, timestamp),
        name: object_name(key_base, timestamp, hash),
    }
}

/// Sentinel location for the hour before `timestamp`, or `None` when that
/// hour is before the earliest representable instant.
pub fn trigger_path(
    prefix: &str,
    timestamp: &DateTime<Utc>,
    name: &str,
) -> Option<ObjectLocation> {
    let previous = timestamp.checked_sub_signed(Duration::hours(1))?;
    Some(ObjectLocation {
        dir: hour_path(prefix, &previous),
        name: name.to_string(),
    })
}
