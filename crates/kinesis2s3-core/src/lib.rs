//! Core logic for archiving Kinesis records
//!
//! Everything in this crate is pure: no async, no I/O. It turns a delivered
//! Kinesis event into hour-homogeneous batches of JSON records, renders each
//! batch as JSON Lines and computes the storage location it belongs at.
//! Uploading lives in `kinesis2s3-writer`.

pub mod codec;
pub mod deagg;
pub mod decode;
pub mod error;
pub mod event;
pub mod partition;
pub mod paths;

pub use codec::{content_hash, serialize_batch, SerializedBatch};
pub use deagg::{Deaggregator, KplDeaggregator, PassthroughDeaggregator};
pub use decode::{decode_text, DecodedRecord, RecordDecoder};
pub use error::{ArchiveError, ErrorKind, Result};
pub use event::{KinesisData, KinesisEvent, KinesisEventRecord, SCHEMA_VERSION, SOURCE_TAG};
pub use partition::{partition_by_hour, BatchRange};
pub use paths::{
    batch_location, hour_path, object_name, trigger_path, BucketPath, ObjectLocation,
};

pub use kinesis2s3_config::{HashAlgorithm, TextEncoding, TimestampUnit};
