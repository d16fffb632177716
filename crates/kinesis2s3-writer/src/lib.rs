//! Archiving Kinesis events to object storage
//!
//! This crate wires the pure pieces of `kinesis2s3-core` to an object store:
//! the settle-all fan-outs over records and batches, the uploads themselves
//! and the hourly trigger files.

mod archive;
mod error;
mod expand;
mod storage;

pub use archive::{ArchiveOutcome, ArchiveSettings, Archiver};
pub use error::{ErrorCode, Result, WriterError};
pub use expand::expand_event;
pub use storage::{initialize_storage, ObjectStore};

// Re-export commonly used types for convenience
pub use kinesis2s3_core;
pub use opendal;
