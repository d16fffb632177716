// kinesis2s3 - archive Kinesis JSON records to hour-partitioned object storage
//
// The Lambda binaries live in `kinesis2s3-lambda`; this crate is the local
// replay tool used to run captured events against a bucket or directory.

pub mod replay;

pub use kinesis2s3_lambda::Handler;

pub use replay::{apply_overrides, load_event, parse_event, replay_event};
