// JSON Lines rendering and content hashing for archived batches
//
// The body is hashed exactly as uploaded, so identical batches always map to
// identical object names and a redelivered event overwrites instead of
// duplicating.

use crate::decode::DecodedRecord;
use kinesis2s3_config::HashAlgorithm;
use md5::{Digest, Md5};

/// A batch body ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerializedBatch {
    pub body: Vec<u8>,
    /// Lowercase hex digest of `body`
    pub hash: String,
    pub record_count: usize,
}

/// Render `records` as JSON Lines (one document per line, `\n` after each)
/// and hash the result.
pub fn serialize_batch(records: &[DecodedRecord], algorithm: HashAlgorithm) -> SerializedBatch {
    let mut body = Vec::new();
    for record in records {
        // Value's Display is the compact serde_json rendering
        body.extend_from_slice(record.value.to_string().as_bytes());
        body.push(b'\n');
    }

    let hash = content_hash(&body, algorithm);
    SerializedBatch {
        body,
        hash,
        record_count: records.len(),
    }
}

pub fn content_hash(bytes: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Md5 => hex::encode(Md5::digest(bytes)),
        HashAlgorithm::Blake3 => blake3::hash(bytes).to_hex().to_string(),
    }
}
