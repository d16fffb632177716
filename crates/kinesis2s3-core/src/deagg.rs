//! Deaggregation of KPL (Kinesis Producer Library) aggregated records
//!
//! Aggregated layout:
//! `F3 89 9A C2` | protobuf `AggregatedRecord` | md5(protobuf) (16 bytes)
//!
//! Anything that doesn't carry the magic and a matching digest is an ordinary
//! record and passes through untouched.

use md5::{Digest, Md5};
use prost::Message;

/// KPL aggregated record magic prefix
pub const KPL_MAGIC: [u8; 4] = [0xF3, 0x89, 0x9A, 0xC2];

const DIGEST_LEN: usize = 16;

/// Expands one delivered payload into the logical records it carries.
pub trait Deaggregator: Send + Sync {
    fn deaggregate(&self, data: Vec<u8>) -> Result<Vec<Vec<u8>>, String>;
}

/// Treats every payload as a single record.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughDeaggregator;

impl Deaggregator for PassthroughDeaggregator {
    fn deaggregate(&self, data: Vec<u8>) -> Result<Vec<Vec<u8>>, String> {
        Ok(vec![data])
    }
}

/// Unpacks KPL aggregated records, passing everything else through.
#[derive(Debug, Clone, Copy, Default)]
pub struct KplDeaggregator;

impl Deaggregator for KplDeaggregator {
    fn deaggregate(&self, data: Vec<u8>) -> Result<Vec<Vec<u8>>, String> {
        if !is_aggregated(&data) {
            return Ok(vec![data]);
        }

        let body = &data[KPL_MAGIC.len()..data.len() - DIGEST_LEN];
        let aggregated = AggregatedRecord::decode(body)
            .map_err(|e| format!("invalid KPL aggregated record: {}", e))?;

        tracing::debug!(
            records = aggregated.records.len(),
            "Deaggregated KPL record"
        );

        Ok(aggregated.records.into_iter().map(|r| r.data).collect())
    }
}

fn is_aggregated(data: &[u8]) -> bool {
    if data.len() <= KPL_MAGIC.len() + DIGEST_LEN || !data.starts_with(&KPL_MAGIC) {
        return false;
    }
    let body_len = data.len() - KPL_MAGIC.len() - DIGEST_LEN;
    let (body, digest) = data[KPL_MAGIC.len()..].split_at(body_len);
    Md5::digest(body).as_slice() == digest
}

#[derive(Clone, PartialEq, Message)]
pub struct AggregatedRecord {
    #[prost(string, repeated, tag = "1")]
    pub partition_key_table: Vec<String>,
    #[prost(string, repeated, tag = "2")]
    pub explicit_hash_key_table: Vec<String>,
    #[prost(message, repeated, tag = "3")]
    pub records: Vec<Record>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Record {
    #[prost(uint64, required, tag = "1")]
    pub partition_key_index: u64,
    #[prost(uint64, optional, tag = "2")]
    pub explicit_hash_key_index: Option<u64>,
    #[prost(bytes = "vec", required, tag = "3")]
    pub data: Vec<u8>,
    #[prost(message, repeated, tag = "4")]
    pub tags: Vec<Tag>,
}

#[derive(Clone, PartialEq, Message)]
pub struct Tag {
    #[prost(string, required, tag = "1")]
    pub key: String,
    #[prost(string, optional, tag = "2")]
    pub value: Option<String>,
}

/// Pack `records` the way the KPL does.
pub fn aggregate(partition_key: &str, records: &[&[u8]]) -> Vec<u8> {
    let aggregated = AggregatedRecord {
        partition_key_table: vec![partition_key.to_string()],
        explicit_hash_key_table: Vec::new(),
        records: records
            .iter()
            .map(|data| Record {
                partition_key_index: 0,
                explicit_hash_key_index: None,
                data: data.to_vec(),
                tags: Vec::new(),
            })
            .collect(),
    };

    let body = aggregated.encode_to_vec();
    let mut out = Vec::with_capacity(KPL_MAGIC.len() + body.len() + DIGEST_LEN);
    out.extend_from_slice(&KPL_MAGIC);
    out.extend_from_slice(&body);
    out.extend_from_slice(Md5::digest(&body).as_slice());
    out
}
