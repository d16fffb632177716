//! Splitting a decoded record sequence into hour-homogeneous batches
//!
//! Buckets are compared by UTC hour-of-day only. Two adjacent records a whole
//! number of days apart land in the same batch; the batch is then filed under
//! the first record's date.

use crate::decode::DecodedRecord;

/// Inclusive index range `[start, end]` over the decoded sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    pub start: usize,
    pub end: usize,
}

impl BatchRange {
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    /// Always false: a range holds at least its start index.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn slice<'a, T>(&self, items: &'a [T]) -> &'a [T] {
        &items[self.start..=self.end]
    }
}

/// Partition `records` into contiguous runs sharing an hour-of-day.
///
/// Returns an empty vector for an empty sequence; otherwise the ranges are
/// non-empty, in order, and cover every index exactly once.
pub fn partition_by_hour(records: &[DecodedRecord]) -> Vec<BatchRange> {
    partition_by_key(records, DecodedRecord::hour)
}

fn partition_by_key<T, K: PartialEq>(items: &[T], key: impl Fn(&T) -> K) -> Vec<BatchRange> {
    let Some(first) = items.first() else {
        return Vec::new();
    };

    let mut batches = Vec::new();
    let mut current = key(first);
    let mut start = 0;

    for (index, item) in items.iter().enumerate().skip(1) {
        let k = key(item);
        if k != current {
            batches.push(BatchRange {
                start,
                end: index - 1,
            });
            current = k;
            start = index;
        }
    }

    batches.push(BatchRange {
        start,
        end: items.len() - 1,
    });
    batches
}
