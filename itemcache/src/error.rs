use alloc::string::String;

use crate::IndexRange;

/// A range that cannot be represented as an [`IndexRange`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("index range must cover at least one item")]
    Empty,
    #[error("index range end {last} precedes its start {first}")]
    Inverted { first: usize, last: usize },
    #[error("index range starting at {first} with length {len} overflows usize")]
    Overflow { first: usize, len: usize },
}

/// A fetch that completed without delivering the requested items.
///
/// The affected indices stay in the missing set and are retried according to the cache's
/// retry policy (see [`crate::CacheOptions::max_retries`]).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("fetch for {range} failed: {reason}")]
    Source { range: IndexRange, reason: String },
    #[error("fetch for {range} returned {returned} of {expected} items")]
    ShortBatch {
        range: IndexRange,
        expected: usize,
        returned: usize,
    },
}

impl FetchError {
    pub fn range(&self) -> IndexRange {
        match self {
            Self::Source { range, .. } | Self::ShortBatch { range, .. } => *range,
        }
    }
}
