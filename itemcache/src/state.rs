use alloc::vec::Vec;

use crate::{FetchPhaseKind, IndexRange};

/// A lightweight, serializable snapshot of the cache bookkeeping (no item data).
///
/// With `feature = "serde"`, this type implements `Serialize`/`Deserialize`. Useful for
/// diagnostics overlays and for asserting cache state in tests.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CacheSnapshot {
    pub desired: Vec<IndexRange>,
    pub cached: Vec<IndexRange>,
    pub missing: Vec<IndexRange>,
    pub in_flight: Option<IndexRange>,
    pub phase: FetchPhaseKind,
    pub deadline_ms: Option<u64>,
    pub stored_items: usize,
    pub consecutive_failures: u32,
}
