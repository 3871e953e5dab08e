//! A headless incremental item cache for virtualized lists.
//!
//! For an async driver built on tokio, see the `itemcache-adapter` crate.
//!
//! This crate backs an arbitrarily large scrollable list with items fetched on demand from a
//! slow source: it retains only the ranges the list asks for, never refetches items that are
//! still in a retained range, debounces bursts of range updates into a single fetch decision,
//! fetches in capped batches and cancels requests that a newer update made useless.
//!
//! It is UI-agnostic and sans-IO. The hosting layer is expected to provide:
//! - the retained ranges (visible window plus prefetch buffers)
//! - a clock (`now_ms`)
//! - the actual fetching, answering each [`FetchRequest`] with a [`FetchOutcome`]
#![cfg_attr(not(feature = "std"), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

#[cfg(test)]
extern crate std;

#[macro_use]
mod macros;

mod cache;
mod cancel;
mod emitter;
mod error;
mod feed;
mod options;
mod range;
mod range_set;
mod state;
mod store;
mod types;


pub use cache::IncrementalCache;
pub use cancel::CancelToken;
pub use emitter::TrackedRanges;
pub use error::{FetchError, RangeError};
pub use feed::{CountSource, FeedEventCallback, VirtualizedFeed};
pub use options::{
    CacheOptions, DEFAULT_BATCH_SIZE, DEFAULT_DEBOUNCE_MS, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY_MS, ItemChangedCallback,
};
pub use range::{IndexRange, RangeDiff};
pub use range_set::RangeSet;
pub use state::CacheSnapshot;
pub use store::SparseItemStore;
pub use types::{
    FeedEvent, FetchOutcome, FetchPhase, FetchPhaseKind, FetchRequest, FetchTicket, ItemChange,
};
