use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;

use crate::{CancelToken, FetchError, IndexRange};

/// Identifies one issued fetch. Completions carrying an outdated ticket are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FetchTicket(pub(crate) u64);

impl FetchTicket {
    pub fn get(self) -> u64 {
        self.0
    }
}

/// A batch the data source should deliver: `range.len()` items for `range.first()..`.
#[derive(Clone, Debug)]
pub struct FetchRequest {
    pub ticket: FetchTicket,
    pub range: IndexRange,
    pub cancel: CancelToken,
}

/// What a fetch produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchOutcome<T> {
    /// Items positionally mapped onto the requested range.
    Fetched(Vec<T>),
    /// The fetch observed its cancel token and stopped.
    Cancelled,
    /// The data source failed for a reason other than cancellation.
    Failed(String),
}

impl<T> FetchOutcome<T> {
    pub fn failed(reason: impl fmt::Display) -> Self {
        Self::Failed(reason.to_string())
    }
}

impl<T, E: fmt::Display> From<Result<Vec<T>, E>> for FetchOutcome<T> {
    fn from(result: Result<Vec<T>, E>) -> Self {
        match result {
            Ok(items) => Self::Fetched(items),
            Err(err) => Self::failed(err),
        }
    }
}

/// A cached item that changed value as a result of a fetch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ItemChange<T> {
    pub index: usize,
    /// `None` when the slot had not been fetched before.
    pub old: Option<T>,
    pub new: T,
}

/// Where the cache is in its fetch cycle.
#[derive(Clone, Debug)]
pub enum FetchPhase {
    Idle,
    /// A fetch decision is pending until `deadline_ms`.
    Scheduled { deadline_ms: u64 },
    Fetching(FetchRequest),
}

impl FetchPhase {
    pub fn kind(&self) -> FetchPhaseKind {
        match self {
            Self::Idle => FetchPhaseKind::Idle,
            Self::Scheduled { .. } => FetchPhaseKind::Scheduled,
            Self::Fetching(_) => FetchPhaseKind::Fetching,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FetchPhaseKind {
    Idle,
    Scheduled,
    Fetching,
}

/// Notifications published by [`crate::VirtualizedFeed`].
#[derive(Debug)]
pub enum FeedEvent<'a, T> {
    /// The item count was refreshed; consumers should re-read everything they display.
    Reset { count: usize },
    /// A single item was replaced at `change.index`.
    Replaced(&'a ItemChange<T>),
    /// A fetch failed; the range stays missing and is retried later.
    FetchFailed(&'a FetchError),
}
