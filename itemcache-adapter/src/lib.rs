//! Tokio adapter for the `itemcache` crate.
//!
//! `itemcache` is sans-IO: it computes what to fetch and when, but leaves the clock and the
//! fetching to its host. This crate is that host for tokio applications:
//!
//! - [`Fetcher`]: the async data source (any `Fn(IndexRange, CancelToken) -> impl Future`)
//! - [`FeedController`]: owns a `VirtualizedFeed`, sleeps until debounce deadlines, spawns fetch
//!   tasks and aborts the ones a newer range update made useless
//! - [`FeedCommand`]: messages for running the controller as its own task
//!
//! The controller holds no UI objects; list adapters feed it range changes and read items back
//! through `get`.
#![forbid(unsafe_code)]

#[macro_use]
mod macros;

mod controller;
mod fetcher;


pub use controller::{FeedCommand, FeedController};
pub use fetcher::{FetchFuture, Fetcher};
