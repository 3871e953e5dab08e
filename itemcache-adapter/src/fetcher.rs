use core::future::Future;
use core::pin::Pin;

use itemcache::{CancelToken, FetchOutcome, IndexRange};

/// The boxed future a [`Fetcher`] hands to the runtime.
pub type FetchFuture<T> = Pin<Box<dyn Future<Output = FetchOutcome<T>> + Send + 'static>>;

/// Loads items from the slow source.
///
/// The returned future must resolve to exactly `range.len()` items in index order, or to
/// [`FetchOutcome::Cancelled`] / [`FetchOutcome::Failed`]. Long-running fetchers should check
/// `cancel` periodically; the task is also aborted when the request is superseded.
pub trait Fetcher<T>: Send + Sync + 'static {
    fn fetch(&self, range: IndexRange, cancel: CancelToken) -> FetchFuture<T>;
}

impl<T, F, Fut> Fetcher<T> for F
where
    F: Fn(IndexRange, CancelToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = FetchOutcome<T>> + Send + 'static,
{
    fn fetch(&self, range: IndexRange, cancel: CancelToken) -> FetchFuture<T> {
        Box::pin(self(range, cancel))
    }
}
