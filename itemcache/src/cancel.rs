use alloc::sync::Arc;
use core::sync::atomic::{AtomicBool, Ordering};

/// Cooperative cancellation flag shared between the cache and a running fetch.
///
/// The cache cancels the token of a request once a range update makes it useless. Fetch
/// implementations should check [`CancelToken::is_cancelled`] and stop early; results delivered
/// after cancellation are discarded anyway.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}
