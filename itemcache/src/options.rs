use alloc::sync::Arc;

use crate::ItemChange;

/// A callback fired for every item a fetch writes into the cache.
pub type ItemChangedCallback<T> = Arc<dyn Fn(&ItemChange<T>) + Send + Sync>;

/// Configuration for [`crate::IncrementalCache`].
///
/// Cheap to clone: the callback is stored in an `Arc`.
pub struct CacheOptions<T> {
    /// Maximum number of items requested by a single fetch. Larger missing ranges are fetched
    /// in successive batches.
    pub batch_size: usize,

    /// How long a fetch decision waits for range updates to settle. Every update inside the
    /// window pushes the deadline out again.
    pub debounce_ms: u64,

    /// Consecutive failed fetches that are retried automatically. Once exceeded, the cache stays
    /// idle until the next range update, `schedule_fetch` or `invalidate`.
    pub max_retries: u32,

    /// Delay before an automatic retry.
    pub retry_delay_ms: u64,

    pub on_item_changed: Option<ItemChangedCallback<T>>,
}

pub const DEFAULT_BATCH_SIZE: usize = 50;
pub const DEFAULT_DEBOUNCE_MS: u64 = 20;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_DELAY_MS: u64 = 250;

impl<T> CacheOptions<T> {
    pub fn new() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            on_item_changed: None,
        }
    }

    /// Sets the batch cap. Zero is clamped to one.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        if batch_size == 0 {
            cwarn!("CacheOptions: batch_size 0 clamped to 1");
        }
        self.batch_size = batch_size.max(1);
        self
    }

    pub fn with_debounce_ms(mut self, debounce_ms: u64) -> Self {
        self.debounce_ms = debounce_ms;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay_ms(mut self, retry_delay_ms: u64) -> Self {
        self.retry_delay_ms = retry_delay_ms;
        self
    }

    pub fn with_on_item_changed(
        mut self,
        on_item_changed: Option<impl Fn(&ItemChange<T>) + Send + Sync + 'static>,
    ) -> Self {
        self.on_item_changed = on_item_changed.map(|f| Arc::new(f) as _);
        self
    }

    pub(crate) fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }
}

impl<T> Default for CacheOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for CacheOptions<T> {
    fn clone(&self) -> Self {
        Self {
            batch_size: self.batch_size,
            debounce_ms: self.debounce_ms,
            max_retries: self.max_retries,
            retry_delay_ms: self.retry_delay_ms,
            on_item_changed: self.on_item_changed.clone(),
        }
    }
}

impl<T> core::fmt::Debug for CacheOptions<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CacheOptions")
            .field("batch_size", &self.batch_size)
            .field("debounce_ms", &self.debounce_ms)
            .field("max_retries", &self.max_retries)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .finish_non_exhaustive()
    }
}
