use alloc::sync::Arc;
use alloc::vec::Vec;

use crate::{
    CacheOptions, FeedEvent, FetchError, FetchOutcome, FetchRequest, FetchTicket,
    IncrementalCache, IndexRange,
};

/// Supplies the total number of items in the underlying data source.
pub type CountSource = Arc<dyn Fn() -> usize + Send + Sync>;

/// A callback receiving the feed's change notifications.
pub type FeedEventCallback<T> = Arc<dyn Fn(FeedEvent<'_, T>) + Send + Sync>;

/// The list-facing side of the cache.
///
/// A scrolling UI reads items by index, reports which ranges it wants retained, and re-reads
/// an index when it receives [`FeedEvent::Replaced`] for it. Reads of items that have not been
/// fetched yet return `None`; that is a normal transient state, not an error.
pub struct VirtualizedFeed<T> {
    cache: IncrementalCache<T>,
    count: usize,
    count_source: CountSource,
    visible: Option<IndexRange>,
    on_event: Option<FeedEventCallback<T>>,
}

impl<T> VirtualizedFeed<T> {
    /// Creates a feed and pulls the initial count from `count_source`.
    pub fn new(
        count_source: impl Fn() -> usize + Send + Sync + 'static,
        options: CacheOptions<T>,
    ) -> Self {
        let count_source: CountSource = Arc::new(count_source);
        let count = count_source();
        cdebug!(count, "VirtualizedFeed::new");
        Self {
            cache: IncrementalCache::new(options),
            count,
            count_source,
            visible: None,
            on_event: None,
        }
    }

    pub fn with_on_event(
        mut self,
        on_event: Option<impl Fn(FeedEvent<'_, T>) + Send + Sync + 'static>,
    ) -> Self {
        self.set_on_event(on_event);
        self
    }

    pub fn set_on_event(
        &mut self,
        on_event: Option<impl Fn(FeedEvent<'_, T>) + Send + Sync + 'static>,
    ) {
        self.on_event = on_event.map(|f| Arc::new(f) as _);
    }

    pub fn cache(&self) -> &IncrementalCache<T> {
        &self.cache
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// The visible range last reported through [`VirtualizedFeed::on_ranges_changed`].
    pub fn visible_range(&self) -> Option<IndexRange> {
        self.visible
    }

    /// Pulls the count again and publishes [`FeedEvent::Reset`].
    ///
    /// When the count shrank below the retained ranges, they are clipped to the new count before
    /// the event is published, so no fetch is issued for indices that no longer exist.
    pub fn refresh_count(&mut self, now_ms: u64) -> usize {
        let count = (self.count_source)();
        self.count = count;
        cdebug!(count, "VirtualizedFeed::refresh_count");

        let desired = self.cache.desired_ranges();
        if desired.iter().any(|r| r.end() > count) {
            let clipped = clip_to_count(desired.as_slice(), count);
            self.cache.update_ranges(&clipped, now_ms);
            self.visible = self.visible.and_then(|v| v.clamp_to_count(count));
        }

        self.emit(FeedEvent::Reset { count });
        count
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.cache.get(index)
    }

    /// Range-change signal from the hosting list.
    ///
    /// `tracked` is everything the list wants retained (the visible window plus any prefetch
    /// buffers); it is clipped to the current count and handed to the cache. `visible` is kept
    /// for reference only. Returns whether the retained ranges changed.
    pub fn on_ranges_changed(
        &mut self,
        visible: IndexRange,
        tracked: &[IndexRange],
        now_ms: u64,
    ) -> bool {
        self.visible = Some(visible);
        let clipped = clip_to_count(tracked, self.count);
        self.cache.update_ranges(&clipped, now_ms)
    }

    pub fn poll_fetch(&mut self, now_ms: u64) -> Option<FetchRequest> {
        self.cache.poll_fetch(now_ms)
    }

    /// Drops all fetched items in the retained ranges and fetches them again.
    pub fn reload(&mut self, now_ms: u64) {
        self.cache.invalidate(now_ms);
    }

    /// Re-arms the fetch decision, e.g. after automatic retries were exhausted.
    pub fn schedule_fetch(&mut self, now_ms: u64) {
        self.cache.schedule_fetch(now_ms);
    }

    fn emit(&self, event: FeedEvent<'_, T>) {
        if let Some(cb) = &self.on_event {
            cb(event);
        }
    }
}

fn clip_to_count(ranges: &[IndexRange], count: usize) -> Vec<IndexRange> {
    ranges
        .iter()
        .filter_map(|r| {
            let clipped = r.clamp_to_count(count);
            if clipped != Some(*r) {
                ctrace!(range = %r, count, "tracked range clipped to count");
            }
            clipped
        })
        .collect()
}

impl<T: Clone + PartialEq> VirtualizedFeed<T> {
    /// Applies a fetch result, publishing [`FeedEvent::Replaced`] per changed item and
    /// [`FeedEvent::FetchFailed`] on failure. Returns the next request to issue, if any.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: FetchOutcome<T>,
        now_ms: u64,
    ) -> Result<Option<FetchRequest>, FetchError> {
        let on_event = self.on_event.clone();
        let result = self
            .cache
            .complete_fetch_with(ticket, outcome, now_ms, |change| {
                if let Some(cb) = &on_event {
                    cb(FeedEvent::Replaced(change));
                }
            });
        if let Err(err) = &result {
            self.emit(FeedEvent::FetchFailed(err));
        }
        result
    }
}

impl<T: PartialEq> VirtualizedFeed<T> {
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.cache.index_of(value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.index_of(value).is_some()
    }
}

impl<T> core::fmt::Debug for VirtualizedFeed<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("VirtualizedFeed")
            .field("count", &self.count)
            .field("visible", &self.visible)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
