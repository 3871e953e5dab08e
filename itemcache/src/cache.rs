use alloc::vec::Vec;

use crate::{
    CacheOptions, CacheSnapshot, CancelToken, FetchError, FetchOutcome, FetchPhase, FetchRequest,
    FetchTicket, IndexRange, ItemChange, RangeSet, SparseItemStore,
};

/// An incremental, range-driven item cache.
///
/// The cache retains items for a set of *desired* ranges (typically the visible window plus a
/// prefetch buffer), tracks which of those indices are already *cached* and which are *missing*,
/// and hands out fetch requests for the missing ones in capped batches.
///
/// This type is sans-IO and UI-agnostic:
/// - Time is supplied by the caller as `now_ms`; the debounce timer is a deadline the caller
///   honors by calling [`IncrementalCache::poll_fetch`] once it has passed.
/// - Fetching is performed by the caller: each [`FetchRequest`] is answered with
///   [`IncrementalCache::complete_fetch`], which also returns the next request to issue.
///
/// All methods take `&self`/`&mut self` on a single owner; no internal locking is used. For a
/// tokio-driven owner see the `itemcache-adapter` crate.
pub struct IncrementalCache<T> {
    options: CacheOptions<T>,
    store: SparseItemStore<T>,
    desired: RangeSet,
    cached: RangeSet,
    missing: RangeSet,
    phase: FetchPhase,
    next_ticket: u64,
    last_error: Option<FetchError>,
    consecutive_failures: u32,
}

impl<T> IncrementalCache<T> {
    pub fn new(options: CacheOptions<T>) -> Self {
        cdebug!(
            batch_size = options.batch_size,
            debounce_ms = options.debounce_ms,
            "IncrementalCache::new"
        );
        Self {
            options,
            store: SparseItemStore::new(),
            desired: RangeSet::new(),
            cached: RangeSet::new(),
            missing: RangeSet::new(),
            phase: FetchPhase::Idle,
            next_ticket: 0,
            last_error: None,
            consecutive_failures: 0,
        }
    }

    pub fn options(&self) -> &CacheOptions<T> {
        &self.options
    }

    pub fn set_on_item_changed(
        &mut self,
        on_item_changed: Option<impl Fn(&ItemChange<T>) + Send + Sync + 'static>,
    ) {
        self.options.on_item_changed = on_item_changed.map(|f| alloc::sync::Arc::new(f) as _);
    }

    pub fn desired_ranges(&self) -> &RangeSet {
        &self.desired
    }

    pub fn cached_ranges(&self) -> &RangeSet {
        &self.cached
    }

    pub fn missing_ranges(&self) -> &RangeSet {
        &self.missing
    }

    pub fn store(&self) -> &SparseItemStore<T> {
        &self.store
    }

    pub fn phase(&self) -> &FetchPhase {
        &self.phase
    }

    pub fn in_flight(&self) -> Option<&FetchRequest> {
        match &self.phase {
            FetchPhase::Fetching(request) => Some(request),
            _ => None,
        }
    }

    /// When the pending fetch decision is due, if one is scheduled.
    pub fn deadline_ms(&self) -> Option<u64> {
        match self.phase {
            FetchPhase::Scheduled { deadline_ms } => Some(deadline_ms),
            _ => None,
        }
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.phase, FetchPhase::Idle)
    }

    pub fn last_error(&self) -> Option<&FetchError> {
        self.last_error.as_ref()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.store.get(index)
    }

    /// Stores `value` directly, bypassing the fetch path, and marks `index` as cached.
    ///
    /// Only indices inside the desired ranges are retained; a write anywhere else is dropped
    /// and returns `None`.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        if !self.desired.contains(index) {
            ctrace!(index, "IncrementalCache::set outside the desired ranges ignored");
            return None;
        }
        let old = self.store.set(index, value);
        let range = IndexRange::single(index);
        self.cached.add(range);
        self.missing.subtract(range);
        old
    }

    /// Replaces the set of ranges the cache should retain.
    ///
    /// Items outside the new ranges are dropped; items inside them survive without being
    /// fetched again. Returns `false` (and does nothing) when the normalized ranges equal the
    /// current ones, which is the common case for per-frame scroll notifications.
    pub fn update_ranges(&mut self, ranges: &[IndexRange], now_ms: u64) -> bool {
        let ranges = RangeSet::normalize(ranges);
        if self.desired.same_as(&ranges) {
            return false;
        }

        self.store.repartition(&ranges);
        self.desired = RangeSet::from_ranges(&ranges);
        self.consecutive_failures = 0;
        self.cached = self.cached.intersection(&self.desired);

        let mut missing = self.desired.clone();
        for range in self.cached.iter() {
            missing.subtract(range);
        }
        self.missing = missing;

        ctrace!(
            desired = self.desired.len(),
            cached_items = self.cached.item_count(),
            missing_items = self.missing.item_count(),
            "IncrementalCache::update_ranges"
        );

        self.schedule_fetch(now_ms);
        true
    }

    /// Debounced fetch trigger.
    ///
    /// An in-flight request that still covers missing items keeps running. Otherwise the
    /// in-flight request (if any) is cancelled and the fetch decision is (re)scheduled for
    /// `now_ms + debounce_ms`.
    pub fn schedule_fetch(&mut self, now_ms: u64) {
        if let Some(request) = self.in_flight() {
            if self.missing.intersects(&request.range) {
                ctrace!(range = %request.range, "schedule_fetch: in-flight request still useful");
                return;
            }
        }
        self.cancel_in_flight();
        let deadline_ms = now_ms.saturating_add(self.options.debounce_ms);
        self.phase = FetchPhase::Scheduled { deadline_ms };
    }

    /// Runs the scheduled fetch decision once its deadline has passed.
    pub fn poll_fetch(&mut self, now_ms: u64) -> Option<FetchRequest> {
        match self.phase {
            FetchPhase::Scheduled { deadline_ms } if now_ms >= deadline_ms => self.run_fetch(),
            _ => None,
        }
    }

    /// Issues a request for the first missing batch, if any.
    ///
    /// Returns `None` when nothing is missing (the cache goes idle) or when a still-useful
    /// request is already in flight.
    pub fn run_fetch(&mut self) -> Option<FetchRequest> {
        if let Some(request) = self.in_flight() {
            if self.missing.intersects(&request.range) {
                return None;
            }
        }
        self.cancel_in_flight();

        let Some(range) = self.first_missing_batch(self.options.effective_batch_size()) else {
            self.phase = FetchPhase::Idle;
            return None;
        };

        self.next_ticket += 1;
        let request = FetchRequest {
            ticket: FetchTicket(self.next_ticket),
            range,
            cancel: CancelToken::new(),
        };
        ctrace!(range = %range, ticket = self.next_ticket, "run_fetch");
        self.phase = FetchPhase::Fetching(request.clone());
        Some(request)
    }

    /// The first missing range, capped to `max_len` items.
    pub fn first_missing_batch(&self, max_len: usize) -> Option<IndexRange> {
        self.missing.first().map(|range| range.truncate(max_len))
    }

    fn cancel_in_flight(&mut self) {
        if let FetchPhase::Fetching(request) = &self.phase {
            cdebug!(range = %request.range, "cancelling superseded fetch");
            request.cancel.cancel();
            self.phase = FetchPhase::Idle;
        }
    }

    fn take_in_flight(&mut self, ticket: FetchTicket) -> Option<FetchRequest> {
        if !matches!(&self.phase, FetchPhase::Fetching(r) if r.ticket == ticket) {
            return None;
        }
        match core::mem::replace(&mut self.phase, FetchPhase::Idle) {
            FetchPhase::Fetching(request) => Some(request),
            _ => None,
        }
    }

    fn record_failure(&mut self, error: FetchError, now_ms: u64) -> FetchError {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        cwarn!(
            error = %error,
            failures = self.consecutive_failures,
            "fetch failed"
        );
        if self.consecutive_failures <= self.options.max_retries && !self.missing.is_empty() {
            self.phase = FetchPhase::Scheduled {
                deadline_ms: now_ms.saturating_add(self.options.retry_delay_ms),
            };
        } else {
            self.phase = FetchPhase::Idle;
        }
        self.last_error = Some(error.clone());
        error
    }

    /// Drops every fetched item inside the desired ranges and fetches them again.
    pub fn invalidate(&mut self, now_ms: u64) {
        self.cancel_in_flight();
        for range in self.cached.iter() {
            for index in range.indices() {
                self.store.take(index);
            }
        }
        self.cached.clear();
        self.missing = self.desired.clone();
        self.consecutive_failures = 0;
        self.last_error = None;
        self.schedule_fetch(now_ms);
    }

    pub fn snapshot(&self) -> CacheSnapshot {
        CacheSnapshot {
            desired: self.desired.as_slice().to_vec(),
            cached: self.cached.as_slice().to_vec(),
            missing: self.missing.as_slice().to_vec(),
            in_flight: self.in_flight().map(|r| r.range),
            phase: self.phase.kind(),
            deadline_ms: self.deadline_ms(),
            stored_items: self.store.item_count(),
            consecutive_failures: self.consecutive_failures,
        }
    }
}

impl<T: Clone + PartialEq> IncrementalCache<T> {
    /// Applies the result of the request identified by `ticket`.
    ///
    /// On success, returns the next request to issue (the cache keeps draining missing
    /// ranges batch by batch until none remain). Completions for a superseded ticket are
    /// absorbed silently; a fetch the source cancelled on its own is rescheduled after the
    /// debounce delay. Failures leave the range missing and are retried per
    /// [`CacheOptions::max_retries`].
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        outcome: FetchOutcome<T>,
        now_ms: u64,
    ) -> Result<Option<FetchRequest>, FetchError> {
        self.complete_fetch_with(ticket, outcome, now_ms, |_| {})
    }

    /// Same as [`IncrementalCache::complete_fetch`], additionally passing every change to
    /// `on_change`.
    pub fn complete_fetch_with(
        &mut self,
        ticket: FetchTicket,
        outcome: FetchOutcome<T>,
        now_ms: u64,
        mut on_change: impl FnMut(&ItemChange<T>),
    ) -> Result<Option<FetchRequest>, FetchError> {
        let Some(request) = self.take_in_flight(ticket) else {
            ctrace!(ticket = ticket.get(), "complete_fetch: stale ticket ignored");
            return Ok(None);
        };

        let items = match outcome {
            FetchOutcome::Fetched(items) if !request.cancel.is_cancelled() => items,
            FetchOutcome::Fetched(_) | FetchOutcome::Cancelled => {
                // Nothing superseded this request, so its range is still wanted.
                ctrace!(range = %request.range, "fetch cancelled by the source; rescheduling");
                self.schedule_fetch(now_ms);
                return Ok(None);
            }
            FetchOutcome::Failed(reason) => {
                let error = FetchError::Source {
                    range: request.range,
                    reason,
                };
                return Err(self.record_failure(error, now_ms));
            }
        };

        let range = request.range;
        let returned = items.len();
        if returned > range.len() {
            cwarn!(
                range = %range,
                returned,
                "fetch returned more items than requested; extra items ignored"
            );
        }

        let mut changes = Vec::new();
        for (index, item) in range.indices().zip(items) {
            // The window may have moved while the request was in flight.
            if !self.desired.contains(index) {
                continue;
            }
            if self.store.get(index) != Some(&item) {
                let old = self.store.set(index, item.clone());
                changes.push(ItemChange {
                    index,
                    old,
                    new: item,
                });
            }
        }

        let fulfilled = returned.min(range.len());
        if let Ok(done) = IndexRange::new(range.first(), fulfilled) {
            self.missing.subtract(done);
            self.cached.extend(
                self.desired
                    .iter()
                    .filter_map(|d| d.overlap(&done))
                    .collect::<Vec<_>>(),
            );
        }

        for change in &changes {
            if let Some(cb) = &self.options.on_item_changed {
                cb(change);
            }
            on_change(change);
        }
        cdebug!(range = %range, changed = changes.len(), "fetch applied");

        if fulfilled < range.len() {
            let error = FetchError::ShortBatch {
                range,
                expected: range.len(),
                returned,
            };
            return Err(self.record_failure(error, now_ms));
        }

        self.consecutive_failures = 0;
        self.last_error = None;
        Ok(self.run_fetch())
    }
}

impl<T: PartialEq> IncrementalCache<T> {
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.store.index_of(value)
    }
}

impl<T> Default for IncrementalCache<T> {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl<T> core::fmt::Debug for IncrementalCache<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IncrementalCache")
            .field("options", &self.options)
            .field("desired", &self.desired)
            .field("cached", &self.cached)
            .field("missing", &self.missing)
            .field("phase", &self.phase)
            .field("consecutive_failures", &self.consecutive_failures)
            .finish_non_exhaustive()
    }
}
