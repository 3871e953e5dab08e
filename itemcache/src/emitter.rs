use alloc::vec::Vec;

use crate::{IndexRange, RangeSet};

/// Helper for list adapters to build the `(visible, tracked)` pair passed to
/// [`crate::VirtualizedFeed::on_ranges_changed`].
///
/// It enforces the tracked-range contract:
/// - Everything is clipped to `[0, count)`; ranges entirely out of bounds are ignored (and
///   debug-asserted).
/// - Overlapping or touching emissions are merged.
#[derive(Clone, Debug)]
pub struct TrackedRanges {
    count: usize,
    visible: Option<IndexRange>,
    tracked: RangeSet,
}

impl TrackedRanges {
    /// `visible_start..visible_end` is the half-open window currently on screen.
    pub fn new(count: usize, visible_start: usize, visible_end: usize) -> Self {
        let visible = if visible_end > visible_start {
            IndexRange::new(visible_start, visible_end - visible_start)
                .ok()
                .and_then(|r| r.clamp_to_count(count))
        } else {
            None
        };
        Self {
            count,
            visible,
            tracked: RangeSet::new(),
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn visible(&self) -> Option<IndexRange> {
        self.visible
    }

    pub fn emit(&mut self, range: IndexRange) {
        let Some(clipped) = range.clamp_to_count(self.count) else {
            cwarn!(
                range = %range,
                count = self.count,
                "TrackedRanges: out-of-bounds range"
            );
            debug_assert!(
                range.first() < self.count,
                "TrackedRanges: out-of-bounds range ({range}, count={})",
                self.count
            );
            return;
        };
        self.tracked.add(clipped);
    }

    pub fn emit_pinned(&mut self, index: usize) {
        self.emit(IndexRange::single(index));
    }

    pub fn emit_visible(&mut self) {
        if let Some(visible) = self.visible {
            self.tracked.add(visible);
        }
    }

    /// Emits the visible window extended by `before` items above and `after` items below.
    pub fn emit_overscanned(&mut self, before: usize, after: usize) {
        let Some(visible) = self.visible else {
            return;
        };
        let first = visible.first().saturating_sub(before);
        let last = visible.last().saturating_add(after);
        if let Ok(range) = IndexRange::from_bounds(first, last) {
            self.emit(range);
        }
    }

    /// Emits whole pages around the visible window, one range per page.
    ///
    /// Pages are `page_len` items long and aligned to multiples of `page_len`.
    pub fn emit_pages(&mut self, page_len: usize, pages_before: usize, pages_after: usize) {
        let Some(visible) = self.visible else {
            return;
        };
        let page_len = page_len.max(1);
        let first_page = (visible.first() / page_len).saturating_sub(pages_before);
        let last_page = (visible.last() / page_len).saturating_add(pages_after);
        for page in first_page..=last_page {
            let Some(first) = page.checked_mul(page_len) else {
                break;
            };
            if first >= self.count {
                break;
            }
            if let Ok(range) = IndexRange::new(first, page_len) {
                self.emit(range);
            }
        }
    }

    /// Returns the visible range and the normalized tracked ranges.
    ///
    /// The visible range is always part of the tracked set.
    pub fn finish(mut self) -> (Option<IndexRange>, Vec<IndexRange>) {
        self.emit_visible();
        (self.visible, self.tracked.as_slice().to_vec())
    }
}
