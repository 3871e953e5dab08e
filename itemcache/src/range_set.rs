use alloc::vec::Vec;

use crate::IndexRange;

/// A sorted set of disjoint, non-adjacent [`IndexRange`]s.
///
/// Touching ranges are merged eagerly, so `[0..=4]` and `[5..=9]` are stored as `[0..=9]`.
/// The number of stored ranges is expected to stay small (one per retained window), so
/// mutations use linear scans.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeSet {
    ranges: Vec<IndexRange>,
}

impl RangeSet {
    pub fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Builds a set from arbitrary (unsorted, overlapping) ranges.
    pub fn from_ranges(ranges: &[IndexRange]) -> Self {
        Self {
            ranges: Self::normalize(ranges),
        }
    }

    /// Returns the minimal sorted, disjoint covering of `ranges`.
    ///
    /// Adjacent or overlapping inputs are merged; a disjoint input lands at its sorted position.
    pub fn normalize(ranges: &[IndexRange]) -> Vec<IndexRange> {
        let mut set = Self::new();
        for range in ranges {
            set.add(*range);
        }
        set.ranges
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn clear(&mut self) {
        self.ranges.clear();
    }

    pub fn first(&self) -> Option<IndexRange> {
        self.ranges.first().copied()
    }

    pub fn as_slice(&self) -> &[IndexRange] {
        &self.ranges
    }

    pub fn iter(&self) -> impl Iterator<Item = IndexRange> + '_ {
        self.ranges.iter().copied()
    }

    /// Total number of indices covered by the set.
    pub fn item_count(&self) -> usize {
        self.ranges.iter().map(IndexRange::len).sum()
    }

    /// Merges `range` into the set.
    pub fn add(&mut self, range: IndexRange) {
        let mut merged = range;
        let mut i = 0;
        while i < self.ranges.len() {
            let cur = self.ranges[i];
            if merged.contiguous_or_overlaps(&cur) {
                // A merge may reach the following ranges as well, so keep absorbing.
                merged = merged.combine(&cur);
                self.ranges.remove(i);
                continue;
            }
            if merged.last() < cur.first() {
                break;
            }
            i += 1;
        }
        self.ranges.insert(i, merged);
    }

    /// Removes every index of `range` from the set, trimming or splitting stored ranges.
    pub fn subtract(&mut self, range: IndexRange) {
        let mut i = 0;
        while i < self.ranges.len() {
            let cur = self.ranges[i];
            if cur.first() > range.last() {
                return;
            }
            let Some(overlap) = cur.overlap(&range) else {
                i += 1;
                continue;
            };

            let diff = cur.diff(&overlap);
            self.ranges.remove(i);
            let kept = diff.only_in_self.len();
            for (offset, piece) in diff.only_in_self.into_iter().enumerate() {
                self.ranges.insert(i + offset, piece);
            }
            i += kept;
        }
    }

    pub fn intersects(&self, range: &IndexRange) -> bool {
        self.ranges.iter().any(|r| r.intersects(range))
    }

    pub fn contains(&self, index: usize) -> bool {
        let pos = self.ranges.partition_point(|r| r.last() < index);
        self.ranges.get(pos).is_some_and(|r| r.contains(index))
    }

    /// Indices present in both sets.
    pub fn intersection(&self, other: &RangeSet) -> RangeSet {
        let mut out = RangeSet::new();
        for a in &self.ranges {
            for b in &other.ranges {
                if let Some(overlap) = a.overlap(b) {
                    out.add(overlap);
                }
            }
        }
        out
    }

    /// Whether `ranges` (already normalized) describe exactly this set.
    pub fn same_as(&self, ranges: &[IndexRange]) -> bool {
        self.ranges.as_slice() == ranges
    }
}

impl FromIterator<IndexRange> for RangeSet {
    fn from_iter<I: IntoIterator<Item = IndexRange>>(iter: I) -> Self {
        let mut set = RangeSet::new();
        for range in iter {
            set.add(range);
        }
        set
    }
}

impl Extend<IndexRange> for RangeSet {
    fn extend<I: IntoIterator<Item = IndexRange>>(&mut self, iter: I) {
        for range in iter {
            self.add(range);
        }
    }
}
