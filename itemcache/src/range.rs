use alloc::vec::Vec;
use core::fmt;

use crate::RangeError;

/// A contiguous, non-empty span of item indices `[first, first + len)`.
///
/// Ranges can only be built through the fallible constructors, so every value in circulation
/// covers at least one item and its last index fits in `usize`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawIndexRange"))]
pub struct IndexRange {
    first: usize,
    len: usize,
}

#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawIndexRange {
    first: usize,
    len: usize,
}

#[cfg(feature = "serde")]
impl TryFrom<RawIndexRange> for IndexRange {
    type Error = RangeError;

    fn try_from(raw: RawIndexRange) -> Result<Self, Self::Error> {
        Self::new(raw.first, raw.len)
    }
}

/// Result of [`IndexRange::diff`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RangeDiff {
    pub overlap: Option<IndexRange>,
    pub only_in_self: Vec<IndexRange>,
    pub only_in_other: Vec<IndexRange>,
}

#[allow(clippy::len_without_is_empty)]
impl IndexRange {
    pub fn new(first: usize, len: usize) -> Result<Self, RangeError> {
        if len == 0 {
            return Err(RangeError::Empty);
        }
        if first.checked_add(len - 1).is_none() {
            return Err(RangeError::Overflow { first, len });
        }
        Ok(Self { first, len })
    }

    /// Builds the range `[first, last]` (both inclusive).
    pub fn from_bounds(first: usize, last: usize) -> Result<Self, RangeError> {
        if last < first {
            return Err(RangeError::Inverted { first, last });
        }
        let len = (last - first)
            .checked_add(1)
            .ok_or(RangeError::Overflow { first, len: usize::MAX })?;
        Ok(Self { first, len })
    }

    /// A single-item range.
    pub fn single(index: usize) -> Self {
        Self {
            first: index,
            len: 1,
        }
    }

    pub fn first(&self) -> usize {
        self.first
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn last(&self) -> usize {
        self.first + (self.len - 1)
    }

    /// Exclusive end. Saturates for a range that ends at `usize::MAX`.
    pub fn end(&self) -> usize {
        self.last().saturating_add(1)
    }

    pub fn indices(&self) -> core::ops::Range<usize> {
        self.first..self.end()
    }

    pub fn contains(&self, index: usize) -> bool {
        index >= self.first && index <= self.last()
    }

    pub fn intersects(&self, other: &IndexRange) -> bool {
        self.first <= other.last() && other.first <= self.last()
    }

    /// True when the two ranges overlap or touch with no gap in between.
    pub fn contiguous_or_overlaps(&self, other: &IndexRange) -> bool {
        self.first <= other.last().saturating_add(1) && other.first <= self.last().saturating_add(1)
    }

    /// Smallest range covering both `self` and `other`.
    pub fn combine(&self, other: &IndexRange) -> IndexRange {
        let first = self.first.min(other.first);
        let last = self.last().max(other.last());
        IndexRange {
            first,
            len: last - first + 1,
        }
    }

    pub fn overlap(&self, other: &IndexRange) -> Option<IndexRange> {
        let first = self.first.max(other.first);
        let last = self.last().min(other.last());
        (first <= last).then(|| IndexRange {
            first,
            len: last - first + 1,
        })
    }

    /// Interval difference between `self` and `other`.
    ///
    /// For disjoint ranges `overlap` is `None` and each side is returned whole.
    pub fn diff(&self, other: &IndexRange) -> RangeDiff {
        let Some(overlap) = self.overlap(other) else {
            return RangeDiff {
                overlap: None,
                only_in_self: alloc::vec![*self],
                only_in_other: alloc::vec![*other],
            };
        };
        RangeDiff {
            overlap: Some(overlap),
            only_in_self: outside(self, &overlap),
            only_in_other: outside(other, &overlap),
        }
    }

    /// Keeps at most the first `max_len` items. `max_len == 0` is treated as 1.
    pub fn truncate(&self, max_len: usize) -> IndexRange {
        IndexRange {
            first: self.first,
            len: self.len.min(max_len.max(1)),
        }
    }

    /// Clips the range to `[0, count)`. Returns `None` when nothing remains.
    pub fn clamp_to_count(&self, count: usize) -> Option<IndexRange> {
        if self.first >= count {
            return None;
        }
        let last = self.last().min(count - 1);
        Some(IndexRange {
            first: self.first,
            len: last - self.first + 1,
        })
    }
}

// Parts of `range` that fall outside `inner`, which must be a sub-range of `range`.
fn outside(range: &IndexRange, inner: &IndexRange) -> Vec<IndexRange> {
    let mut out = Vec::new();
    if range.first < inner.first {
        out.push(IndexRange {
            first: range.first,
            len: inner.first - range.first,
        });
    }
    if range.last() > inner.last() {
        out.push(IndexRange {
            first: inner.last() + 1,
            len: range.last() - inner.last(),
        });
    }
    out
}

impl fmt::Display for IndexRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..={}]", self.first, self.last())
    }
}
