use alloc::vec::Vec;

use crate::{IndexRange, RangeSet};

#[derive(Clone, Debug)]
struct Block<T> {
    first: usize,
    items: Vec<Option<T>>,
}

impl<T> Block<T> {
    fn empty(range: IndexRange) -> Self {
        let mut items = Vec::with_capacity(range.len());
        items.resize_with(range.len(), || None);
        Self {
            first: range.first(),
            items,
        }
    }

    fn last(&self) -> usize {
        self.first + self.items.len() - 1
    }

    fn range(&self) -> IndexRange {
        // Blocks are never empty: they are created from a range or from a single write.
        IndexRange::from_bounds(self.first, self.last()).unwrap_or(IndexRange::single(self.first))
    }
}

/// Sparse storage for cached items, organized as sorted, non-overlapping blocks.
///
/// Gaps between blocks are indices the store knows nothing about. Slots inside a block may be
/// empty as well (allocated for a retained range but not fetched yet).
#[derive(Clone, Debug)]
pub struct SparseItemStore<T> {
    blocks: Vec<Block<T>>,
}

impl<T> Default for SparseItemStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SparseItemStore<T> {
    pub fn new() -> Self {
        Self { blocks: Vec::new() }
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Index ranges spanned by the current blocks, in order.
    pub fn block_ranges(&self) -> impl Iterator<Item = IndexRange> + '_ {
        self.blocks.iter().map(Block::range)
    }

    /// Number of occupied slots.
    pub fn item_count(&self) -> usize {
        self.blocks
            .iter()
            .map(|b| b.items.iter().filter(|slot| slot.is_some()).count())
            .sum()
    }

    pub fn clear(&mut self) {
        self.blocks.clear();
    }

    // Position of the first block whose last index is >= `index`.
    fn lower_block(&self, index: usize) -> usize {
        self.blocks.partition_point(|b| b.last() < index)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        let block = self.blocks.get(self.lower_block(index))?;
        if index < block.first {
            return None;
        }
        block.items[index - block.first].as_ref()
    }

    /// Writes `value` at `index` and returns the previous value.
    ///
    /// A write just past the end of a block grows that block by one slot; any other write outside
    /// the existing blocks creates a new single-item block. Existing blocks are never merged here,
    /// only [`SparseItemStore::repartition`] reshapes them.
    pub fn set(&mut self, index: usize, value: T) -> Option<T> {
        let pos = self.lower_block(index);
        if let Some(block) = self.blocks.get_mut(pos) {
            if index >= block.first {
                return block.items[index - block.first].replace(value);
            }
        }

        if pos > 0 {
            let prev = &mut self.blocks[pos - 1];
            if prev.last().checked_add(1) == Some(index) {
                prev.items.push(Some(value));
                return None;
            }
        }

        self.blocks.insert(
            pos,
            Block {
                first: index,
                items: alloc::vec![Some(value)],
            },
        );
        None
    }

    /// Empties the slot at `index`, returning its value. Block shapes are left untouched.
    pub fn take(&mut self, index: usize) -> Option<T> {
        let pos = self.lower_block(index);
        let block = self.blocks.get_mut(pos)?;
        if index < block.first {
            return None;
        }
        block.items[index - block.first].take()
    }

    /// Rebuilds the blocks to exactly cover `ranges`, keeping items that fall inside them.
    ///
    /// `ranges` may be unsorted or overlapping; they are normalized first. Items outside the
    /// new ranges are dropped. An empty `ranges` clears the store.
    pub fn repartition(&mut self, ranges: &[IndexRange]) {
        let normalized = RangeSet::normalize(ranges);
        let ranges = normalized.as_slice();

        let mut old = core::mem::take(&mut self.blocks);
        let mut blocks: Vec<Block<T>> = ranges.iter().map(|r| Block::empty(*r)).collect();

        // Both lists are sorted, so the scan over old blocks only moves forward.
        let mut start = 0usize;
        for (new_block, range) in blocks.iter_mut().zip(ranges) {
            while start < old.len() && old[start].last() < range.first() {
                start += 1;
            }
            let mut j = start;
            while j < old.len() && old[j].first <= range.last() {
                let old_block = &mut old[j];
                if let Some(overlap) = old_block.range().overlap(range) {
                    let from = overlap.first() - old_block.first;
                    let to = overlap.first() - new_block.first;
                    for k in 0..overlap.len() {
                        new_block.items[to + k] = old_block.items[from + k].take();
                    }
                }
                j += 1;
            }
        }

        self.blocks = blocks;
    }
}

impl<T: PartialEq> SparseItemStore<T> {
    /// Returns the index of the first stored item equal to `value`.
    pub fn index_of(&self, value: &T) -> Option<usize> {
        self.blocks.iter().find_map(|block| {
            block
                .items
                .iter()
                .position(|slot| slot.as_ref() == Some(value))
                .map(|offset| block.first + offset)
        })
    }
}
