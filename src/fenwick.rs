//! Cumulative counts keyed by sorted rank
//!
//! A Fenwick (binary indexed) tree over per-rank counts. Node `i`
//! (1-based) covers the `i & i.wrapping_neg()` ranks ending at `i`, so a
//! prefix sum or a point update touches O(log n) nodes.

use crate::error::Result;
use crate::sequence::GrowableSequence;

#[inline]
fn lowbit(i: usize) -> usize {
    i & i.wrapping_neg()
}

/// Prefix and suffix sums over a sequence of counts.
#[derive(Debug, Default)]
pub struct RankSums {
    tree: GrowableSequence<u64>,
    total: u64,
}

impl RankSums {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the tree from counts given in rank order. O(n).
    pub fn from_counts<I>(counts: I) -> Result<Self>
    where
        I: IntoIterator<Item = u64>,
    {
        let mut tree = GrowableSequence::new();
        let mut total = 0u64;
        for count in counts {
            tree.push_back(count)?;
            total += count;
        }

        let n = tree.len();
        for i in 1..=n {
            let parent = i + lowbit(i);
            if parent <= n {
                let value = tree.get(i - 1).copied().unwrap_or(0);
                if let Some(node) = tree.get_mut(parent - 1) {
                    *node += value;
                }
            }
        }
        Ok(Self { tree, total })
    }

    /// Number of ranks covered.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Add `delta` to the count at `rank`. Out-of-range ranks are ignored.
    pub fn add(&mut self, rank: usize, delta: u64) {
        let n = self.tree.len();
        if rank >= n {
            return;
        }
        let mut i = rank + 1;
        while i <= n {
            if let Some(node) = self.tree.get_mut(i - 1) {
                *node += delta;
            }
            i += lowbit(i);
        }
        self.total += delta;
    }

    /// Sum of the counts at ranks `0..rank`.
    pub fn prefix_sum(&self, rank: usize) -> u64 {
        let mut i = rank.min(self.tree.len());
        let mut sum = 0;
        while i > 0 {
            sum += self.tree.get(i - 1).copied().unwrap_or(0);
            i -= lowbit(i);
        }
        sum
    }

    /// Sum of the counts at ranks `rank..`.
    pub fn suffix_sum(&self, rank: usize) -> u64 {
        self.total - self.prefix_sum(rank)
    }
}
