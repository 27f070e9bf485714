//! Amortized-growth circular sequence with a lazy reversal flag
//!
//! `GrowableSequence` keeps its elements in a ring of `capacity` slots.
//! The logical region starts at `start` and spans `len` slots, so both
//! ends accept insertions in O(1) amortized time. Reversal only toggles a
//! flag; every accessor goes through [`GrowableSequence::slot_of`], which
//! is the single place that maps a logical index to a physical slot.

use crate::error::{KmerStoreError, Result};
use std::cmp::Ordering;
use std::fmt;

/// Resizable random-access sequence backed by a circular buffer.
pub struct GrowableSequence<T> {
    /// Physical slots; `slots.len()` is the capacity
    slots: Vec<Option<T>>,
    /// Physical slot of logical offset zero
    start: usize,
    len: usize,
    reversed: bool,
}

impl<T> GrowableSequence<T> {
    /// Create an empty sequence with a capacity of one slot.
    pub fn new() -> Self {
        let mut slots = Vec::with_capacity(1);
        slots.push(None);
        Self {
            slots,
            start: 0,
            len: 0,
            reversed: false,
        }
    }

    /// Create an empty sequence able to hold `capacity` elements before
    /// growing. The capacity is rounded up to a power of two.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        let capacity = capacity.max(1).next_power_of_two();
        let mut slots = Vec::new();
        slots
            .try_reserve_exact(capacity)
            .map_err(|e| KmerStoreError::capacity_overflow(capacity, e))?;
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots,
            start: 0,
            len: 0,
            reversed: false,
        })
    }

    /// Build a sequence holding `values` in order. Every allocation goes
    /// through the same fallible reservation as growth.
    pub fn from_values<I>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
    {
        let values = values.into_iter();
        let mut sequence = Self::with_capacity(values.size_hint().0)?;
        for value in values {
            sequence.push_back(value)?;
        }
        Ok(sequence)
    }

    /// Physical slot holding logical index `index`. Caller guarantees
    /// `index < self.len`.
    #[inline]
    fn slot_of(&self, index: usize) -> usize {
        let offset = if self.reversed {
            self.len - 1 - index
        } else {
            index
        };
        (self.start + offset) % self.slots.len()
    }

    #[inline]
    fn physical(&self, index: usize) -> Option<usize> {
        (index < self.len).then(|| self.slot_of(index))
    }

    /// Element at logical `index`, or `None` when out of range.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.physical(index).and_then(|slot| self.slots[slot].as_ref())
    }

    /// Mutable element at logical `index`, or `None` when out of range.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let slot = self.physical(index)?;
        self.slots[slot].as_mut()
    }

    /// Overwrite the element at logical `index`.
    ///
    /// Out-of-range writes leave the sequence untouched and return `false`.
    pub fn set(&mut self, index: usize, value: T) -> bool {
        match self.physical(index) {
            Some(slot) => {
                self.slots[slot] = Some(value);
                true
            }
            None => false,
        }
    }

    /// Swap the elements at two logical indices. Returns `false` if either
    /// index is out of range.
    pub fn swap(&mut self, a: usize, b: usize) -> bool {
        match (self.physical(a), self.physical(b)) {
            (Some(x), Some(y)) => {
                self.slots.swap(x, y);
                true
            }
            _ => false,
        }
    }

    /// Double the capacity, copying elements in logical order.
    ///
    /// The new buffer is fully reserved before anything moves, so a failed
    /// allocation leaves the sequence as it was.
    fn grow(&mut self) -> Result<()> {
        let new_capacity = self.slots.len().saturating_mul(2);
        let mut slots: Vec<Option<T>> = Vec::new();
        slots
            .try_reserve_exact(new_capacity)
            .map_err(|e| KmerStoreError::capacity_overflow(new_capacity, e))?;

        for index in 0..self.len {
            let slot = self.slot_of(index);
            slots.push(self.slots[slot].take());
        }
        slots.resize_with(new_capacity, || None);

        self.slots = slots;
        self.start = 0;
        self.reversed = false;
        Ok(())
    }

    /// Append to the logical back. O(1) amortized.
    pub fn push_back(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            self.grow()?;
        }
        let capacity = self.slots.len();
        if self.reversed {
            self.start = (self.start + capacity - 1) % capacity;
            self.slots[self.start] = Some(value);
        } else {
            let slot = (self.start + self.len) % capacity;
            self.slots[slot] = Some(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Prepend to the logical front. O(1) amortized.
    pub fn push_front(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            self.grow()?;
        }
        let capacity = self.slots.len();
        if self.reversed {
            let slot = (self.start + self.len) % capacity;
            self.slots[slot] = Some(value);
        } else {
            self.start = (self.start + capacity - 1) % capacity;
            self.slots[self.start] = Some(value);
        }
        self.len += 1;
        Ok(())
    }

    /// Insert `value` so that it lands at logical `index`, shifting later
    /// elements back by one. O(N).
    ///
    /// Returns `Ok(false)` without inserting when `index > len`.
    pub fn insert_at(&mut self, index: usize, value: T) -> Result<bool> {
        if index > self.len {
            return Ok(false);
        }
        self.push_back(value)?;
        for position in (index..self.len - 1).rev() {
            self.swap(position, position + 1);
        }
        Ok(true)
    }

    /// Remove and return the element at logical `index`, compacting the
    /// logical region. O(N).
    pub fn remove_at(&mut self, index: usize) -> Option<T> {
        if index >= self.len {
            return None;
        }
        for position in index..self.len - 1 {
            self.swap(position, position + 1);
        }

        let slot = self.slot_of(self.len - 1);
        let value = self.slots[slot].take();
        // When reversed, the logical back is the physical front.
        if self.reversed {
            self.start = (self.start + 1) % self.slots.len();
        }
        self.len -= 1;
        value
    }

    /// Toggle the logical order. O(1).
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Drop every element, keeping the allocated capacity.
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.start = 0;
        self.len = 0;
        self.reversed = false;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Iterate in logical order.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        (0..self.len).filter_map(move |index| self.get(index))
    }

    /// Stable merge sort over logical order using `compare`. O(N log N).
    pub fn sort_by<F>(&mut self, mut compare: F)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if self.len < 2 {
            return;
        }
        let mut items = Vec::with_capacity(self.len);
        for index in 0..self.len {
            let slot = self.slot_of(index);
            if let Some(value) = self.slots[slot].take() {
                items.push(value);
            }
        }

        let sorted = merge_sort(items, &mut compare);
        for (index, value) in sorted.into_iter().enumerate() {
            let slot = self.slot_of(index);
            self.slots[slot] = Some(value);
        }
    }
}

impl<T: Ord> GrowableSequence<T> {
    /// Stable ascending sort. O(N log N).
    pub fn sort(&mut self) {
        self.sort_by(T::cmp);
    }
}

impl<T: PartialEq> GrowableSequence<T> {
    /// Remove the first element (in logical order) equal to `value`.
    /// Returns `false` when no element matched. O(N).
    pub fn remove_value(&mut self, value: &T) -> bool {
        let found = self.iter().position(|item| item == value);
        match found {
            Some(index) => self.remove_at(index).is_some(),
            None => false,
        }
    }
}

fn merge_sort<T, F>(mut items: Vec<T>, compare: &mut F) -> Vec<T>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items.len() < 2 {
        return items;
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, compare);
    let right = merge_sort(right, compare);

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    loop {
        // Ties take from the left run to keep the sort stable.
        let take_right = match (left.peek(), right.peek()) {
            (Some(a), Some(b)) => compare(b, a) == Ordering::Less,
            (Some(_), None) => false,
            (None, Some(_)) => true,
            (None, None) => break,
        };
        let next = if take_right { right.next() } else { left.next() };
        merged.extend(next);
    }
    merged
}

impl<T> Default for GrowableSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: fmt::Debug> fmt::Debug for GrowableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for GrowableSequence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (index, item) in self.iter().enumerate() {
            if index > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", item)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect<T: Clone>(seq: &GrowableSequence<T>) -> Vec<T> {
        seq.iter().cloned().collect()
    }

    #[test]
    fn test_push_back_then_reverse() {
        let mut seq = GrowableSequence::new();
        for value in 1..=5 {
            seq.push_back(value).unwrap();
        }
        seq.reverse();

        assert_eq!(seq.get(0), Some(&5));
        assert_eq!(collect(&seq), vec![5, 4, 3, 2, 1]);

        seq.reverse();
        assert_eq!(collect(&seq), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_capacity_doubles() {
        let mut seq = GrowableSequence::new();
        assert_eq!(seq.capacity(), 1);
        assert!(seq.is_empty());

        seq.push_back('a').unwrap();
        assert!(seq.is_full());
        seq.push_back('b').unwrap();
        assert_eq!(seq.capacity(), 2);
        seq.push_back('c').unwrap();
        assert_eq!(seq.capacity(), 4);
        for _ in 0..5 {
            seq.push_front('z').unwrap();
        }
        assert_eq!(seq.len(), 8);
        assert_eq!(seq.capacity(), 8);
        assert!(seq.is_full());
    }

    #[test]
    fn test_push_front_wraps() {
        let mut seq = GrowableSequence::with_capacity(4).unwrap();
        seq.push_back(2).unwrap();
        seq.push_back(3).unwrap();
        seq.push_front(1).unwrap();
        seq.push_front(0).unwrap();

        assert_eq!(seq.capacity(), 4);
        assert_eq!(collect(&seq), vec![0, 1, 2, 3]);

        // Growing out of a wrapped layout keeps logical order
        seq.push_back(4).unwrap();
        assert_eq!(seq.capacity(), 8);
        assert_eq!(collect(&seq), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_pushes_while_reversed() {
        let mut seq = GrowableSequence::new();
        seq.push_back(1).unwrap();
        seq.push_back(2).unwrap();
        seq.reverse();
        seq.push_back(0).unwrap();
        seq.push_front(3).unwrap();

        assert_eq!(collect(&seq), vec![3, 2, 1, 0]);
        seq.reverse();
        assert_eq!(collect(&seq), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_out_of_range_is_fail_soft() {
        let mut seq = GrowableSequence::new();
        seq.push_back(10).unwrap();

        assert_eq!(seq.get(1), None);
        assert!(!seq.set(1, 99));
        assert!(seq.set(0, 11));
        assert_eq!(seq.get(0), Some(&11));
        assert_eq!(seq.remove_at(5), None);
        assert_eq!(seq.len(), 1);
    }

    #[test]
    fn test_remove_at_and_value() {
        let mut seq = GrowableSequence::new();
        for value in [1, 2, 3, 2, 5] {
            seq.push_back(value).unwrap();
        }

        assert_eq!(seq.remove_at(0), Some(1));
        assert!(seq.remove_value(&2));
        assert_eq!(collect(&seq), vec![3, 2, 5]);
        assert!(!seq.remove_value(&42));

        seq.reverse();
        assert_eq!(seq.remove_at(2), Some(3));
        assert_eq!(collect(&seq), vec![5, 2]);
        seq.push_back(7).unwrap();
        assert_eq!(collect(&seq), vec![5, 2, 7]);
    }

    #[test]
    fn test_remove_value_follows_logical_order() {
        let mut seq = GrowableSequence::from_values([4, 1, 4, 2]).unwrap();
        seq.reverse();

        assert!(seq.remove_value(&4));
        assert_eq!(collect(&seq), vec![2, 1, 4]);
        assert!(seq.remove_value(&4));
        assert!(!seq.remove_value(&4));
        assert_eq!(collect(&seq), vec![2, 1]);
    }

    #[test]
    fn test_insert_at() {
        let mut seq = GrowableSequence::new();
        seq.insert_at(0, "b").unwrap();
        seq.insert_at(0, "a").unwrap();
        seq.insert_at(2, "d").unwrap();
        seq.insert_at(2, "c").unwrap();

        assert_eq!(collect(&seq), vec!["a", "b", "c", "d"]);
        assert!(!seq.insert_at(9, "x").unwrap());
        assert_eq!(seq.len(), 4);
    }

    #[test]
    fn test_sort_respects_reversal() {
        let mut seq = GrowableSequence::new();
        for value in [4, 1, 3, 9, 0, 2] {
            seq.push_back(value).unwrap();
        }
        seq.reverse();
        seq.sort();
        assert_eq!(collect(&seq), vec![0, 1, 2, 3, 4, 9]);

        seq.reverse();
        assert_eq!(collect(&seq), vec![9, 4, 3, 2, 1, 0]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut seq = GrowableSequence::new();
        for pair in [(2, 'a'), (1, 'b'), (2, 'c'), (1, 'd'), (0, 'e')] {
            seq.push_back(pair).unwrap();
        }
        seq.sort_by(|a, b| a.0.cmp(&b.0));

        assert_eq!(
            collect(&seq),
            vec![(0, 'e'), (1, 'b'), (1, 'd'), (2, 'a'), (2, 'c')]
        );
    }

    #[test]
    fn test_display_and_clear() {
        let mut seq = GrowableSequence::new();
        assert_eq!(seq.to_string(), "[]");
        for value in 1..=3 {
            seq.push_back(value).unwrap();
        }
        assert_eq!(seq.to_string(), "[1, 2, 3]");
        assert_eq!(format!("{:?}", seq), "[1, 2, 3]");

        seq.clear();
        assert!(seq.is_empty());
        assert_eq!(seq.capacity(), 4);
    }

    #[test]
    fn test_from_values() {
        let mut seq = GrowableSequence::from_values(1..=5u32).unwrap();
        assert_eq!(seq.len(), 5);
        assert_eq!(seq.capacity(), 8);
        assert_eq!(seq.to_string(), "[1, 2, 3, 4, 5]");

        seq.push_front(0).unwrap();
        assert_eq!(seq.get(0), Some(&0));

        let empty = GrowableSequence::<u32>::from_values(std::iter::empty()).unwrap();
        assert!(empty.is_empty());
        assert_eq!(empty.capacity(), 1);
    }
}
