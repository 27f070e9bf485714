//! Packed bit sequence with lazy flip and reversal
//!
//! Bits live in 64-bit words held by a [`GrowableSequence`]. The sequence
//! is a ring of `64 * word_count` bit positions: logical offset zero sits at
//! the physical bit `start`, which lets `push_front` run without moving
//! anything. `flip_all` and `reverse` only toggle flags; `locate` applies
//! the reversal and `get`/`write` apply the flip, so no operation reads or
//! writes a raw bit without going through them.

use crate::error::Result;
use crate::sequence::GrowableSequence;
use std::fmt;

const WORD_BITS: usize = u64::BITS as usize;

/// Compact sequence of bits stored 64 to a word.
pub struct BitSequence {
    words: GrowableSequence<u64>,
    len: usize,
    /// Physical bit position of logical offset zero
    start: usize,
    flipped: bool,
    reversed: bool,
}

impl BitSequence {
    pub fn new() -> Self {
        Self {
            words: GrowableSequence::new(),
            len: 0,
            start: 0,
            flipped: false,
            reversed: false,
        }
    }

    /// Build a sequence from bits given in logical order.
    pub fn from_bits<I>(bits: I) -> Result<Self>
    where
        I: IntoIterator<Item = bool>,
    {
        let mut sequence = Self::new();
        for bit in bits {
            sequence.push_back(bit)?;
        }
        Ok(sequence)
    }

    #[inline]
    fn bit_capacity(&self) -> usize {
        self.words.len() * WORD_BITS
    }

    /// Word index and in-word bit for logical `index`. Caller guarantees
    /// `index < self.len`.
    #[inline]
    fn locate(&self, index: usize) -> (usize, u32) {
        let offset = if self.reversed {
            self.len - 1 - index
        } else {
            index
        };
        let bit = (self.start + offset) % self.bit_capacity();
        (bit / WORD_BITS, (bit % WORD_BITS) as u32)
    }

    #[inline]
    fn stored(&self, index: usize) -> bool {
        let (word, bit) = self.locate(index);
        self.words
            .get(word)
            .is_some_and(|value| (value >> bit) & 1 == 1)
    }

    /// Store the logical value `bit` at an in-range `index`.
    fn write(&mut self, index: usize, bit: bool) {
        let (word, offset) = self.locate(index);
        let physical = bit ^ self.flipped;
        if let Some(value) = self.words.get_mut(word) {
            if physical {
                *value |= 1u64 << offset;
            } else {
                *value &= !(1u64 << offset);
            }
        }
    }

    /// Bit at logical `index`, or `None` beyond the end.
    pub fn get(&self, index: usize) -> Option<bool> {
        (index < self.len).then(|| self.stored(index) ^ self.flipped)
    }

    /// Make room for one more bit, doubling the word count when full.
    ///
    /// Bits are re-laid out from physical position zero so that a layout
    /// which wrapped around the old ring keeps its meaning in the new one.
    fn ensure_room(&mut self) -> Result<()> {
        if self.len < self.bit_capacity() {
            return Ok(());
        }
        let word_count = (self.words.len() * 2).max(1);
        let mut words = GrowableSequence::with_capacity(word_count)?;
        for _ in 0..word_count {
            words.push_back(0u64)?;
        }

        let capacity = self.bit_capacity();
        for offset in 0..self.len {
            let bit = (self.start + offset) % capacity;
            let set = self
                .words
                .get(bit / WORD_BITS)
                .is_some_and(|value| (value >> (bit % WORD_BITS)) & 1 == 1);
            if set {
                if let Some(value) = words.get_mut(offset / WORD_BITS) {
                    *value |= 1u64 << (offset % WORD_BITS);
                }
            }
        }

        self.words = words;
        self.start = 0;
        Ok(())
    }

    /// Extend the physical region by one position after its last offset.
    fn grow_physical_back(&mut self) {
        self.len += 1;
    }

    /// Extend the physical region by one position before its first offset.
    fn grow_physical_front(&mut self) {
        let capacity = self.bit_capacity();
        self.start = (self.start + capacity - 1) % capacity;
        self.len += 1;
    }

    /// Append a bit at the logical back. O(1) amortized.
    pub fn push_back(&mut self, bit: bool) -> Result<()> {
        self.ensure_room()?;
        if self.reversed {
            self.grow_physical_front();
        } else {
            self.grow_physical_back();
        }
        self.write(self.len - 1, bit);
        Ok(())
    }

    /// Prepend a bit at the logical front. O(1) amortized.
    pub fn push_front(&mut self, bit: bool) -> Result<()> {
        self.ensure_room()?;
        if self.reversed {
            self.grow_physical_back();
        } else {
            self.grow_physical_front();
        }
        self.write(0, bit);
        Ok(())
    }

    /// Set the bit at `index` to 1.
    ///
    /// Unlike reads, a write past the end extends the sequence with zero
    /// bits up to `index` first.
    pub fn set(&mut self, index: usize) -> Result<()> {
        while self.len <= index {
            self.push_back(false)?;
        }
        self.write(index, true);
        Ok(())
    }

    /// Set the bit at `index` to 0. Out-of-range indices are ignored.
    pub fn unset(&mut self, index: usize) -> bool {
        if index >= self.len {
            return false;
        }
        self.write(index, false);
        true
    }

    /// Set or unset the bit at `index` depending on `bit`.
    pub fn set_value(&mut self, index: usize, bit: bool) -> Result<()> {
        if bit {
            self.set(index)
        } else {
            self.unset(index);
            Ok(())
        }
    }

    /// Toggle the logical order. O(1).
    pub fn reverse(&mut self) {
        self.reversed = !self.reversed;
    }

    /// Complement every bit. O(1).
    pub fn flip_all(&mut self) {
        self.flipped = !self.flipped;
    }

    /// Shift by `dist` positions, filling vacated positions with 0.
    ///
    /// A positive distance shifts left (bit `i` takes the value of bit
    /// `i + dist`), a negative one shifts right. O(N).
    pub fn shift(&mut self, dist: isize) {
        let n = self.len;
        if dist == 0 || n == 0 {
            return;
        }
        let d = dist.unsigned_abs();

        if dist > 0 {
            for i in 0..n {
                let value = i
                    .checked_add(d)
                    .and_then(|source| self.get(source))
                    .unwrap_or(false);
                self.write(i, value);
            }
        } else {
            for i in (0..n).rev() {
                let value = i
                    .checked_sub(d)
                    .and_then(|source| self.get(source))
                    .unwrap_or(false);
                self.write(i, value);
            }
        }
    }

    /// Rotate by `dist` positions with wraparound.
    ///
    /// A positive distance rotates left (bit `i` takes the value of bit
    /// `(i + dist) mod len`), a negative one rotates right. Done in place
    /// with three range reversals. O(N).
    pub fn rotate(&mut self, dist: isize) {
        let n = self.len;
        if n == 0 {
            return;
        }
        let d = dist.rem_euclid(n as isize) as usize;
        if d == 0 {
            return;
        }
        self.reverse_range(0, d);
        self.reverse_range(d, n);
        self.reverse_range(0, n);
    }

    fn reverse_range(&mut self, mut lo: usize, mut hi: usize) {
        while lo + 1 < hi {
            hi -= 1;
            self.swap_bits(lo, hi);
            lo += 1;
        }
    }

    fn swap_bits(&mut self, a: usize, b: usize) {
        let (x, y) = (self.stored(a), self.stored(b));
        if x != y {
            // Both bits differ, so writing the logical complements swaps them.
            self.write(a, !(x ^ self.flipped));
            self.write(b, !(y ^ self.flipped));
        }
    }

    /// Number of bits.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of 64-bit words currently allocated.
    pub fn word_count(&self) -> usize {
        self.words.len()
    }

    /// Number of logical 1 bits. O(N).
    pub fn count_ones(&self) -> usize {
        self.iter().filter(|&bit| bit).count()
    }

    /// Iterate bits in logical order.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).filter_map(move |index| self.get(index))
    }
}

impl Default for BitSequence {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for bit in self.iter() {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

impl fmt::Debug for BitSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitSequence")
            .field("bits", &self.to_string())
            .field("flipped", &self.flipped)
            .field("reversed", &self.reversed)
            .finish()
    }
}
