//! Sorted k-mer store with occurrence counts
//!
//! `KmerStore` keeps every distinct k-mer once, in ascending order, together
//! with the number of times it is currently stored. Two aggregates ride
//! alongside the sorted entries and are updated by every mutation:
//!
//! * a prefix map from each 2-base prefix to the total count of entries
//!   starting with it, which answers `compatible` in O(1);
//! * a Fenwick tree over the counts in rank order, which answers
//!   `count_geq` in O(k log n).
//!
//! Bulk operations sort their input and merge it against the entries in a
//! single pass, and only replace the store's state once the merge has
//! succeeded.

use crate::config::IndexSettings;
use crate::error::{KmerStoreError, Result};
use crate::fenwick::RankSums;
use crate::kmer::{
    Kmer, KmerEngine, PREFIX_COUNT, compatible_prefix, prefix_code, prefix_symbols,
};
use crate::sequence::GrowableSequence;
use ahash::AHashMap;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Default number of windows buffered by `load` before they are merged in
pub const DEFAULT_LOAD_BATCH_SIZE: usize = 65_536;

/// One distinct k-mer and how many times it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    kmer: Kmer,
    count: u64,
}

/// Summary of a `load` call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadStats {
    /// Lines read
    pub lines: u64,
    /// Lines shorter than k
    pub short_lines: u64,
    /// Windows inserted
    pub windows: u64,
    /// Windows dropped for containing a base outside {A, C, G, T}
    pub skipped_windows: u64,
}

/// Snapshot of the store's size and prefix totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    pub k: usize,
    /// Distinct k-mers
    pub distinct: usize,
    /// Sum of all counts
    pub total: u64,
    /// Prefix totals keyed by the two bases
    pub prefixes: BTreeMap<String, u64>,
}

/// Ordered multiset of fixed-length k-mers.
pub struct KmerStore {
    engine: KmerEngine,
    /// Strictly ascending by k-mer, every count >= 1
    entries: GrowableSequence<Entry>,
    /// Prefix code -> sum of counts of entries with that prefix
    prefix_counts: AHashMap<u8, u64>,
    /// Counts of `entries` in rank order
    rank_sums: RankSums,
    load_batch_size: usize,
}

impl KmerStore {
    /// Create an empty store for k-mers of length `k`.
    ///
    /// # Returns
    /// * `Ok(KmerStore)` - Empty store
    /// * `Err(KmerStoreError)` - k outside `MIN_K..=MAX_K`
    pub fn new(k: usize) -> Result<Self> {
        Ok(Self {
            engine: KmerEngine::new(k)?,
            entries: GrowableSequence::new(),
            prefix_counts: AHashMap::with_capacity(PREFIX_COUNT),
            rank_sums: RankSums::new(),
            load_batch_size: DEFAULT_LOAD_BATCH_SIZE,
        })
    }

    /// Create an empty store from index settings.
    pub fn with_settings(settings: &IndexSettings) -> Result<Self> {
        let mut store = Self::new(settings.k)?;
        store.load_batch_size = settings.load_batch_size.max(1);
        Ok(store)
    }

    pub fn k(&self) -> usize {
        self.engine.k()
    }

    /// Number of distinct k-mers
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of stored occurrences
    pub fn total(&self) -> u64 {
        self.rank_sums.total()
    }

    /// Rank of the first entry for which `below` is false. Entries must be
    /// partitioned by `below`, true ones first.
    fn partition_point<P>(&self, below: P) -> usize
    where
        P: Fn(&Kmer) -> bool,
    {
        let (mut lo, mut hi) = (0, self.entries.len());
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.entries.get(mid).is_some_and(|entry| below(&entry.kmer)) {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// Rank of the first entry not less than `kmer`.
    fn lower_bound(&self, kmer: Kmer) -> usize {
        self.partition_point(|stored| *stored < kmer)
    }

    fn rank_sums_for(entries: &GrowableSequence<Entry>) -> Result<RankSums> {
        RankSums::from_counts(entries.iter().map(|entry| entry.count))
    }

    fn add_prefix(&mut self, prefix: u8, amount: u64) {
        if amount > 0 {
            *self.prefix_counts.entry(prefix).or_insert(0) += amount;
        }
    }

    fn remove_prefix(&mut self, prefix: u8, amount: u64) {
        if let Some(total) = self.prefix_counts.get_mut(&prefix) {
            *total = total.saturating_sub(amount);
            if *total == 0 {
                self.prefix_counts.remove(&prefix);
            }
        }
    }

    /// Insert one k-mer given as a string.
    ///
    /// An existing k-mer costs O(log n); a new one is shifted into place in
    /// O(n). Strings of the wrong length or with bases outside the alphabet
    /// are rejected and leave the store unchanged.
    pub fn insert(&mut self, symbol: &str) -> Result<()> {
        let kmer = self.engine.parse(symbol)?;
        self.insert_kmer(kmer)
    }

    /// Insert one already-packed k-mer.
    pub fn insert_kmer(&mut self, kmer: Kmer) -> Result<()> {
        if kmer.k() != self.k() {
            return Err(KmerStoreError::length_mismatch(self.k(), kmer.k()));
        }
        let rank = self.lower_bound(kmer);

        if let Some(entry) = self.entries.get_mut(rank).filter(|entry| entry.kmer == kmer) {
            entry.count += 1;
            self.rank_sums.add(rank, 1);
        } else {
            self.entries.insert_at(rank, Entry { kmer, count: 1 })?;
            match Self::rank_sums_for(&self.entries) {
                Ok(rank_sums) => self.rank_sums = rank_sums,
                Err(e) => {
                    self.entries.remove_at(rank);
                    return Err(e);
                }
            }
        }

        self.add_prefix(kmer.prefix(), 1);
        Ok(())
    }

    /// Insert a batch of k-mers in O(m log m + n + m).
    ///
    /// The whole batch is validated before anything changes, so one bad
    /// symbol rejects the batch.
    #[instrument(skip_all, fields(k = self.k()))]
    pub fn batch_insert<I, S>(&mut self, symbols: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = GrowableSequence::new();
        for symbol in symbols {
            batch.push_back(self.engine.parse(symbol.as_ref())?)?;
        }
        self.merge_insert(batch)
    }

    /// Sort `batch`, collapse runs and merge them into the entries.
    fn merge_insert(&mut self, mut batch: GrowableSequence<Kmer>) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        batch.sort();

        let mut merged = GrowableSequence::with_capacity(self.entries.len() + batch.len())?;
        let mut added = [0u64; PREFIX_COUNT];
        let (mut i, mut j) = (0, 0);
        loop {
            let existing = self.entries.get(i).copied();
            let incoming = batch.get(j).copied();
            match (existing, incoming) {
                (Some(entry), Some(kmer)) if entry.kmer < kmer => {
                    merged.push_back(entry)?;
                    i += 1;
                }
                (Some(entry), None) => {
                    merged.push_back(entry)?;
                    i += 1;
                }
                (_, Some(kmer)) => {
                    let mut run = 0u64;
                    while batch.get(j) == Some(&kmer) {
                        run += 1;
                        j += 1;
                    }
                    added[kmer.prefix() as usize] += run;
                    match existing {
                        Some(entry) if entry.kmer == kmer => {
                            merged.push_back(Entry { kmer, count: entry.count + run })?;
                            i += 1;
                        }
                        _ => merged.push_back(Entry { kmer, count: run })?,
                    }
                }
                (None, None) => break,
            }
        }

        let rank_sums = Self::rank_sums_for(&merged)?;
        debug!(batch = batch.len(), distinct = merged.len(), "merged insert batch");
        self.entries = merged;
        self.rank_sums = rank_sums;
        for (prefix, amount) in added.into_iter().enumerate() {
            self.add_prefix(prefix as u8, amount);
        }
        Ok(())
    }

    /// Remove one occurrence per listed symbol in O(m log m + n + m).
    ///
    /// A k-mer listed `d` times loses `d` occurrences, never going below
    /// zero; entries that reach zero are dropped. Symbols that are not
    /// stored, or could never be stored, are ignored.
    ///
    /// # Returns
    /// Number of occurrences actually removed
    #[instrument(skip_all, fields(k = self.k()))]
    pub fn batch_delete<I, S>(&mut self, symbols: I) -> Result<u64>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut batch = GrowableSequence::new();
        for symbol in symbols {
            if let Some(kmer) = self.engine.parse_query(symbol.as_ref()) {
                batch.push_back(kmer)?;
            }
        }
        if batch.is_empty() || self.entries.is_empty() {
            return Ok(0);
        }
        batch.sort();

        let mut kept = GrowableSequence::with_capacity(self.entries.len())?;
        let mut removed = [0u64; PREFIX_COUNT];
        let mut j = 0;
        for entry in self.entries.iter().copied() {
            while batch.get(j).is_some_and(|kmer| *kmer < entry.kmer) {
                j += 1;
            }
            let mut run = 0u64;
            while batch.get(j) == Some(&entry.kmer) {
                run += 1;
                j += 1;
            }

            let taken = run.min(entry.count);
            removed[entry.kmer.prefix() as usize] += taken;
            if entry.count > taken {
                kept.push_back(Entry { count: entry.count - taken, ..entry })?;
            }
        }

        let rank_sums = Self::rank_sums_for(&kept)?;
        let total_removed: u64 = removed.iter().sum();
        debug!(
            batch = batch.len(),
            removed = total_removed,
            dropped = self.entries.len() - kept.len(),
            "applied delete batch"
        );
        self.entries = kept;
        self.rank_sums = rank_sums;
        for (prefix, amount) in removed.into_iter().enumerate() {
            self.remove_prefix(prefix as u8, amount);
        }
        Ok(total_removed)
    }

    /// Number of stored occurrences of `symbol`, 0 when absent. O(log n).
    pub fn count(&self, symbol: &str) -> u64 {
        let Some(kmer) = self.engine.parse_query(symbol) else {
            return 0;
        };
        self.entries
            .get(self.lower_bound(kmer))
            .filter(|entry| entry.kmer == kmer)
            .map_or(0, |entry| entry.count)
    }

    /// Total occurrences of stored k-mers lexicographically >= `symbol`.
    ///
    /// Plain string order, so the query may have any length: `"C"` counts
    /// every k-mer from `"CA..."` on, and `"ACGT"` with k = 2 starts after
    /// `"AC"`. Lowercase is normalised. O(k log n).
    pub fn count_geq(&self, symbol: &str) -> u64 {
        let query = symbol.as_bytes();
        let rank = self.partition_point(|kmer| {
            kmer.bases().cmp(query.iter().map(u8::to_ascii_uppercase)) == Ordering::Less
        });
        self.rank_sums.suffix_sum(rank)
    }

    /// K-mers stored at least `min_count` times, ascending. O(n).
    pub fn frequency_at_least(&self, min_count: u64) -> Vec<String> {
        self.entries
            .iter()
            .filter(|entry| entry.count >= min_count)
            .map(|entry| entry.kmer.to_string())
            .collect()
    }

    /// Total occurrences of k-mers whose first two bases pair with the last
    /// two bases of `symbol` (A<->T, C<->G). O(1).
    pub fn compatible(&self, symbol: &str) -> u64 {
        compatible_prefix(symbol.as_bytes())
            .and_then(|prefix| self.prefix_counts.get(&prefix).copied())
            .unwrap_or(0)
    }

    /// Total occurrences of k-mers starting with the two-base `prefix`.
    pub fn prefix_count(&self, prefix: &str) -> u64 {
        match prefix.as_bytes() {
            [a, b] => prefix_code(*a, *b)
                .and_then(|code| self.prefix_counts.get(&code).copied())
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Iterate `(kmer, count)` in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (Kmer, u64)> + '_ {
        self.entries.iter().map(|entry| (entry.kmer, entry.count))
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            k: self.k(),
            distinct: self.len(),
            total: self.total(),
            prefixes: self
                .prefix_counts
                .iter()
                .map(|(&code, &total)| (prefix_symbols(code), total))
                .collect(),
        }
    }

    /// Read newline-separated strings and insert every length-k window.
    ///
    /// Lines are trimmed; lines shorter than k add nothing. Windows are
    /// buffered and merged in batches of the configured load batch size.
    #[instrument(skip_all, fields(k = self.k()))]
    pub fn load<R: BufRead>(&mut self, reader: R) -> Result<LoadStats> {
        let mut stats = LoadStats::default();
        let mut buffer: Vec<Kmer> = Vec::new();

        for line in reader.lines() {
            let line = line?;
            let line = line.trim();
            stats.lines += 1;
            if line.len() < self.k() {
                stats.short_lines += 1;
                continue;
            }

            let skipped = self.engine.extract_kmers_into_buffer(line.as_bytes(), &mut buffer);
            stats.skipped_windows += skipped as u64;
            if buffer.len() >= self.load_batch_size {
                stats.windows += self.flush(&mut buffer)?;
            }
        }
        stats.windows += self.flush(&mut buffer)?;

        info!(
            lines = stats.lines,
            windows = stats.windows,
            skipped = stats.skipped_windows,
            distinct = self.len(),
            "loaded k-mers"
        );
        Ok(stats)
    }

    /// Open `path` and [`load`](Self::load) it.
    pub fn load_file<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadStats> {
        let file = File::open(path.as_ref())?;
        self.load(BufReader::new(file))
    }

    fn flush(&mut self, buffer: &mut Vec<Kmer>) -> Result<u64> {
        let mut batch = GrowableSequence::with_capacity(buffer.len())?;
        for kmer in buffer.drain(..) {
            batch.push_back(kmer)?;
        }
        let windows = batch.len() as u64;
        self.merge_insert(batch)?;
        Ok(windows)
    }
}

impl std::fmt::Debug for KmerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KmerStore")
            .field("k", &self.k())
            .field("distinct", &self.len())
            .field("total", &self.total())
            .finish()
    }
}
