//! Amortized containers and a sorted k-mer store built on them.
//!
//! * [`GrowableSequence`]: circular-buffer array with O(1) pushes at both
//!   ends and O(1) lazy reversal.
//! * [`BitSequence`]: packed bits on top of a `GrowableSequence<u64>` with
//!   O(1) lazy flip and reversal, plus shift and rotate.
//! * [`DoublyLinkedList`]: index-linked list over a `GrowableSequence`
//!   arena with O(1) lazy reversal.
//! * [`KmerStore`]: fixed-length DNA k-mers kept sorted with counts, a
//!   2-base prefix table and rank-ordered cumulative sums.

pub mod bitvec;
pub mod config;
pub mod error;
pub mod fenwick;
pub mod kmer;
pub mod list;
pub mod logging;
pub mod sequence;
pub mod store;

pub use bitvec::BitSequence;
pub use config::{ConfigManager, IndexSettings, KmerStoreConfig};
pub use error::{KmerStoreError, Result};
pub use kmer::{Kmer, KmerEngine, MAX_K, MIN_K};
pub use list::DoublyLinkedList;
pub use logging::{LogLevel, LoggingConfig, LoggingSystem};
pub use sequence::GrowableSequence;
pub use store::{KmerStore, LoadStats, StoreStats};
