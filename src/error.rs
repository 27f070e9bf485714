//! Error handling for kmerstore
//!
//! The containers are fail-soft: out-of-range reads return `None` and
//! out-of-range writes are ignored. The errors below cover the remaining
//! cases: allocation failure while growing, malformed k-mers handed to the
//! index, and the I/O and configuration layers around it.

use std::collections::TryReserveError;
use thiserror::Error;

/// Error type for all kmerstore operations
#[derive(Error, Debug)]
pub enum KmerStoreError {
    /// I/O errors while reading input or configuration files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Symbol outside the {A, C, G, T} alphabet
    #[error("Invalid base {base:?} at position {position}")]
    InvalidBase { base: char, position: usize },

    /// K-mer whose length differs from the index window length
    #[error("K-mer length {found} does not match window length {expected}")]
    KmerLengthMismatch { expected: usize, found: usize },

    /// Invalid window length
    #[error("K-mer length {k} is invalid (must be between {min} and {max})")]
    InvalidKmerLength { k: usize, min: usize, max: usize },

    /// Growing a container failed to allocate
    #[error("Capacity overflow while growing to {requested} slots")]
    CapacityOverflow {
        requested: usize,
        #[source]
        source: TryReserveError,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Parse error for numeric or other structured data
    #[error("Parse error: {0}")]
    Parse(String),
}

impl KmerStoreError {
    /// Create an InvalidBase error
    pub fn invalid_base(base: char, position: usize) -> Self {
        Self::InvalidBase { base, position }
    }

    /// Create a KmerLengthMismatch error
    pub fn length_mismatch(expected: usize, found: usize) -> Self {
        Self::KmerLengthMismatch { expected, found }
    }

    /// Create an InvalidKmerLength error with current and valid ranges
    pub fn invalid_kmer_length(k: usize, min: usize, max: usize) -> Self {
        Self::InvalidKmerLength { k, min, max }
    }

    /// Create a CapacityOverflow error from a failed reservation
    pub fn capacity_overflow(requested: usize, source: TryReserveError) -> Self {
        Self::CapacityOverflow { requested, source }
    }

    /// Create a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }
}

/// Result type alias for kmerstore operations
pub type Result<T> = std::result::Result<T, KmerStoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_display() {
        let err = KmerStoreError::invalid_base('N', 3);
        assert_eq!(err.to_string(), "Invalid base 'N' at position 3");

        let err = KmerStoreError::length_mismatch(5, 3);
        assert_eq!(err.to_string(), "K-mer length 3 does not match window length 5");

        let err = KmerStoreError::invalid_kmer_length(40, 2, 32);
        assert_eq!(err.to_string(), "K-mer length 40 is invalid (must be between 2 and 32)");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let err: KmerStoreError = io_err.into();

        match err {
            KmerStoreError::Io(_) => (),
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_capacity_overflow_keeps_source() {
        let mut v: Vec<u64> = Vec::new();
        let source = v.try_reserve_exact(usize::MAX).unwrap_err();
        let err = KmerStoreError::capacity_overflow(usize::MAX, source);

        assert!(err.to_string().contains("Capacity overflow"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_helper_methods() {
        let err = KmerStoreError::config("Invalid batch size");
        assert!(err.to_string().contains("Invalid batch size"));

        let err = KmerStoreError::parse("Invalid number format");
        assert!(err.to_string().contains("Invalid number format"));
    }
}
