//! 2-bit packed k-mers over the {A, C, G, T} alphabet
//!
//! Each base takes 2 bits (A=00, C=01, G=10, T=11) with the first base in
//! the most significant position. For k-mers of equal length the packed
//! value therefore orders exactly like the string, which is what lets the
//! index compare and binary-search plain integers.

use crate::error::{KmerStoreError, Result};
use std::fmt;

/// Maximum supported k-mer length (limited by u64 bit representation)
pub const MAX_K: usize = 32;

/// Minimum supported k-mer length (prefix queries need two bases)
pub const MIN_K: usize = 2;

/// Number of distinct 2-base prefixes
pub const PREFIX_COUNT: usize = 16;

const BASES: [u8; 4] = *b"ACGT";

#[inline]
fn base_to_bits(base: u8) -> Option<u64> {
    match base {
        b'A' | b'a' => Some(0),
        b'C' | b'c' => Some(1),
        b'G' | b'g' => Some(2),
        b'T' | b't' => Some(3),
        _ => None,
    }
}

/// Complement of a base: A<->T, C<->G. Returns `None` outside the alphabet.
pub fn complement(base: u8) -> Option<u8> {
    match base {
        b'A' | b'a' => Some(b'T'),
        b'C' | b'c' => Some(b'G'),
        b'G' | b'g' => Some(b'C'),
        b'T' | b't' => Some(b'A'),
        _ => None,
    }
}

/// Pack two bases into a prefix code in `0..PREFIX_COUNT`.
pub fn prefix_code(first: u8, second: u8) -> Option<u8> {
    let hi = base_to_bits(first)?;
    let lo = base_to_bits(second)?;
    Some(((hi << 2) | lo) as u8)
}

/// Render a prefix code back to its two bases.
pub fn prefix_symbols(code: u8) -> String {
    let code = code as usize % PREFIX_COUNT;
    [BASES[code >> 2], BASES[code & 0b11]]
        .iter()
        .map(|&base| char::from(base))
        .collect()
}

/// Prefix code that a k-mer must start with to pair with `symbol`: its
/// last two bases, each complemented.
pub fn compatible_prefix(symbol: &[u8]) -> Option<u8> {
    let [.., a, b] = symbol else {
        return None;
    };
    prefix_code(complement(*a)?, complement(*b)?)
}

/// A fixed-length k-mer packed into a 64-bit integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Kmer {
    /// Packed bases, first base in the high bits
    packed: u64,
    k: usize,
}

impl Kmer {
    /// Pack `symbols` into a k-mer of length `k`.
    ///
    /// # Returns
    /// * `Ok(Kmer)` - Valid k-mer
    /// * `Err(KmerStoreError)` - Wrong length or a base outside {A, C, G, T}
    pub fn from_symbols(symbols: &[u8], k: usize) -> Result<Self> {
        if symbols.len() != k {
            return Err(KmerStoreError::length_mismatch(k, symbols.len()));
        }
        let mut packed = 0u64;
        for (position, &base) in symbols.iter().enumerate() {
            let bits = base_to_bits(base)
                .ok_or_else(|| KmerStoreError::invalid_base(base as char, position))?;
            packed = (packed << 2) | bits;
        }
        Ok(Kmer { packed, k })
    }

    /// Bases as uppercase ASCII, first base first.
    pub fn bases(&self) -> impl Iterator<Item = u8> {
        let packed = self.packed;
        (0..self.k)
            .rev()
            .map(move |i| BASES[((packed >> (2 * i)) & 0b11) as usize])
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Code of the first two bases.
    pub fn prefix(&self) -> u8 {
        ((self.packed >> (2 * (self.k - 2))) & 0xF) as u8
    }
}

impl fmt::Display for Kmer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for base in self.bases() {
            write!(f, "{}", char::from(base))?;
        }
        Ok(())
    }
}

/// Validates k and turns symbol strings into k-mers.
#[derive(Debug, Clone, Copy)]
pub struct KmerEngine {
    k: usize,
    /// Keeps the low 2k bits while rolling
    mask: u64,
}

impl KmerEngine {
    /// Create a new k-mer engine with specified k-mer length
    ///
    /// # Returns
    /// * `Ok(KmerEngine)` - Successfully created engine
    /// * `Err(KmerStoreError)` - k outside `MIN_K..=MAX_K`
    pub fn new(k: usize) -> Result<Self> {
        if !(MIN_K..=MAX_K).contains(&k) {
            return Err(KmerStoreError::invalid_kmer_length(k, MIN_K, MAX_K));
        }
        let mask = if k == MAX_K {
            u64::MAX
        } else {
            (1u64 << (2 * k)) - 1
        };
        Ok(KmerEngine { k, mask })
    }

    pub fn k(&self) -> usize {
        self.k
    }

    /// Parse a single k-mer of this engine's length.
    pub fn parse(&self, symbol: &str) -> Result<Kmer> {
        Kmer::from_symbols(symbol.as_bytes(), self.k)
    }

    /// Parse a query symbol, returning `None` for anything that can never be
    /// stored (wrong length or a base outside the alphabet).
    pub fn parse_query(&self, symbol: &str) -> Option<Kmer> {
        self.parse(symbol).ok()
    }

    /// Append every length-k window of `line` to `buffer` using a rolling
    /// encoding. Windows containing a base outside the alphabet are skipped.
    ///
    /// # Returns
    /// Number of windows skipped
    pub fn extract_kmers_into_buffer(&self, line: &[u8], buffer: &mut Vec<Kmer>) -> usize {
        if line.len() < self.k {
            return 0;
        }
        let windows = line.len() - self.k + 1;
        let before = buffer.len();
        buffer.reserve(windows);

        let mut code = 0u64;
        let mut run = 0usize;
        for &base in line {
            match base_to_bits(base) {
                Some(bits) => {
                    code = ((code << 2) | bits) & self.mask;
                    run += 1;
                    if run >= self.k {
                        buffer.push(Kmer {
                            packed: code,
                            k: self.k,
                        });
                    }
                }
                None => {
                    code = 0;
                    run = 0;
                }
            }
        }
        windows - (buffer.len() - before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_rejects_bad_k() {
        assert!(KmerEngine::new(1).is_err());
        assert!(KmerEngine::new(33).is_err());
        assert!(KmerEngine::new(2).is_ok());
        assert!(KmerEngine::new(32).is_ok());
    }

    #[test]
    fn test_packing_orders_like_strings() {
        let engine = KmerEngine::new(3).unwrap();
        let mut words = ["TAC", "AAA", "GCT", "ACG", "TTT", "CAT"];
        let mut kmers: Vec<Kmer> = words.iter().map(|w| engine.parse(w).unwrap()).collect();

        words.sort();
        kmers.sort();
        let rendered: Vec<String> = kmers.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, words);
    }

    #[test]
    fn test_parse_errors() {
        let engine = KmerEngine::new(4).unwrap();
        assert!(matches!(
            engine.parse("ACG"),
            Err(KmerStoreError::KmerLengthMismatch { expected: 4, found: 3 })
        ));
        assert!(matches!(
            engine.parse("ACNT"),
            Err(KmerStoreError::InvalidBase { base: 'N', position: 2 })
        ));
        assert_eq!(engine.parse("acgt").unwrap().to_string(), "ACGT");
        assert!(engine.parse_query("ACGTA").is_none());
    }

    #[test]
    fn test_prefix_and_complement() {
        let engine = KmerEngine::new(5).unwrap();
        let kmer = engine.parse("GTACA").unwrap();
        assert_eq!(prefix_symbols(kmer.prefix()), "GT");

        assert_eq!(compatible_prefix(b"GGAC"), prefix_code(b'T', b'G'));
        assert_eq!(prefix_symbols(compatible_prefix(b"AC").unwrap()), "TG");
        assert_eq!(compatible_prefix(b"A"), None);
        assert_eq!(compatible_prefix(b"AN"), None);
    }

    #[test]
    fn test_max_k_round_trip() {
        let engine = KmerEngine::new(MAX_K).unwrap();
        let symbol = "TTTTGGGGCCCCAAAATTTTGGGGCCCCAAAA";
        let kmer = engine.parse(symbol).unwrap();
        assert_eq!(kmer.to_string(), symbol);
        assert_eq!(prefix_symbols(kmer.prefix()), "TT");
        assert_eq!(kmer.bases().collect::<Vec<u8>>(), symbol.as_bytes());
    }

    #[test]
    fn test_extract_windows() {
        let engine = KmerEngine::new(3).unwrap();
        let mut buffer = Vec::new();

        let skipped = engine.extract_kmers_into_buffer(b"ACGTA", &mut buffer);
        assert_eq!(skipped, 0);
        let rendered: Vec<String> = buffer.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["ACG", "CGT", "GTA"]);

        buffer.clear();
        let skipped = engine.extract_kmers_into_buffer(b"ACNGTAC", &mut buffer);
        assert_eq!(skipped, 3);
        let rendered: Vec<String> = buffer.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["GTA", "TAC"]);

        buffer.clear();
        assert_eq!(engine.extract_kmers_into_buffer(b"AC", &mut buffer), 0);
        assert!(buffer.is_empty());
    }
}
