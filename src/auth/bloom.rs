//! Bloom filter over revoked access tokens
//!
//! The IAM revocation endpoint publishes the filter as a word array plus its
//! hash-count `k` and bit-size `m`; [`BloomFilter::from_bits`] reconstructs
//! it without re-hashing anything. Local construction uses the standard
//! sizing formulas for a 1% false-positive rate.
//!
//! Keys are hashed once with SHA-256. The digest's first sixteen bytes give
//! two independent 64-bit hashes which are combined with double hashing
//! (`g_i = h1 + i * h2 mod m`) to derive the `k` bit positions.

use sha2::{Digest, Sha256};

const DEFAULT_FALSE_POSITIVE_RATE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BloomFilter {
    words: Vec<u64>,
    k: u32,
    m: u64,
}

impl BloomFilter {
    /// Build an empty filter sized for `expected_insertions` keys at the
    /// default 1% false-positive rate.
    pub fn from_expected_insertions(expected_insertions: usize) -> Self {
        Self::with_false_positive_rate(expected_insertions, DEFAULT_FALSE_POSITIVE_RATE)
    }

    pub fn with_false_positive_rate(expected_insertions: usize, rate: f64) -> Self {
        let n = expected_insertions.max(1) as f64;
        let ln2 = std::f64::consts::LN_2;
        // m = -n * ln(p) / ln(2)^2, k = m/n * ln(2)
        let m = ((-n * rate.ln()) / (ln2 * ln2)).ceil().max(1.0) as u64;
        let k = ((m as f64 / n) * ln2).round().max(1.0) as u32;
        Self {
            words: vec![0; m.div_ceil(64) as usize],
            k,
            m,
        }
    }

    /// Reconstruct a filter from its wire form: the raw 64-bit words plus
    /// the `k` and `m` parameters it was built with. Bit `i` lives in word
    /// `i / 64` at mask `1 << (i % 64)`.
    pub fn from_bits(bits: Vec<u64>, k: u32, m: u64) -> Self {
        let m = m.max(1);
        let mut words = bits;
        words.resize(m.div_ceil(64) as usize, 0);
        Self {
            words,
            k: k.max(1),
            m,
        }
    }

    pub fn put(&mut self, key: &str) {
        let (k, m) = (self.k, self.m);
        for bit in bit_positions(key, k, m) {
            self.words[(bit / 64) as usize] |= 1 << (bit % 64);
        }
    }

    /// Check membership. A `false` is definitive; a `true` may be a false
    /// positive at the configured rate.
    pub fn might_contain(&self, key: &str) -> bool {
        bit_positions(key, self.k, self.m)
            .all(|bit| self.words[(bit / 64) as usize] & (1 << (bit % 64)) != 0)
    }

    pub fn words(&self) -> &[u64] {
        &self.words
    }

    pub fn hash_count(&self) -> u32 {
        self.k
    }

    pub fn bit_size(&self) -> u64 {
        self.m
    }
}

fn bit_positions(key: &str, k: u32, m: u64) -> impl Iterator<Item = u64> {
    let digest = Sha256::digest(key.as_bytes());
    let mut h1 = [0u8; 8];
    let mut h2 = [0u8; 8];
    h1.copy_from_slice(&digest[0..8]);
    h2.copy_from_slice(&digest[8..16]);
    let h1 = u64::from_be_bytes(h1);
    let h2 = u64::from_be_bytes(h2);
    (0..u64::from(k)).map(move |i| h1.wrapping_add(i.wrapping_mul(h2)) % m)
}
