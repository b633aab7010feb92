//! Round Digests
//!
//! SHA-256 over the observable round state. Two engines that saw the same seed
//! and the same tap script must end with the same digest.

use sha2::{Digest, Sha256};

/// Digest output type (256 bits / 32 bytes)
pub type RoundDigest = [u8; 32];

/// Ordered hasher for round state. Order of updates is part of the digest.
pub struct RoundHasher {
    hasher: Sha256,
}

impl RoundHasher {
    /// Create a new hasher with domain separator.
    pub fn new(domain: &[u8]) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        Self { hasher }
    }

    /// Create hasher for round state.
    pub fn for_round_state() -> Self {
        Self::new(b"RODENT_ROYAL_ROUND_V1")
    }

    /// Update with a u8 value.
    #[inline]
    pub fn update_u8(&mut self, value: u8) {
        self.hasher.update([value]);
    }

    /// Update with a u32 value (little-endian).
    #[inline]
    pub fn update_u32(&mut self, value: u32) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with a u64 value (little-endian).
    #[inline]
    pub fn update_u64(&mut self, value: u64) {
        self.hasher.update(value.to_le_bytes());
    }

    /// Update with an f64 via its bit pattern.
    #[inline]
    pub fn update_f64(&mut self, value: f64) {
        self.hasher.update(value.to_bits().to_le_bytes());
    }

    /// Update with a boolean.
    #[inline]
    pub fn update_bool(&mut self, value: bool) {
        self.update_u8(value as u8);
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> RoundDigest {
        self.hasher.finalize().into()
    }
}

/// Compute a round digest.
///
/// Timeline position and seed are always hashed first; the closure adds the
/// round-specific state.
pub fn compute_round_digest<F>(now_ms: u64, seed: u64, add_state: F) -> RoundDigest
where
    F: FnOnce(&mut RoundHasher),
{
    let mut hasher = RoundHasher::for_round_state();
    hasher.update_u64(now_ms);
    hasher.update_u64(seed);
    add_state(&mut hasher);
    hasher.finalize()
}
