//! Core deterministic primitives.
//!
//! Randomness, the virtual timeline and state digests. Nothing in here knows
//! about rounds or falling objects.

pub mod hash;
pub mod rng;
pub mod timer;

// Re-export core types
pub use hash::{compute_round_digest, RoundDigest, RoundHasher};
pub use rng::{derive_round_seed, DeterministicRng, RandomSource};
pub use timer::{Fired, Millis, TimerId, TimerQueue};
