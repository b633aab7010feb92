//! # Rodent Royal Round Engine
//!
//! Round engine for Rodent Royal, a timed falling-object tap game: a 30 second
//! round, objects spawning on a cadence, taps resolving hits, a freeze pickup
//! that stops the clock and the field.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    RODENT ROYAL ENGINE                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Deterministic primitives                  │
//! │  ├── rng.rs      - Xorshift128+ PRNG, RandomSource           │
//! │  ├── timer.rs    - Virtual millisecond timer queue           │
//! │  └── hash.rs     - Round digest for replay checks            │
//! │                                                              │
//! │  game/           - Round logic (deterministic)               │
//! │  ├── object.rs   - Falling objects and generator             │
//! │  ├── spawn.rs    - Spawn scheduler                           │
//! │  ├── clock.rs    - Round clock                               │
//! │  ├── freeze.rs   - Freeze controller                         │
//! │  ├── hit.rs      - Hit resolver                              │
//! │  └── round.rs    - Round state machine                       │
//! │                                                              │
//! │  services/       - Collaborators                             │
//! │  ├── progress.rs - Daily plays, total score, daily mine      │
//! │  ├── leaderboard.rs - Top scores                             │
//! │  └── feedback.rs - Haptics/sound/visual sinks                │
//! │                                                              │
//! │  runtime/        - Wall clock (non-deterministic)            │
//! │  └── driver.rs   - tokio real-time driver                    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Determinism
//!
//! `core/` and `game/` never read the wall clock. All randomness comes from a
//! `RandomSource` and all scheduling from the engine's own timeline, so the
//! same seed and the same taps at the same instants give the same round
//! (compare `RoundEngine::digest`).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod core;
pub mod game;
pub mod runtime;
pub mod services;

// Re-export commonly used types
pub use core::rng::{DeterministicRng, RandomSource};
pub use core::timer::Millis;
pub use game::config::RoundConfig;
pub use game::round::{RoundEngine, RoundError, RoundSnapshot};
pub use game::state::RoundPhase;
pub use services::{FeedbackSink, PlayGate, RoundReporter};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Round length in seconds
pub const ROUND_SECONDS: u32 = 30;

/// Most objects on the field at once
pub const MAX_ACTIVE_OBJECTS: usize = 12;
