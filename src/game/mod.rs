//! Game Logic Module
//!
//! Everything that happens inside a round. Deterministic given the random
//! source and the tap sequence; no wall clock anywhere.
//!
//! ## Module Structure
//!
//! - `config`: Tunables (durations, probabilities, points)
//! - `object`: Falling objects and the object generator
//! - `state`: Round state, phase and timer handles
//! - `spawn`: Spawn scheduler (cadence, ramp, backpressure)
//! - `clock`: One-second countdown
//! - `freeze`: Freeze window (restart-not-extend)
//! - `hit`: Tap and miss resolution, scoring
//! - `round`: Round state machine tying it all together
//! - `events`: Round events and feedback vocabulary

pub mod clock;
pub mod config;
pub mod events;
pub mod freeze;
pub mod hit;
pub mod object;
pub mod round;
pub mod spawn;
pub mod state;

// Re-export key types
pub use config::{ConfigError, RoundConfig, ScoringConfig, SpawnConfig};
pub use events::{
    ColorTag, FeedbackKind, RoundEvent, RoundEventData, ScoreEffect, SoundKind, VisualEffect,
};
pub use hit::HitOutcome;
pub use object::{FallingObject, ObjectId, ObjectKind, Resolution};
pub use round::{ObjectView, RoundEngine, RoundError, RoundSnapshot};
pub use state::{RoundPhase, RoundState, RoundStats};
