//! Collaborator Interfaces
//!
//! The round engine drives these but never depends on how they work:
//!
//! - `PlayGate`: may a new round start (daily play allowance)
//! - `RoundReporter`: fire-and-forget final score notification
//! - `FeedbackSink`: haptics, sound cues and visual signals
//!
//! Implementations shipped with the crate:
//!
//! - `progress`: local daily progress store (gate + reporter)
//! - `leaderboard`: in-process top scores (reporter)
//! - `feedback`: tracing-backed and silent sinks

pub mod feedback;
pub mod leaderboard;
pub mod progress;

use crate::game::events::{FeedbackKind, SoundKind, VisualEffect};

/// Gate consulted before Idle -> Active.
pub trait PlayGate: Send + Sync {
    /// May a round start right now?
    fn can_start_round(&self) -> bool;
}

/// Receives the final score once per round.
///
/// Errors are logged by the engine and otherwise ignored.
pub trait RoundReporter: Send + Sync {
    /// Called exactly once when a round ends.
    fn on_round_end(&self, final_score: u32) -> anyhow::Result<()>;
}

/// Best-effort output for haptics, audio and visuals.
///
/// Implementations swallow their own failures.
pub trait FeedbackSink: Send + Sync {
    /// Haptic pulse.
    fn emit_feedback(&self, kind: FeedbackKind);
    /// Sound cue.
    fn emit_sound(&self, kind: SoundKind);
    /// Visual signal.
    fn emit_visual_effect(&self, effect: VisualEffect);
}

/// Gate that always allows a round.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

impl PlayGate for AlwaysAllow {
    fn can_start_round(&self) -> bool {
        true
    }
}

pub use feedback::{NullFeedback, TracingFeedback};
pub use leaderboard::{Leaderboard, LeaderboardEntry, LeaderboardReporter};
pub use progress::{ProgressError, ProgressStore, UserProgress};
