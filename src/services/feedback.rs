//! Feedback sinks that need no device.

use tracing::debug;

use crate::game::events::{FeedbackKind, SoundKind, VisualEffect};
use crate::services::FeedbackSink;

/// Drops every signal.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFeedback;

impl FeedbackSink for NullFeedback {
    fn emit_feedback(&self, _kind: FeedbackKind) {}
    fn emit_sound(&self, _kind: SoundKind) {}
    fn emit_visual_effect(&self, _effect: VisualEffect) {}
}

/// Writes every signal to the `feedback` tracing target at debug level.
///
/// Used by the headless binary; swap in a real sink for a device build.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingFeedback;

impl FeedbackSink for TracingFeedback {
    fn emit_feedback(&self, kind: FeedbackKind) {
        debug!(target: "feedback", "haptic {:?}", kind);
    }

    fn emit_sound(&self, kind: SoundKind) {
        debug!(target: "feedback", "sound {:?}", kind);
    }

    fn emit_visual_effect(&self, effect: VisualEffect) {
        match effect {
            VisualEffect::ScorePop(pop) => debug!(
                target: "feedback",
                "score pop {} ({}) at ({:.0}, {:.0})",
                pop.label,
                pop.color.hex(),
                pop.x,
                pop.y
            ),
            VisualEffect::Shake { duration_ms } => {
                debug!(target: "feedback", "shake {}ms", duration_ms)
            }
            VisualEffect::FreezeOverlay { active } => {
                debug!(target: "feedback", "freeze overlay {}", active)
            }
        }
    }
}
