//! Round Events
//!
//! Events generated during a round for logging, replay checks and renderers,
//! plus the feedback vocabulary handed to the feedback sink.

use serde::{Deserialize, Serialize};

use crate::core::timer::Millis;
use crate::game::object::{ObjectId, ObjectKind};
use crate::game::state::RoundPhase;

/// Haptic feedback strength.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FeedbackKind {
    /// Fruit hit
    Light,
    /// Freeze hit
    Medium,
    /// Hazard hit
    Heavy,
}

/// Sound cue.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundKind {
    /// Rising pop
    Fruit,
    /// Low boom
    Hazard,
    /// Glassy chime
    Freeze,
}

impl SoundKind {
    /// Cue for a hit on this kind.
    pub fn for_kind(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Fruit => SoundKind::Fruit,
            ObjectKind::Hazard => SoundKind::Hazard,
            ObjectKind::Freeze => SoundKind::Freeze,
        }
    }
}

/// Score pop color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorTag {
    /// Gained points
    Positive,
    /// Lost points
    Negative,
    /// Freeze triggered
    Freeze,
}

impl ColorTag {
    /// CSS hex color used by the web client.
    pub fn hex(self) -> &'static str {
        match self {
            ColorTag::Positive => "#00ff88",
            ColorTag::Negative => "#ff4757",
            ColorTag::Freeze => "#74b9ff",
        }
    }
}

/// Transient score pop shown where a tap landed. Not authoritative state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreEffect {
    /// Unique within the engine
    pub id: u32,
    /// Tap position, screen pixels
    pub x: f64,
    /// Tap position, screen pixels
    pub y: f64,
    /// Text, e.g. "+10"
    pub label: String,
    /// Color
    pub color: ColorTag,
}

/// Visual signal for the renderer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum VisualEffect {
    /// Show a score pop
    ScorePop(ScoreEffect),
    /// Shake the play field
    Shake {
        /// Shake length
        duration_ms: Millis,
    },
    /// Freeze overlay on/off
    FreezeOverlay {
        /// Overlay visible
        active: bool,
    },
}

/// Round event data.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum RoundEventData {
    /// Phase changed
    PhaseChanged {
        old_phase: RoundPhase,
        new_phase: RoundPhase,
    },

    /// Object entered the field
    ObjectSpawned {
        object_id: ObjectId,
        kind: ObjectKind,
        x: u8,
    },

    /// Object was tapped
    ObjectHit {
        object_id: ObjectId,
        kind: ObjectKind,
        score_delta: i64,
        new_score: u32,
    },

    /// Object fell out without a tap
    ObjectMissed {
        object_id: ObjectId,
        kind: ObjectKind,
    },

    /// Round clock advanced
    ClockTicked {
        seconds_remaining: u32,
    },

    /// Freeze window (re)armed
    FreezeStarted {
        ends_at: Millis,
    },

    /// Freeze window closed
    FreezeEnded,

    /// Round finished
    RoundEnded {
        final_score: u32,
    },
}

/// A round event with its timeline instant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundEvent {
    /// Timeline instant
    pub at: Millis,
    /// Event data
    pub data: RoundEventData,
}

impl RoundEvent {
    /// Create a new event.
    pub fn new(at: Millis, data: RoundEventData) -> Self {
        Self { at, data }
    }

    /// Create phase changed event.
    pub fn phase_changed(at: Millis, old_phase: RoundPhase, new_phase: RoundPhase) -> Self {
        Self::new(at, RoundEventData::PhaseChanged { old_phase, new_phase })
    }

    /// Create object hit event.
    pub fn object_hit(
        at: Millis,
        object_id: ObjectId,
        kind: ObjectKind,
        score_delta: i64,
        new_score: u32,
    ) -> Self {
        Self::new(
            at,
            RoundEventData::ObjectHit {
                object_id,
                kind,
                score_delta,
                new_score,
            },
        )
    }

    /// Create object missed event.
    pub fn object_missed(at: Millis, object_id: ObjectId, kind: ObjectKind) -> Self {
        Self::new(at, RoundEventData::ObjectMissed { object_id, kind })
    }

    /// Create round ended event.
    pub fn round_ended(at: Millis, final_score: u32) -> Self {
        Self::new(at, RoundEventData::RoundEnded { final_score })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_palette() {
        assert_eq!(ColorTag::Positive.hex(), "#00ff88");
        assert_eq!(ColorTag::Negative.hex(), "#ff4757");
        assert_eq!(ColorTag::Freeze.hex(), "#74b9ff");
    }

    #[test]
    fn test_sound_per_kind() {
        assert_eq!(SoundKind::for_kind(ObjectKind::Fruit), SoundKind::Fruit);
        assert_eq!(SoundKind::for_kind(ObjectKind::Hazard), SoundKind::Hazard);
        assert_eq!(SoundKind::for_kind(ObjectKind::Freeze), SoundKind::Freeze);
    }

    #[test]
    fn test_event_json_shape() {
        let event = RoundEvent::object_hit(1_200, 3, ObjectKind::Hazard, -5, 0);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["at"], 1_200);
        assert_eq!(json["data"]["ObjectHit"]["score_delta"], -5);
        assert_eq!(json["data"]["ObjectHit"]["kind"], "Hazard");
    }
}
