//! Round State Definitions
//!
//! All state mutated during a round. Uses BTreeMap for deterministic
//! iteration order over field objects.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::timer::{Millis, TimerId};
use crate::game::events::{RoundEvent, ScoreEffect};
use crate::game::object::{FallingObject, ObjectId, ObjectKind};

// =============================================================================
// ROUND PHASE
// =============================================================================

/// Top-level round phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RoundPhase {
    /// No round in progress
    #[default]
    Idle,
    /// Clock and spawner running
    Active,
    /// Final score on display, all timers stopped
    Ended,
}

// =============================================================================
// TIMERS
// =============================================================================

/// Payload of every timer the round arms.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RoundTimer {
    /// Round clock (recurring)
    Clock,
    /// Spawn scheduler (recurring)
    Spawn,
    /// Freeze window expiry
    FreezeExpiry,
    /// Object finished falling
    ObjectExpiry(ObjectId),
    /// Score pop lifetime over
    EffectExpiry(u32),
    /// Screen shake over
    ShakeEnd,
}

/// Handles for the round-scoped timers.
///
/// Acquired on entering Active, released on any exit from Active.
#[derive(Clone, Debug, Default)]
pub struct RoundTimers {
    /// Round clock
    pub clock: Option<TimerId>,
    /// Spawn scheduler
    pub spawner: Option<TimerId>,
    /// Freeze expiry
    pub freeze: Option<TimerId>,
    /// Shake end
    pub shake: Option<TimerId>,
}

// =============================================================================
// FREEZE WINDOW
// =============================================================================

/// Freeze effect window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FreezeWindow {
    /// Currently frozen
    pub active: bool,
    /// Timeline instant the window closes
    pub ends_at: Option<Millis>,
}

// =============================================================================
// STATS
// =============================================================================

/// Per-round counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RoundStats {
    /// Objects that entered the field
    pub spawned: u32,
    /// Fruit tapped
    pub fruit_hits: u32,
    /// Hazards tapped
    pub hazard_hits: u32,
    /// Freezes tapped
    pub freeze_hits: u32,
    /// Objects that fell out (including the end-of-round sweep)
    pub misses: u32,
    /// Spawn requests dropped because the field was full
    pub dropped_spawns: u32,
}

impl RoundStats {
    /// Total hits.
    pub fn hits(&self) -> u32 {
        self.fruit_hits + self.hazard_hits + self.freeze_hits
    }

    /// Count a hit.
    pub fn record_hit(&mut self, kind: ObjectKind) {
        match kind {
            ObjectKind::Fruit => self.fruit_hits += 1,
            ObjectKind::Hazard => self.hazard_hits += 1,
            ObjectKind::Freeze => self.freeze_hits += 1,
        }
    }

    /// Hits plus misses.
    pub fn resolved(&self) -> u32 {
        self.hits() + self.misses
    }
}

// =============================================================================
// ROUND STATE
// =============================================================================

/// Complete state of one round.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RoundState {
    /// Current phase
    pub phase: RoundPhase,

    /// Score, never below zero
    pub score: u32,

    /// Clock; only decreases while Active and not frozen
    pub seconds_remaining: u32,

    /// Freeze window
    pub freeze: FreezeWindow,

    /// Hazard shake in progress
    pub shaking: bool,

    /// Objects on the field (BTreeMap for deterministic iteration)
    pub objects: BTreeMap<ObjectId, FallingObject>,

    /// Live score pops
    pub effects: Vec<ScoreEffect>,

    /// Counters
    pub stats: RoundStats,

    /// Events generated since the last take (cleared on take)
    #[serde(skip)]
    pub pending_events: Vec<RoundEvent>,

    /// Next object id (monotonic across rounds)
    next_object_id: ObjectId,

    /// Next effect id (monotonic across rounds)
    next_effect_id: u32,
}

impl RoundState {
    /// Create an idle state.
    pub fn new(round_seconds: u32) -> Self {
        Self {
            phase: RoundPhase::Idle,
            score: 0,
            seconds_remaining: round_seconds,
            freeze: FreezeWindow::default(),
            shaking: false,
            objects: BTreeMap::new(),
            effects: Vec::new(),
            stats: RoundStats::default(),
            pending_events: Vec::new(),
            next_object_id: 0,
            next_effect_id: 0,
        }
    }

    /// Clear everything round-scoped and return to Idle.
    ///
    /// Id counters keep running so ids never repeat within an engine.
    pub fn reset(&mut self, round_seconds: u32) {
        self.phase = RoundPhase::Idle;
        self.score = 0;
        self.seconds_remaining = round_seconds;
        self.freeze = FreezeWindow::default();
        self.shaking = false;
        self.objects.clear();
        self.effects.clear();
        self.stats = RoundStats::default();
    }

    /// Is the freeze window open?
    #[inline]
    pub fn is_frozen(&self) -> bool {
        self.freeze.active
    }

    /// Is a round running?
    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == RoundPhase::Active
    }

    /// Number of objects on the field.
    #[inline]
    pub fn active_count(&self) -> usize {
        self.objects.len()
    }

    /// Allocate an object id.
    pub fn next_object_id(&mut self) -> ObjectId {
        let id = self.next_object_id;
        self.next_object_id += 1;
        id
    }

    /// Allocate an effect id.
    pub fn next_effect_id(&mut self) -> u32 {
        let id = self.next_effect_id;
        self.next_effect_id += 1;
        id
    }

    /// Apply a score change, flooring at zero. Returns the applied delta.
    pub fn apply_score_delta(&mut self, delta: i64) -> i64 {
        let old = self.score as i64;
        let new = (old + delta).clamp(0, u32::MAX as i64);
        self.score = new as u32;
        new - old
    }

    /// Drop a score pop by id.
    pub fn remove_effect(&mut self, effect_id: u32) -> bool {
        let before = self.effects.len();
        self.effects.retain(|e| e.id != effect_id);
        self.effects.len() != before
    }

    /// Take pending events (consumes them).
    pub fn take_events(&mut self) -> Vec<RoundEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Push a round event.
    pub fn push_event(&mut self, event: RoundEvent) {
        self.pending_events.push(event);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_idle() {
        let state = RoundState::new(30);
        assert_eq!(state.phase, RoundPhase::Idle);
        assert_eq!(state.seconds_remaining, 30);
        assert_eq!(state.score, 0);
        assert!(!state.is_frozen());
        assert_eq!(state.active_count(), 0);
    }

    #[test]
    fn test_score_floors_at_zero() {
        let mut state = RoundState::new(30);
        assert_eq!(state.apply_score_delta(-5), 0);
        assert_eq!(state.score, 0);

        assert_eq!(state.apply_score_delta(10), 10);
        assert_eq!(state.apply_score_delta(-5), -5);
        assert_eq!(state.score, 5);

        // Only the part above zero is taken
        assert_eq!(state.apply_score_delta(-7), -5);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_reset_keeps_id_counters() {
        let mut state = RoundState::new(30);
        assert_eq!(state.next_object_id(), 0);
        assert_eq!(state.next_object_id(), 1);
        state.score = 40;
        state.phase = RoundPhase::Ended;

        state.reset(30);
        assert_eq!(state.phase, RoundPhase::Idle);
        assert_eq!(state.score, 0);
        assert_eq!(state.next_object_id(), 2);
    }

    #[test]
    fn test_stats_totals() {
        let mut stats = RoundStats::default();
        stats.record_hit(ObjectKind::Fruit);
        stats.record_hit(ObjectKind::Fruit);
        stats.record_hit(ObjectKind::Hazard);
        stats.misses = 4;
        assert_eq!(stats.hits(), 3);
        assert_eq!(stats.resolved(), 7);
    }
}
