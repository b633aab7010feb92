//! Round State Machine
//!
//! `RoundEngine` owns the round state, every timer handle and the collaborator
//! handles. All callbacks run on one timeline: `advance_to` pops due timers in
//! order and each completes before the next fires, so every callback reads the
//! latest state rather than a snapshot taken when it was scheduled.
//!
//! ```text
//!   Idle --start_round--> Active --clock hits 0--> Ended
//!    ^                                               |
//!    +-------------------- reset -------------------+
//! ```

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::hash::{compute_round_digest, RoundDigest};
use crate::core::rng::{DeterministicRng, RandomSource};
use crate::core::timer::{Fired, Millis, TimerQueue};
use crate::game::clock::{clock_tick, ClockOutcome};
use crate::game::config::{ConfigError, RoundConfig};
use crate::game::events::{RoundEvent, ScoreEffect, VisualEffect};
use crate::game::freeze::expire_freeze;
use crate::game::hit::{resolve_miss, resolve_tap, sweep_misses, HitOutcome};
use crate::game::object::{ObjectId, ObjectKind};
use crate::game::spawn::spawn_tick;
use crate::game::state::{RoundPhase, RoundState, RoundStats, RoundTimer, RoundTimers};
use crate::services::{AlwaysAllow, FeedbackSink, NullFeedback, PlayGate, RoundReporter};

/// Refused round transitions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoundError {
    /// The play gate refused (no plays left today).
    #[error("No plays left today")]
    NoPlaysLeft,

    /// A round is already running.
    #[error("Round in progress")]
    RoundInProgress,
}

/// Renderer view of one object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ObjectView {
    /// Object id (tap target)
    pub id: ObjectId,
    /// Kind
    pub kind: ObjectKind,
    /// Horizontal position, percent
    pub x: u8,
    /// Fall duration in seconds
    pub fall_secs: f64,
    /// Fraction of the fall completed, 0..=1
    pub progress: f64,
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    /// Timeline instant
    pub now_ms: Millis,
    /// Phase
    pub phase: RoundPhase,
    /// Score
    pub score: u32,
    /// Clock
    pub seconds_remaining: u32,
    /// Freeze window open
    pub frozen: bool,
    /// Hazard shake in progress
    pub shaking: bool,
    /// Field objects in id order
    pub objects: Vec<ObjectView>,
    /// Live score pops
    pub effects: Vec<ScoreEffect>,
    /// Counters
    pub stats: RoundStats,
}

/// The round engine.
pub struct RoundEngine<R: RandomSource = DeterministicRng> {
    config: RoundConfig,
    state: RoundState,
    timers: TimerQueue<RoundTimer>,
    handles: RoundTimers,
    rng: R,
    seed: u64,
    rounds_started: u32,
    gate: Arc<dyn PlayGate>,
    reporters: Vec<Arc<dyn RoundReporter>>,
    feedback: Arc<dyn FeedbackSink>,
}

impl RoundEngine<DeterministicRng> {
    /// Engine backed by the deterministic RNG.
    pub fn seeded(config: RoundConfig, seed: u64) -> Result<Self, ConfigError> {
        let mut engine = Self::new(config, DeterministicRng::new(seed))?;
        engine.seed = seed;
        Ok(engine)
    }
}

impl<R: RandomSource> RoundEngine<R> {
    /// Create an idle engine with permissive, silent collaborators.
    ///
    /// Fails when `config` does not pass [`RoundConfig::validate`].
    pub fn new(config: RoundConfig, rng: R) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = RoundState::new(config.round_seconds);
        Ok(Self {
            config,
            state,
            timers: TimerQueue::new(),
            handles: RoundTimers::default(),
            rng,
            seed: 0,
            rounds_started: 0,
            gate: Arc::new(AlwaysAllow),
            reporters: Vec::new(),
            feedback: Arc::new(NullFeedback),
        })
    }

    /// Use this gate for start requests.
    pub fn with_gate(mut self, gate: Arc<dyn PlayGate>) -> Self {
        self.gate = gate;
        self
    }

    /// Add a round-end reporter.
    pub fn with_reporter(mut self, reporter: Arc<dyn RoundReporter>) -> Self {
        self.reporters.push(reporter);
        self
    }

    /// Use this feedback sink.
    pub fn with_feedback(mut self, feedback: Arc<dyn FeedbackSink>) -> Self {
        self.feedback = feedback;
        self
    }

    // -------------------------------------------------------------------------
    // Accessors
    // -------------------------------------------------------------------------

    /// Current phase.
    pub fn phase(&self) -> RoundPhase {
        self.state.phase
    }

    /// Round state.
    pub fn state(&self) -> &RoundState {
        &self.state
    }

    /// Configuration.
    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Current timeline instant.
    pub fn now(&self) -> Millis {
        self.timers.now()
    }

    /// Rounds started on this engine.
    pub fn rounds_started(&self) -> u32 {
        self.rounds_started
    }

    /// Pending timers (clock, spawner, freeze, expiries, effects).
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Take events generated since the last call.
    pub fn take_events(&mut self) -> Vec<RoundEvent> {
        self.state.take_events()
    }

    // -------------------------------------------------------------------------
    // Transitions
    // -------------------------------------------------------------------------

    /// Idle (or Ended) -> Active.
    ///
    /// Refused without any state change while a round runs or when the play
    /// gate says no.
    pub fn start_round(&mut self) -> Result<(), RoundError> {
        if self.state.is_active() {
            warn!("Start refused: round in progress");
            return Err(RoundError::RoundInProgress);
        }
        if !self.gate.can_start_round() {
            info!("Start refused: no plays left");
            return Err(RoundError::NoPlaysLeft);
        }

        // No timer from an earlier round survives
        self.timers.clear();
        self.handles = RoundTimers::default();

        let old_phase = self.state.phase;
        self.state.reset(self.config.round_seconds);
        self.state.phase = RoundPhase::Active;
        self.rounds_started += 1;

        let clock = self.timers.schedule_every(self.config.clock_period_ms, RoundTimer::Clock);
        let spawner = self.timers.schedule_every(self.config.spawn.period_ms, RoundTimer::Spawn);
        self.handles.clock = Some(clock);
        self.handles.spawner = Some(spawner);

        let now = self.timers.now();
        self.state.push_event(RoundEvent::phase_changed(now, old_phase, RoundPhase::Active));
        info!(
            "Round {} started at {}ms ({}s on the clock)",
            self.rounds_started, now, self.state.seconds_remaining
        );
        Ok(())
    }

    /// Ended -> Idle. A no-op when already Idle.
    pub fn reset(&mut self) -> Result<(), RoundError> {
        match self.state.phase {
            RoundPhase::Active => {
                warn!("Reset refused: round in progress");
                Err(RoundError::RoundInProgress)
            }
            RoundPhase::Idle => Ok(()),
            RoundPhase::Ended => {
                self.timers.clear();
                self.handles = RoundTimers::default();
                self.state.reset(self.config.round_seconds);

                let now = self.timers.now();
                self.state.push_event(RoundEvent::phase_changed(
                    now,
                    RoundPhase::Ended,
                    RoundPhase::Idle,
                ));
                debug!("Round reset to idle at {}ms", now);
                Ok(())
            }
        }
    }

    /// Active -> Ended. Runs at most once per round.
    fn end_round(&mut self) -> bool {
        if !self.state.is_active() {
            return false;
        }
        let now = self.timers.now();

        self.timers.cancel_slot(&mut self.handles.clock);
        self.timers.cancel_slot(&mut self.handles.spawner);
        self.timers.cancel_slot(&mut self.handles.freeze);
        self.timers.cancel_slot(&mut self.handles.shake);

        let swept = sweep_misses(&mut self.state, &mut self.timers);
        self.timers.clear();

        self.state.seconds_remaining = 0;
        self.state.freeze = Default::default();
        self.state.shaking = false;
        self.state.effects.clear();
        self.state.phase = RoundPhase::Ended;

        let final_score = self.state.score;
        self.state.push_event(RoundEvent::phase_changed(
            now,
            RoundPhase::Active,
            RoundPhase::Ended,
        ));
        self.state.push_event(RoundEvent::round_ended(now, final_score));

        let stats = self.state.stats;
        info!(
            "Round {} ended at {}ms: score {} ({} hits, {} misses, {} swept)",
            self.rounds_started,
            now,
            final_score,
            stats.hits(),
            stats.misses,
            swept
        );

        for reporter in &self.reporters {
            if let Err(e) = reporter.on_round_end(final_score) {
                warn!("Round reporter failed: {:#}", e);
            }
        }
        true
    }

    // -------------------------------------------------------------------------
    // Input and time
    // -------------------------------------------------------------------------

    /// Tap on an object at screen coordinates.
    ///
    /// `None` for taps that resolve nothing (double taps, taps after a miss,
    /// unknown ids, taps outside an active round).
    pub fn resolve_tap(
        &mut self,
        object_id: ObjectId,
        screen_x: f64,
        screen_y: f64,
    ) -> Option<HitOutcome> {
        resolve_tap(
            &mut self.state,
            &mut self.timers,
            &mut self.handles,
            &self.config,
            self.feedback.as_ref(),
            object_id,
            (screen_x, screen_y),
        )
    }

    /// Run every timer due at or before `until`. Returns how many fired.
    pub fn advance_to(&mut self, until: Millis) -> usize {
        let mut fired = 0;
        while let Some(timer) = self.timers.pop_due(until) {
            self.dispatch(timer);
            fired += 1;
        }
        self.timers.advance_idle(until);
        fired
    }

    /// Advance the timeline by `delta` ms.
    pub fn advance_by(&mut self, delta: Millis) -> usize {
        let until = self.timers.now().saturating_add(delta);
        self.advance_to(until)
    }

    fn dispatch(&mut self, timer: Fired<RoundTimer>) {
        match timer.token {
            RoundTimer::Clock => match clock_tick(&mut self.state, timer.at) {
                ClockOutcome::Expired => {
                    self.end_round();
                }
                ClockOutcome::Ticked { seconds_remaining } => {
                    debug!("Clock: {}s remaining", seconds_remaining);
                }
                ClockOutcome::Paused | ClockOutcome::Inactive => {}
            },
            RoundTimer::Spawn => {
                spawn_tick(&mut self.state, &mut self.timers, &mut self.rng, &self.config.spawn);
            }
            RoundTimer::FreezeExpiry => {
                if expire_freeze(&mut self.state, &mut self.timers, &mut self.handles) {
                    self.feedback.emit_visual_effect(VisualEffect::FreezeOverlay { active: false });
                }
            }
            RoundTimer::ObjectExpiry(object_id) => {
                resolve_miss(&mut self.state, &mut self.timers, object_id);
            }
            RoundTimer::EffectExpiry(effect_id) => {
                self.state.remove_effect(effect_id);
            }
            RoundTimer::ShakeEnd => {
                self.handles.shake = None;
                self.state.shaking = false;
            }
        }
    }

    // -------------------------------------------------------------------------
    // Views
    // -------------------------------------------------------------------------

    /// Renderer snapshot.
    pub fn snapshot(&self) -> RoundSnapshot {
        let objects = self
            .state
            .objects
            .values()
            .map(|obj| {
                let fall_ms = obj.fall_ms().max(1);
                let remaining = obj
                    .paused_remaining
                    .or_else(|| obj.expiry.and_then(|id| self.timers.remaining(id)))
                    .unwrap_or(0)
                    .min(fall_ms);
                ObjectView {
                    id: obj.id,
                    kind: obj.kind,
                    x: obj.x,
                    fall_secs: obj.fall_secs,
                    progress: 1.0 - remaining as f64 / fall_ms as f64,
                }
            })
            .collect();

        RoundSnapshot {
            now_ms: self.timers.now(),
            phase: self.state.phase,
            score: self.state.score,
            seconds_remaining: self.state.seconds_remaining,
            frozen: self.state.is_frozen(),
            shaking: self.state.shaking,
            objects,
            effects: self.state.effects.clone(),
            stats: self.state.stats,
        }
    }

    /// Digest of the observable round state.
    pub fn digest(&self) -> RoundDigest {
        compute_round_digest(self.timers.now(), self.seed, |hasher| {
            hasher.update_u8(self.state.phase as u8);
            hasher.update_u32(self.state.score);
            hasher.update_u32(self.state.seconds_remaining);
            hasher.update_bool(self.state.is_frozen());
            hasher.update_bool(self.state.shaking);

            let stats = &self.state.stats;
            for counter in [
                stats.spawned,
                stats.fruit_hits,
                stats.hazard_hits,
                stats.freeze_hits,
                stats.misses,
                stats.dropped_spawns,
            ] {
                hasher.update_u32(counter);
            }

            for (id, obj) in &self.state.objects {
                hasher.update_u32(*id);
                hasher.update_u8(obj.kind as u8);
                hasher.update_u8(obj.x);
                hasher.update_f64(obj.fall_secs);
            }
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
