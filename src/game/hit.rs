//! Hit Resolver
//!
//! Two paths race for every object: a tap and the end of its fall. Whichever
//! flips the object's resolution flag first wins; the other becomes a no-op.

use tracing::debug;

use crate::core::timer::{Millis, TimerQueue};
use crate::game::config::RoundConfig;
use crate::game::events::{ColorTag, FeedbackKind, RoundEvent, ScoreEffect, SoundKind, VisualEffect};
use crate::game::freeze::trigger_freeze;
use crate::game::object::{ObjectId, ObjectKind, Resolution};
use crate::game::state::{RoundState, RoundTimer, RoundTimers};
use crate::services::FeedbackSink;

/// Result of a successful tap.
#[derive(Clone, Debug, PartialEq)]
pub struct HitOutcome {
    /// Object that was hit
    pub object_id: ObjectId,
    /// Its kind
    pub kind: ObjectKind,
    /// Score change actually applied (after the zero floor)
    pub score_delta: i64,
    /// Score after the hit
    pub score: u32,
    /// Score pop that was emitted
    pub effect: ScoreEffect,
}

/// Resolve a tap on `object_id` at screen position `at`.
///
/// Returns `None` when the round is not Active, the object is gone, or it was
/// already resolved.
pub fn resolve_tap(
    state: &mut RoundState,
    timers: &mut TimerQueue<RoundTimer>,
    handles: &mut RoundTimers,
    config: &RoundConfig,
    feedback: &dyn FeedbackSink,
    object_id: ObjectId,
    at: (f64, f64),
) -> Option<HitOutcome> {
    if !state.is_active() {
        return None;
    }

    // Check-and-set before anything else
    if !state.objects.get_mut(&object_id)?.resolve(Resolution::Hit) {
        return None;
    }
    let mut object = state.objects.remove(&object_id)?;
    timers.cancel_slot(&mut object.expiry);

    let kind = object.kind;
    let scoring = &config.scoring;
    let (delta, label, color, haptic) = match kind {
        ObjectKind::Fruit => (
            scoring.fruit_points as i64,
            format!("+{}", scoring.fruit_points),
            ColorTag::Positive,
            FeedbackKind::Light,
        ),
        ObjectKind::Hazard => (
            -(scoring.hazard_penalty as i64),
            format!("-{}", scoring.hazard_penalty),
            ColorTag::Negative,
            FeedbackKind::Heavy,
        ),
        ObjectKind::Freeze => (0, "FREEZE".to_string(), ColorTag::Freeze, FeedbackKind::Medium),
    };

    let applied = state.apply_score_delta(delta);
    state.stats.record_hit(kind);

    feedback.emit_sound(SoundKind::for_kind(kind));
    feedback.emit_feedback(haptic);

    let effect = push_score_effect(state, timers, at, label, color, config.score_effect_ms);
    feedback.emit_visual_effect(VisualEffect::ScorePop(effect.clone()));

    match kind {
        ObjectKind::Hazard => {
            start_shake(state, timers, handles, config.shake_ms);
            feedback.emit_visual_effect(VisualEffect::Shake {
                duration_ms: config.shake_ms,
            });
        }
        ObjectKind::Freeze => {
            trigger_freeze(state, timers, handles, config.freeze_ms);
            feedback.emit_visual_effect(VisualEffect::FreezeOverlay { active: true });
        }
        ObjectKind::Fruit => {}
    }

    debug!("Hit {:?} #{} ({:+}) -> score {}", kind, object_id, applied, state.score);
    state.push_event(RoundEvent::object_hit(timers.now(), object_id, kind, applied, state.score));

    Some(HitOutcome {
        object_id,
        kind,
        score_delta: applied,
        score: state.score,
        effect,
    })
}

/// Resolve an object whose fall completed without a tap.
///
/// No score change and no effect. Returns false if it was already resolved.
pub fn resolve_miss(
    state: &mut RoundState,
    timers: &mut TimerQueue<RoundTimer>,
    object_id: ObjectId,
) -> bool {
    let Some(object) = state.objects.get_mut(&object_id) else {
        return false;
    };
    if !object.resolve(Resolution::Missed) {
        return false;
    }
    let Some(mut object) = state.objects.remove(&object_id) else {
        return false;
    };
    timers.cancel_slot(&mut object.expiry);

    state.stats.misses += 1;
    debug!("Missed {:?} #{}", object.kind, object_id);
    state.push_event(RoundEvent::object_missed(timers.now(), object_id, object.kind));
    true
}

/// Resolve every object still on the field as a miss. Returns how many.
pub fn sweep_misses(state: &mut RoundState, timers: &mut TimerQueue<RoundTimer>) -> u32 {
    let ids: Vec<ObjectId> = state.objects.keys().copied().collect();
    ids.into_iter()
        .filter(|id| resolve_miss(state, timers, *id))
        .count() as u32
}

fn push_score_effect(
    state: &mut RoundState,
    timers: &mut TimerQueue<RoundTimer>,
    at: (f64, f64),
    label: String,
    color: ColorTag,
    lifetime_ms: Millis,
) -> ScoreEffect {
    let id = state.next_effect_id();
    let effect = ScoreEffect {
        id,
        x: at.0,
        y: at.1,
        label,
        color,
    };
    timers.schedule_once(lifetime_ms, RoundTimer::EffectExpiry(id));
    state.effects.push(effect.clone());
    effect
}

fn start_shake(
    state: &mut RoundState,
    timers: &mut TimerQueue<RoundTimer>,
    handles: &mut RoundTimers,
    shake_ms: Millis,
) {
    timers.cancel_slot(&mut handles.shake);
    handles.shake = Some(timers.schedule_once(shake_ms, RoundTimer::ShakeEnd));
    state.shaking = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::object::FallingObject;
    use crate::game::state::RoundPhase;
    use crate::services::NullFeedback;

    struct Field {
        state: RoundState,
        timers: TimerQueue<RoundTimer>,
        handles: RoundTimers,
        config: RoundConfig,
    }

    impl Field {
        fn new() -> Self {
            let mut state = RoundState::new(30);
            state.phase = RoundPhase::Active;
            Self {
                state,
                timers: TimerQueue::new(),
                handles: RoundTimers::default(),
                config: RoundConfig::default(),
            }
        }

        fn drop_object(&mut self, kind: ObjectKind) -> ObjectId {
            let id = self.state.next_object_id();
            let mut obj = FallingObject::new(id, kind, 50, 3.0, self.timers.now());
            let expiry = self.timers.schedule_once(obj.fall_ms(), RoundTimer::ObjectExpiry(id));
            obj.expiry = Some(expiry);
            self.state.objects.insert(id, obj);
            id
        }

        fn tap(&mut self, id: ObjectId) -> Option<HitOutcome> {
            resolve_tap(
                &mut self.state,
                &mut self.timers,
                &mut self.handles,
                &self.config,
                &NullFeedback,
                id,
                (120.0, 340.0),
            )
        }
    }

    #[test]
    fn test_fruit_hit_scores_and_removes() {
        let mut field = Field::new();
        let id = field.drop_object(ObjectKind::Fruit);

        let outcome = field.tap(id).unwrap();
        assert_eq!(outcome.score_delta, 10);
        assert_eq!(outcome.score, 10);
        assert_eq!(outcome.effect.label, "+10");
        assert_eq!(outcome.effect.color, ColorTag::Positive);
        assert_eq!((outcome.effect.x, outcome.effect.y), (120.0, 340.0));
        assert!(field.state.objects.is_empty());
        assert_eq!(field.state.effects.len(), 1);
    }

    #[test]
    fn test_hazard_at_zero_stays_zero_and_shakes() {
        let mut field = Field::new();
        let id = field.drop_object(ObjectKind::Hazard);

        let outcome = field.tap(id).unwrap();
        assert_eq!(outcome.score, 0);
        assert_eq!(outcome.score_delta, 0);
        assert_eq!(outcome.effect.label, "-5");
        assert!(field.state.shaking);
        assert!(field.handles.shake.is_some());
    }

    #[test]
    fn test_freeze_hit_triggers_freeze_without_scoring() {
        let mut field = Field::new();
        field.state.score = 20;
        let id = field.drop_object(ObjectKind::Freeze);

        let outcome = field.tap(id).unwrap();
        assert_eq!(outcome.score, 20);
        assert_eq!(outcome.effect.label, "FREEZE");
        assert!(field.state.is_frozen());
        assert_eq!(field.state.freeze.ends_at, Some(2000));
    }

    #[test]
    fn test_double_tap_is_noop() {
        let mut field = Field::new();
        let id = field.drop_object(ObjectKind::Fruit);

        assert!(field.tap(id).is_some());
        assert!(field.tap(id).is_none());
        assert_eq!(field.state.score, 10);
        assert_eq!(field.state.stats.hits(), 1);
    }

    #[test]
    fn test_miss_after_hit_is_noop() {
        let mut field = Field::new();
        let id = field.drop_object(ObjectKind::Fruit);

        field.tap(id).unwrap();
        assert!(!resolve_miss(&mut field.state, &mut field.timers, id));
        assert_eq!(field.state.stats.misses, 0);
    }

    #[test]
    fn test_tap_after_miss_is_noop() {
        let mut field = Field::new();
        let id = field.drop_object(ObjectKind::Fruit);

        assert!(resolve_miss(&mut field.state, &mut field.timers, id));
        assert!(field.tap(id).is_none());
        assert_eq!(field.state.score, 0);
        assert_eq!(field.state.stats.misses, 1);
    }

    #[test]
    fn test_hit_cancels_expiry_timer() {
        let mut field = Field::new();
        let id = field.drop_object(ObjectKind::Fruit);
        let expiry = field.state.objects[&id].expiry.unwrap();

        field.tap(id).unwrap();
        assert!(!field.timers.is_pending(expiry));
    }

    #[test]
    fn test_tap_ignored_outside_active() {
        let mut field = Field::new();
        let id = field.drop_object(ObjectKind::Fruit);
        field.state.phase = RoundPhase::Ended;

        assert!(field.tap(id).is_none());
        assert!(field.state.objects[&id].is_pending());
    }

    #[test]
    fn test_sweep_resolves_everything_once() {
        let mut field = Field::new();
        for _ in 0..5 {
            field.drop_object(ObjectKind::Fruit);
        }
        let tapped = field.drop_object(ObjectKind::Hazard);
        field.tap(tapped).unwrap();

        assert_eq!(sweep_misses(&mut field.state, &mut field.timers), 5);
        assert!(field.state.objects.is_empty());
        assert_eq!(field.state.stats.resolved(), 6);
        assert_eq!(sweep_misses(&mut field.state, &mut field.timers), 0);
    }
}
