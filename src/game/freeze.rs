//! Freeze Controller
//!
//! The only writer of `state.freeze`. A trigger opens (or re-opens) a fixed
//! window measured from the latest trigger; durations never stack. While the
//! window is open the objects on the field stop falling.

use tracing::debug;

use crate::core::timer::{Millis, TimerQueue};
use crate::game::events::{RoundEvent, RoundEventData};
use crate::game::state::{FreezeWindow, RoundState, RoundTimer, RoundTimers};

/// Open or re-arm the freeze window. Returns when it will close.
pub fn trigger_freeze(
    state: &mut RoundState,
    timers: &mut TimerQueue<RoundTimer>,
    handles: &mut RoundTimers,
    freeze_ms: Millis,
) -> Millis {
    let now = timers.now();
    let was_frozen = state.is_frozen();

    // Restart, don't extend
    timers.cancel_slot(&mut handles.freeze);
    handles.freeze = Some(timers.schedule_once(freeze_ms, RoundTimer::FreezeExpiry));

    let ends_at = now.saturating_add(freeze_ms);
    state.freeze = FreezeWindow {
        active: true,
        ends_at: Some(ends_at),
    };

    if !was_frozen {
        pause_objects(state, timers);
    }

    debug!("Freeze armed until {}ms (re-trigger: {})", ends_at, was_frozen);
    state.push_event(RoundEvent::new(now, RoundEventData::FreezeStarted { ends_at }));
    ends_at
}

/// Close the freeze window. Returns false if it was not open.
pub fn expire_freeze(
    state: &mut RoundState,
    timers: &mut TimerQueue<RoundTimer>,
    handles: &mut RoundTimers,
) -> bool {
    if !state.is_frozen() {
        return false;
    }

    timers.cancel_slot(&mut handles.freeze);
    state.freeze = FreezeWindow::default();
    resume_objects(state, timers);

    debug!("Freeze expired at {}ms", timers.now());
    state.push_event(RoundEvent::new(timers.now(), RoundEventData::FreezeEnded));
    true
}

/// Capture each object's remaining fall and stop its expiry.
fn pause_objects(state: &mut RoundState, timers: &mut TimerQueue<RoundTimer>) {
    for object in state.objects.values_mut() {
        if let Some(expiry) = object.expiry.take() {
            let remaining = timers.remaining(expiry).unwrap_or(0);
            timers.cancel(expiry);
            object.paused_remaining = Some(remaining);
        }
    }
}

/// Re-arm expiries with the captured remaining fall.
fn resume_objects(state: &mut RoundState, timers: &mut TimerQueue<RoundTimer>) {
    for (id, object) in state.objects.iter_mut() {
        if let Some(remaining) = object.paused_remaining.take() {
            object.expiry = Some(timers.schedule_once(remaining, RoundTimer::ObjectExpiry(*id)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::object::{FallingObject, ObjectKind};
    use crate::game::state::RoundPhase;

    fn setup() -> (RoundState, TimerQueue<RoundTimer>, RoundTimers) {
        let mut state = RoundState::new(30);
        state.phase = RoundPhase::Active;
        (state, TimerQueue::new(), RoundTimers::default())
    }

    #[test]
    fn test_freeze_window_closes_after_fixed_duration() {
        let (mut state, mut timers, mut handles) = setup();

        assert_eq!(trigger_freeze(&mut state, &mut timers, &mut handles, 2000), 2000);
        assert!(state.is_frozen());

        let fired = timers.pop_due(1999);
        assert!(fired.is_none());
        let fired = timers.pop_due(2000).unwrap();
        assert_eq!(fired.token, RoundTimer::FreezeExpiry);

        assert!(expire_freeze(&mut state, &mut timers, &mut handles));
        assert!(!state.is_frozen());
        assert!(!expire_freeze(&mut state, &mut timers, &mut handles));
    }

    #[test]
    fn test_retrigger_restarts_instead_of_stacking() {
        let (mut state, mut timers, mut handles) = setup();
        trigger_freeze(&mut state, &mut timers, &mut handles, 2000);

        timers.advance_idle(1500);
        let ends_at = trigger_freeze(&mut state, &mut timers, &mut handles, 2000);
        assert_eq!(ends_at, 3500);
        assert_eq!(state.freeze.ends_at, Some(3500));

        // Only one expiry pending, at 3500 (not 4000)
        assert_eq!(timers.len(), 1);
        assert!(timers.pop_due(3499).is_none());
        assert_eq!(timers.pop_due(3500).unwrap().at, 3500);
    }

    #[test]
    fn test_objects_pause_and_resume() {
        let (mut state, mut timers, mut handles) = setup();
        let mut obj = FallingObject::new(0, ObjectKind::Fruit, 50, 3.0, 0);
        obj.expiry = Some(timers.schedule_once(3000, RoundTimer::ObjectExpiry(0)));
        state.objects.insert(0, obj);

        timers.advance_idle(1000);
        trigger_freeze(&mut state, &mut timers, &mut handles, 2000);
        assert_eq!(state.objects[&0].paused_remaining, Some(2000));
        assert!(state.objects[&0].expiry.is_none());

        // Freeze expiry at 3000; the object would have expired then without freeze
        let fired = timers.pop_due(3000).unwrap();
        assert_eq!(fired.token, RoundTimer::FreezeExpiry);
        expire_freeze(&mut state, &mut timers, &mut handles);

        let expiry = state.objects[&0].expiry.unwrap();
        assert_eq!(timers.deadline(expiry), Some(5000));
    }
}
