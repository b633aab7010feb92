//! Round Clock
//!
//! One-second countdown. A frozen tick is a no-op: freeze pauses the countdown
//! itself, not only the spawner.

use crate::core::timer::Millis;
use crate::game::events::{RoundEvent, RoundEventData};
use crate::game::state::RoundState;

/// Result of a clock tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockOutcome {
    /// Round not running; nothing happened
    Inactive,
    /// Frozen; time did not advance
    Paused,
    /// One second elapsed
    Ticked {
        /// Seconds left after the tick
        seconds_remaining: u32,
    },
    /// Reached zero; the round must end
    Expired,
}

/// Advance the round clock by one tick.
pub fn clock_tick(state: &mut RoundState, now: Millis) -> ClockOutcome {
    if !state.is_active() {
        return ClockOutcome::Inactive;
    }
    if state.is_frozen() {
        return ClockOutcome::Paused;
    }

    state.seconds_remaining = state.seconds_remaining.saturating_sub(1);
    state.push_event(RoundEvent::new(
        now,
        RoundEventData::ClockTicked {
            seconds_remaining: state.seconds_remaining,
        },
    ));

    if state.seconds_remaining == 0 {
        ClockOutcome::Expired
    } else {
        ClockOutcome::Ticked {
            seconds_remaining: state.seconds_remaining,
        }
    }
}
