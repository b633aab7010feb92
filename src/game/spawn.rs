//! Spawn Scheduler
//!
//! Runs on a fixed cadence while the round is Active. Frozen ticks are skipped,
//! not deferred, and a full field silently drops the request.

use tracing::debug;

use crate::core::rng::RandomSource;
use crate::core::timer::TimerQueue;
use crate::game::config::SpawnConfig;
use crate::game::events::{RoundEvent, RoundEventData};
use crate::game::object::{generate_object, ObjectId};
use crate::game::state::{RoundState, RoundTimer};

/// How many objects this tick asks for (1 or 2).
///
/// Doubles get likelier once `ramp_seconds` or fewer remain.
pub fn spawn_count<R: RandomSource + ?Sized>(
    rng: &mut R,
    seconds_remaining: u32,
    config: &SpawnConfig,
) -> u32 {
    let double_chance = if seconds_remaining > config.ramp_seconds {
        config.double_chance_early
    } else {
        config.double_chance_late
    };

    if rng.next_unit() < double_chance {
        2
    } else {
        1
    }
}

/// One spawner tick. Returns the ids that entered the field.
pub fn spawn_tick<R: RandomSource + ?Sized>(
    state: &mut RoundState,
    timers: &mut TimerQueue<RoundTimer>,
    rng: &mut R,
    config: &SpawnConfig,
) -> Vec<ObjectId> {
    if !state.is_active() || state.is_frozen() {
        return Vec::new();
    }

    let count = spawn_count(rng, state.seconds_remaining, config);
    let now = timers.now();
    let mut spawned = Vec::with_capacity(count as usize);

    for _ in 0..count {
        // Backpressure: drop, never queue
        if state.active_count() >= config.max_active_objects {
            state.stats.dropped_spawns += 1;
            continue;
        }

        let id = state.next_object_id();
        let mut object = generate_object(rng, id, now, config);
        object.expiry = Some(timers.schedule_once(object.fall_ms(), RoundTimer::ObjectExpiry(id)));

        debug!(
            "Spawned {:?} #{} at x={} falling {:.2}s",
            object.kind, id, object.x, object.fall_secs
        );
        state.push_event(RoundEvent::new(
            now,
            RoundEventData::ObjectSpawned {
                object_id: id,
                kind: object.kind,
                x: object.x,
            },
        ));
        state.stats.spawned += 1;
        state.objects.insert(id, object);
        spawned.push(id);
    }

    spawned
}
