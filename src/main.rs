//! Rodent Royal Demo
//!
//! Plays one headless round with a simple bot on virtual time, books it into
//! an in-memory progress store and leaderboard, then replays the same taps to
//! check the round is deterministic.
//!
//! Usage: `rodent-royal [config.json]`

use std::sync::Arc;

use anyhow::Context;
use chrono::Local;
use tracing::info;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use rodent_royal::{
    core::rng::derive_round_seed,
    game::{events::RoundEventData, object::ObjectKind, ObjectId},
    services::{
        leaderboard::LEADERBOARD_SIZE, Leaderboard, LeaderboardReporter, ProgressStore,
        TracingFeedback,
    },
    DeterministicRng, Millis, RoundConfig, RoundEngine, RoundPhase, VERSION,
};

/// Bot reaction interval.
const BOT_STEP_MS: Millis = 250;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Rodent Royal v{}", VERSION);

    let config = match std::env::args().nth(1) {
        Some(path) => {
            RoundConfig::load(&path).with_context(|| format!("loading config {}", path))?
        }
        None => RoundConfig::default(),
    };
    info!(
        "Round: {}s, spawn every {}ms, freeze {}ms",
        config.round_seconds, config.spawn.period_ms, config.freeze_ms
    );

    demo_round(config)
}

/// Run one bot round and verify it replays identically.
fn demo_round(config: RoundConfig) -> anyhow::Result<()> {
    info!("=== Starting Demo Round ===");

    let round_id = Uuid::new_v4();
    let day = Local::now().date_naive();
    let seed = derive_round_seed(&round_id, day);
    info!("Round ID: {}", hex::encode(round_id.as_bytes()));
    info!("Seed: {}", hex::encode(seed.to_le_bytes()));

    let progress = Arc::new(ProgressStore::in_memory());
    let board = Arc::new(Leaderboard::new());
    let reporter = Arc::new(LeaderboardReporter::new(board.clone(), None));
    info!("Playing as {}", reporter.name());

    let mut engine = RoundEngine::seeded(config.clone(), seed)?
        .with_gate(progress.clone())
        .with_reporter(progress.clone())
        .with_reporter(reporter)
        .with_feedback(Arc::new(TracingFeedback));

    engine.start_round()?;

    // Recorded (instant, object) taps for the replay
    let mut taps: Vec<(Millis, ObjectId)> = Vec::new();

    while engine.phase() == RoundPhase::Active {
        engine.advance_by(BOT_STEP_MS);

        if let Some(target) = pick_target(&engine) {
            if engine.resolve_tap(target, 180.0, 320.0).is_some() {
                taps.push((engine.now(), target));
            }
        }

        for event in engine.take_events() {
            match event.data {
                RoundEventData::ClockTicked { seconds_remaining } if seconds_remaining % 5 == 0 => {
                    let snapshot = engine.snapshot();
                    info!(
                        "{}s left: score {}, {} on field, {} hits / {} misses",
                        seconds_remaining,
                        snapshot.score,
                        snapshot.objects.len(),
                        snapshot.stats.hits(),
                        snapshot.stats.misses
                    );
                }
                RoundEventData::FreezeStarted { ends_at } => {
                    info!("Freeze until {}ms", ends_at);
                }
                _ => {}
            }
        }
    }

    // Print final results
    info!("=== Round Results ===");
    let stats = engine.state().stats;
    info!("Final score: {}", engine.state().score);
    info!(
        "Spawned {}, fruit {}, hazards {}, freezes {}, missed {}, dropped {}",
        stats.spawned,
        stats.fruit_hits,
        stats.hazard_hits,
        stats.freeze_hits,
        stats.misses,
        stats.dropped_spawns
    );
    let digest = engine.digest();
    info!("Round digest: {}", hex::encode(digest));

    let today = progress.progress()?;
    info!("Total score {}, {} plays left today", today.total_score, today.plays_left);

    let mut mine_rng = DeterministicRng::new(seed);
    let reward = progress.daily_mine(&mut mine_rng)?;
    info!("Daily mine: +{}", reward);

    for (rank, entry) in board.top(LEADERBOARD_SIZE).iter().enumerate() {
        info!("#{}: {} - {}", rank + 1, entry.name, entry.score);
    }

    // Verify determinism by replaying
    info!("=== Verifying Determinism ===");
    let mut replay = RoundEngine::seeded(config, seed)?;
    replay.start_round()?;
    for (at, target) in &taps {
        replay.advance_to(*at);
        replay.resolve_tap(*target, 180.0, 320.0);
    }
    while replay.phase() == RoundPhase::Active {
        replay.advance_by(BOT_STEP_MS);
    }

    let replay_digest = replay.digest();
    info!("Replay digest: {}", hex::encode(replay_digest));

    if digest == replay_digest {
        info!("DETERMINISM VERIFIED: Digests match!");
        Ok(())
    } else {
        anyhow::bail!("DETERMINISM FAILURE: digests differ")
    }
}

/// Oldest non-hazard object that is at least 40% down the screen.
fn pick_target(engine: &RoundEngine) -> Option<ObjectId> {
    engine
        .snapshot()
        .objects
        .into_iter()
        .find(|o| o.kind != ObjectKind::Hazard && o.progress >= 0.4)
        .map(|o| o.id)
}
