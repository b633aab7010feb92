//! Real-time Round Driver
//!
//! Runs a `RoundEngine` on its own tokio task. Wall-clock time since the
//! driver started is mapped one-to-one onto the engine's millisecond timeline;
//! a fixed interval advances it and commands from the handle are applied in
//! between, each after catching the engine up to "now".

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, trace};

use crate::core::rng::RandomSource;
use crate::core::timer::Millis;
use crate::game::hit::HitOutcome;
use crate::game::object::ObjectId;
use crate::game::round::{RoundEngine, RoundError, RoundSnapshot};

/// Driver errors.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Driver task has stopped.
    #[error("Round driver stopped")]
    ChannelClosed,

    /// Engine refused the request.
    #[error("Round error: {0}")]
    Round(#[from] RoundError),
}

/// Driver tunables.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Step interval (default 16ms, about one frame).
    pub step: Duration,
    /// Command queue depth.
    pub command_capacity: usize,
    /// Snapshot broadcast depth; slow subscribers lag.
    pub snapshot_capacity: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            step: Duration::from_millis(16),
            command_capacity: 64,
            snapshot_capacity: 64,
        }
    }
}

enum DriverCommand {
    Start {
        reply: oneshot::Sender<Result<(), RoundError>>,
    },
    Tap {
        object_id: ObjectId,
        x: f64,
        y: f64,
        reply: oneshot::Sender<Option<HitOutcome>>,
    },
    Reset {
        reply: oneshot::Sender<Result<(), RoundError>>,
    },
    Snapshot {
        reply: oneshot::Sender<RoundSnapshot>,
    },
    Shutdown,
}

/// Cloneable handle to a running driver.
#[derive(Clone)]
pub struct RoundDriverHandle {
    commands: mpsc::Sender<DriverCommand>,
    snapshots: broadcast::Sender<RoundSnapshot>,
}

impl RoundDriverHandle {
    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> DriverCommand,
    ) -> Result<T, DriverError> {
        let (reply, rx) = oneshot::channel();
        self.commands
            .send(make(reply))
            .await
            .map_err(|_| DriverError::ChannelClosed)?;
        rx.await.map_err(|_| DriverError::ChannelClosed)
    }

    /// Start a round.
    pub async fn start(&self) -> Result<(), DriverError> {
        self.request(|reply| DriverCommand::Start { reply }).await??;
        Ok(())
    }

    /// Tap an object at screen coordinates.
    pub async fn tap(
        &self,
        object_id: ObjectId,
        x: f64,
        y: f64,
    ) -> Result<Option<HitOutcome>, DriverError> {
        self.request(|reply| DriverCommand::Tap { object_id, x, y, reply }).await
    }

    /// Return an ended round to idle.
    pub async fn reset(&self) -> Result<(), DriverError> {
        self.request(|reply| DriverCommand::Reset { reply }).await??;
        Ok(())
    }

    /// Current snapshot.
    pub async fn snapshot(&self) -> Result<RoundSnapshot, DriverError> {
        self.request(|reply| DriverCommand::Snapshot { reply }).await
    }

    /// Stop the driver task.
    pub async fn shutdown(&self) -> Result<(), DriverError> {
        self.commands
            .send(DriverCommand::Shutdown)
            .await
            .map_err(|_| DriverError::ChannelClosed)
    }

    /// Snapshots published after every step that changed the round.
    pub fn subscribe(&self) -> broadcast::Receiver<RoundSnapshot> {
        self.snapshots.subscribe()
    }
}

/// Spawns engines onto tokio tasks.
pub struct RoundDriver;

impl RoundDriver {
    /// Move `engine` onto a new task. The join handle gives it back after
    /// shutdown.
    pub fn spawn<R>(
        engine: RoundEngine<R>,
        config: DriverConfig,
    ) -> (RoundDriverHandle, JoinHandle<RoundEngine<R>>)
    where
        R: RandomSource + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (snapshot_tx, _) = broadcast::channel(config.snapshot_capacity);

        let handle = RoundDriverHandle {
            commands: command_tx,
            snapshots: snapshot_tx.clone(),
        };
        let task = tokio::spawn(run_driver_loop(engine, config, command_rx, snapshot_tx));
        (handle, task)
    }
}

struct Clock {
    origin: Instant,
    base: Millis,
}

impl Clock {
    fn now(&self) -> Millis {
        self.base + self.origin.elapsed().as_millis() as Millis
    }
}

/// Catch up to wall time; publish if anything happened.
fn step<R: RandomSource>(
    engine: &mut RoundEngine<R>,
    clock: &Clock,
    snapshots: &broadcast::Sender<RoundSnapshot>,
) {
    let fired = engine.advance_to(clock.now());
    let events = engine.take_events();
    if fired > 0 || !events.is_empty() {
        trace!("Driver step: {} timers, {} events", fired, events.len());
        publish(engine, snapshots);
    }
}

fn publish<R: RandomSource>(engine: &RoundEngine<R>, snapshots: &broadcast::Sender<RoundSnapshot>) {
    // No subscribers is fine
    let _ = snapshots.send(engine.snapshot());
}

async fn run_driver_loop<R: RandomSource>(
    mut engine: RoundEngine<R>,
    config: DriverConfig,
    mut commands: mpsc::Receiver<DriverCommand>,
    snapshots: broadcast::Sender<RoundSnapshot>,
) -> RoundEngine<R> {
    let clock = Clock {
        origin: Instant::now(),
        base: engine.now(),
    };
    let mut ticker = interval(config.step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!("Round driver running ({}ms step)", config.step.as_millis());

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                step(&mut engine, &clock, &snapshots);
            }
            command = commands.recv() => {
                // Taps and starts land on the current instant
                step(&mut engine, &clock, &snapshots);

                match command {
                    Some(DriverCommand::Start { reply }) => {
                        let result = engine.start_round();
                        if result.is_ok() {
                            engine.take_events();
                            publish(&engine, &snapshots);
                        }
                        let _ = reply.send(result);
                    }
                    Some(DriverCommand::Tap { object_id, x, y, reply }) => {
                        let outcome = engine.resolve_tap(object_id, x, y);
                        if outcome.is_some() {
                            engine.take_events();
                            publish(&engine, &snapshots);
                        }
                        let _ = reply.send(outcome);
                    }
                    Some(DriverCommand::Reset { reply }) => {
                        let result = engine.reset();
                        if result.is_ok() {
                            engine.take_events();
                            publish(&engine, &snapshots);
                        }
                        let _ = reply.send(result);
                    }
                    Some(DriverCommand::Snapshot { reply }) => {
                        let _ = reply.send(engine.snapshot());
                    }
                    Some(DriverCommand::Shutdown) | None => break,
                }
            }
        }
    }

    debug!("Round driver stopped at {}ms", engine.now());
    engine
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::RoundConfig;
    use crate::game::state::RoundPhase;

    fn spawn_driver() -> (RoundDriverHandle, JoinHandle<RoundEngine>) {
        let engine = RoundEngine::seeded(RoundConfig::default(), 2024).unwrap();
        RoundDriver::spawn(engine, DriverConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_runs_to_completion() {
        let (driver, _task) = spawn_driver();
        driver.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(10_050)).await;
        let snapshot = driver.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, RoundPhase::Active);
        assert_eq!(snapshot.seconds_remaining, 20);

        tokio::time::sleep(Duration::from_secs(21)).await;
        let snapshot = driver.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, RoundPhase::Ended);
        assert!(snapshot.objects.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tap_through_driver() {
        let (driver, _task) = spawn_driver();
        driver.start().await.unwrap();

        // First spawner tick is at 550ms
        tokio::time::sleep(Duration::from_millis(600)).await;
        let snapshot = driver.snapshot().await.unwrap();
        let target = snapshot.objects.first().map(|o| o.id).unwrap();

        let outcome = driver.tap(target, 50.0, 50.0).await.unwrap().unwrap();
        assert_eq!(outcome.object_id, target);
        assert!(driver.tap(target, 50.0, 50.0).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_refusals_surface_as_errors() {
        let (driver, _task) = spawn_driver();
        driver.start().await.unwrap();

        assert!(matches!(
            driver.start().await,
            Err(DriverError::Round(RoundError::RoundInProgress))
        ));
        assert!(matches!(
            driver.reset().await,
            Err(DriverError::Round(RoundError::RoundInProgress))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_round_start() {
        let (driver, _task) = spawn_driver();
        let mut updates = driver.subscribe();

        driver.start().await.unwrap();
        let snapshot = updates.recv().await.unwrap();
        assert_eq!(snapshot.phase, RoundPhase::Active);
        assert_eq!(snapshot.seconds_remaining, 30);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_returns_engine() {
        let (driver, task) = spawn_driver();
        driver.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(2_500)).await;

        driver.shutdown().await.unwrap();
        let engine = task.await.unwrap();
        assert_eq!(engine.phase(), RoundPhase::Active);
        assert_eq!(engine.state().seconds_remaining, 28);

        assert!(matches!(driver.snapshot().await, Err(DriverError::ChannelClosed)));
    }
}
