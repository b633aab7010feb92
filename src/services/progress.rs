//! Daily Progress Store
//!
//! Local per-player progress: lifetime score, plays left today and the daily
//! mine claim. Plays refill at the first access on a new calendar day. A round
//! consumes its play when it ends, not when it starts.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::rng::RandomSource;
use crate::services::{PlayGate, RoundReporter};

/// Rounds allowed per calendar day.
pub const DAILY_PLAYS: u32 = 3;

/// Smallest daily mine reward.
pub const DAILY_MINE_MIN: u32 = 300;

/// Largest daily mine reward.
pub const DAILY_MINE_MAX: u32 = 899;

/// Progress store errors.
#[derive(Debug, thiserror::Error)]
pub enum ProgressError {
    /// Reading or writing the progress file failed.
    #[error("Progress file I/O: {0}")]
    Io(#[from] std::io::Error),

    /// Progress file is not valid JSON.
    #[error("Progress file JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The daily mine was already claimed today.
    #[error("Daily mine already claimed today")]
    AlreadyMinedToday,
}

/// Persisted progress of one player.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProgress {
    /// Lifetime score (rounds plus mine rewards)
    pub total_score: u64,
    /// Rounds left today
    pub plays_left: u32,
    /// Day the play count belongs to
    pub last_played_date: Option<NaiveDate>,
    /// Day the mine was last claimed
    pub last_mined_date: Option<NaiveDate>,
}

impl Default for UserProgress {
    fn default() -> Self {
        Self {
            total_score: 0,
            plays_left: DAILY_PLAYS,
            last_played_date: None,
            last_mined_date: None,
        }
    }
}

impl UserProgress {
    /// Refill plays if `today` is a new day. Returns true if it did.
    pub fn refresh(&mut self, today: NaiveDate, daily_plays: u32) -> bool {
        if self.last_played_date == Some(today) {
            return false;
        }
        self.last_played_date = Some(today);
        self.plays_left = daily_plays;
        true
    }

    /// Has the mine been claimed on `today`?
    pub fn mined_on(&self, today: NaiveDate) -> bool {
        self.last_mined_date == Some(today)
    }
}

/// Progress store, file-backed or in memory.
pub struct ProgressStore {
    path: Option<PathBuf>,
    daily_plays: u32,
    progress: Mutex<UserProgress>,
}

impl ProgressStore {
    /// Store that never touches the disk.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            daily_plays: DAILY_PLAYS,
            progress: Mutex::new(UserProgress::default()),
        }
    }

    /// Open (or start) a JSON progress file. A missing file is a fresh player.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProgressError> {
        let path = path.as_ref().to_path_buf();
        let progress = if path.exists() {
            serde_json::from_str(&fs::read_to_string(&path)?)?
        } else {
            UserProgress::default()
        };
        debug!("Opened progress file {}", path.display());

        Ok(Self {
            path: Some(path),
            daily_plays: DAILY_PLAYS,
            progress: Mutex::new(progress),
        })
    }

    /// Override the daily play allowance.
    pub fn with_daily_plays(mut self, daily_plays: u32) -> Self {
        self.daily_plays = daily_plays;
        self
    }

    fn lock(&self) -> MutexGuard<'_, UserProgress> {
        self.progress.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, progress: &UserProgress) -> Result<(), ProgressError> {
        if let Some(path) = &self.path {
            fs::write(path, serde_json::to_string_pretty(progress)?)?;
        }
        Ok(())
    }

    /// Persist `updated`, then make it the current progress.
    ///
    /// A failed write leaves the in-memory progress untouched.
    fn commit(
        &self,
        progress: &mut MutexGuard<'_, UserProgress>,
        updated: UserProgress,
    ) -> Result<(), ProgressError> {
        self.save(&updated)?;
        **progress = updated;
        Ok(())
    }

    /// Progress as of `today` (refilling plays on a new day).
    pub fn progress_on(&self, today: NaiveDate) -> Result<UserProgress, ProgressError> {
        let mut progress = self.lock();
        let mut updated = progress.clone();
        if updated.refresh(today, self.daily_plays) {
            self.commit(&mut progress, updated.clone())?;
        }
        Ok(updated)
    }

    /// Progress as of the local calendar day.
    pub fn progress(&self) -> Result<UserProgress, ProgressError> {
        self.progress_on(today())
    }

    /// Book a finished round: add its score, use up one play.
    pub fn record_round_on(
        &self,
        today: NaiveDate,
        score: u32,
    ) -> Result<UserProgress, ProgressError> {
        let mut progress = self.lock();
        let mut updated = progress.clone();
        updated.refresh(today, self.daily_plays);
        updated.total_score += u64::from(score);
        updated.plays_left = updated.plays_left.saturating_sub(1);
        self.commit(&mut progress, updated.clone())?;

        info!(
            "Round booked: +{} (total {}, {} plays left)",
            score, updated.total_score, updated.plays_left
        );
        Ok(updated)
    }

    /// Claim today's mine reward, drawn uniformly from
    /// `DAILY_MINE_MIN..=DAILY_MINE_MAX`.
    pub fn daily_mine_on<R: RandomSource + ?Sized>(
        &self,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<u32, ProgressError> {
        let mut progress = self.lock();
        if progress.mined_on(today) {
            return Err(ProgressError::AlreadyMinedToday);
        }

        let span = f64::from(DAILY_MINE_MAX - DAILY_MINE_MIN + 1);
        let reward = (DAILY_MINE_MIN + (rng.next_unit() * span).floor() as u32).min(DAILY_MINE_MAX);

        let mut updated = progress.clone();
        updated.total_score += u64::from(reward);
        updated.last_mined_date = Some(today);
        let total = updated.total_score;
        self.commit(&mut progress, updated)?;

        info!("Daily mine: +{} (total {})", reward, total);
        Ok(reward)
    }

    /// Claim the mine for the local calendar day.
    pub fn daily_mine<R: RandomSource + ?Sized>(&self, rng: &mut R) -> Result<u32, ProgressError> {
        self.daily_mine_on(today(), rng)
    }
}

impl PlayGate for ProgressStore {
    fn can_start_round(&self) -> bool {
        match self.progress() {
            Ok(progress) => progress.plays_left > 0,
            Err(e) => {
                tracing::warn!("Progress unavailable, refusing round: {}", e);
                false
            }
        }
    }
}

impl RoundReporter for ProgressStore {
    fn on_round_end(&self, final_score: u32) -> anyhow::Result<()> {
        self.record_round_on(today(), final_score)?;
        Ok(())
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}
