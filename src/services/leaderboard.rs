//! In-process Leaderboard
//!
//! Holds every submitted score and pushes the current top ten to subscribers
//! after each submission.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::services::RoundReporter;

/// Entries shown by default.
pub const LEADERBOARD_SIZE: usize = 10;

/// One submitted score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Entry id
    pub id: Uuid,
    /// Player name
    pub name: String,
    /// Final round score
    pub score: u32,
    /// Submission time
    pub timestamp: DateTime<Utc>,
}

/// Score table with a broadcast of the top ten.
pub struct Leaderboard {
    entries: RwLock<Vec<LeaderboardEntry>>,
    updates: broadcast::Sender<Vec<LeaderboardEntry>>,
}

impl Default for Leaderboard {
    fn default() -> Self {
        Self::new()
    }
}

impl Leaderboard {
    /// Empty leaderboard.
    pub fn new() -> Self {
        let (updates, _) = broadcast::channel(16);
        Self {
            entries: RwLock::new(Vec::new()),
            updates,
        }
    }

    /// Add a score. Returns the stored entry.
    pub fn submit(&self, name: impl Into<String>, score: u32) -> LeaderboardEntry {
        let entry = LeaderboardEntry {
            id: Uuid::new_v4(),
            name: name.into(),
            score,
            timestamp: Utc::now(),
        };

        {
            let mut entries = self.entries.write().unwrap_or_else(|poisoned| poisoned.into_inner());
            entries.push(entry.clone());
            // Highest first; ties keep the earlier submission ahead
            entries.sort_by(|a, b| b.score.cmp(&a.score).then(a.timestamp.cmp(&b.timestamp)));
        }

        debug!("Leaderboard entry {} for {}: {}", entry.id, entry.name, entry.score);

        // No subscribers is fine
        let _ = self.updates.send(self.top(LEADERBOARD_SIZE));
        entry
    }

    /// Best `n` entries, highest score first.
    pub fn top(&self, n: usize) -> Vec<LeaderboardEntry> {
        let entries = self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.iter().take(n).cloned().collect()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner()).len()
    }

    /// No entries yet?
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive the top ten after every submission.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<LeaderboardEntry>> {
        self.updates.subscribe()
    }
}

/// Submits each final score to a leaderboard under one player name.
pub struct LeaderboardReporter {
    board: Arc<Leaderboard>,
    name: String,
}

impl LeaderboardReporter {
    /// Reporter for `name`; a blank name gets a generated `Rodent-<n>`.
    pub fn new(board: Arc<Leaderboard>, name: Option<&str>) -> Self {
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => default_player_name(),
        };
        Self { board, name }
    }

    /// Name scores are submitted under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl RoundReporter for LeaderboardReporter {
    fn on_round_end(&self, final_score: u32) -> anyhow::Result<()> {
        let entry = self.board.submit(self.name.clone(), final_score);
        info!("Submitted {} for {} (entry {})", entry.score, entry.name, entry.id);
        Ok(())
    }
}

/// `Rodent-<0..999>`.
pub fn default_player_name() -> String {
    format!("Rodent-{}", Uuid::new_v4().as_u128() % 1000)
}
