//! Local Leaderboard
//!
//! Top scores kept on the device, highest first. A remote board can replace
//! this by syncing [`ScoreEntry`] values; the entry shape is the same.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::core::clock::Clock;
use crate::core::store::{load_record, save_record, KeyValueStore};

/// Storage key for the score list.
pub const LEADERBOARD_KEY: &str = "arkPD_lb";

/// Storage key for the player's display name.
pub const PLAYER_NAME_KEY: &str = "arkPD_name";

/// Entries kept.
pub const MAX_ENTRIES: usize = 50;

/// Longest display name, in characters.
pub const MAX_NAME_CHARS: usize = 12;

/// One submitted score.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    /// Player display name.
    pub name: String,
    /// Final score.
    pub score: u64,
    /// Level reached.
    pub level: u32,
    /// Best combo in the run.
    pub combo: u32,
    /// Submission time.
    pub date: DateTime<Utc>,
    /// Unique entry id.
    pub id: Uuid,
}

/// Device-local leaderboard.
#[derive(Debug)]
pub struct Leaderboard<S, C> {
    store: S,
    clock: C,
    entries: Vec<ScoreEntry>,
    player_name: String,
}

impl<S: KeyValueStore, C: Clock> Leaderboard<S, C> {
    /// Load entries and player name from `store`.
    pub fn open(store: S, clock: C) -> Self {
        let mut entries: Vec<ScoreEntry> = load_record(&store, LEADERBOARD_KEY).unwrap_or_default();
        entries.sort_by(|a, b| b.score.cmp(&a.score));
        entries.truncate(MAX_ENTRIES);
        let player_name = load_record(&store, PLAYER_NAME_KEY).unwrap_or_default();
        Self {
            store,
            clock,
            entries,
            player_name,
        }
    }

    /// Set the display name (trimmed, at most [`MAX_NAME_CHARS`]).
    pub fn set_player_name(&mut self, name: &str) {
        self.player_name = name.trim().chars().take(MAX_NAME_CHARS).collect();
        save_record(&self.store, PLAYER_NAME_KEY, &self.player_name);
        debug!("Player name set to {:?}", self.player_name);
    }

    /// Current display name.
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    /// Check if a display name has been set.
    pub fn has_name(&self) -> bool {
        !self.player_name.is_empty()
    }

    /// Record a finished run. Returns false when no name is set.
    pub fn submit_score(&mut self, score: u64, level: u32, max_combo: u32) -> bool {
        if !self.has_name() {
            return false;
        }

        let entry = ScoreEntry {
            name: self.player_name.clone(),
            score,
            level,
            combo: max_combo,
            date: DateTime::from_timestamp_millis(self.clock.now_ms()).unwrap_or_default(),
            id: Uuid::new_v4(),
        };
        info!("Score {} submitted by {}", score, entry.name);

        self.entries.push(entry);
        self.entries.sort_by(|a, b| b.score.cmp(&a.score));
        self.entries.truncate(MAX_ENTRIES);
        save_record(&self.store, LEADERBOARD_KEY, &self.entries);
        true
    }

    /// Best `limit` entries.
    pub fn top_scores(&self, limit: usize) -> &[ScoreEntry] {
        &self.entries[..limit.min(self.entries.len())]
    }

    /// 1-based rank `score` would take on the board.
    pub fn player_rank(&self, score: u64) -> usize {
        self.entries
            .iter()
            .position(|e| score >= e.score)
            .unwrap_or(self.entries.len())
            + 1
    }
}

// =============================================================================
// TESTS
// =============================================================================
