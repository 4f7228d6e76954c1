//! Interstitial Cadence
//!
//! Decides when a between-games interstitial is due. The game counter is
//! persisted so the cadence carries across sessions.

use tracing::debug;

use crate::core::store::{load_record, save_record, KeyValueStore};

/// Storage key for the finished-games counter.
pub const GAME_COUNT_KEY: &str = "arkPD_adcount";

/// Show an interstitial every this many games by default.
pub const DEFAULT_INTERSTITIAL_EVERY: u32 = 3;

/// Persisted every-N-games interstitial schedule.
#[derive(Debug)]
pub struct InterstitialSchedule<S> {
    store: S,
    every: u32,
    game_count: u64,
}

impl<S: KeyValueStore> InterstitialSchedule<S> {
    /// Load the counter from `store`. An `every` of zero is treated as one.
    pub fn open(store: S, every: u32) -> Self {
        let game_count = load_record::<u64, _>(&store, GAME_COUNT_KEY).unwrap_or(0);
        Self {
            store,
            every: every.max(1),
            game_count,
        }
    }

    /// Games finished so far.
    pub fn game_count(&self) -> u64 {
        self.game_count
    }

    /// Record a finished game. Returns true when an interstitial is due.
    pub fn on_game_over(&mut self) -> bool {
        self.game_count += 1;
        save_record(&self.store, GAME_COUNT_KEY, &self.game_count);

        let due = self.game_count % u64::from(self.every) == 0;
        debug!(
            "Game #{} - {} interstitial",
            self.game_count,
            if due { "showing" } else { "skip" }
        );
        due
    }
}
