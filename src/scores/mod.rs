//! Score tracking.

pub mod leaderboard;

pub use leaderboard::{Leaderboard, ScoreEntry, MAX_ENTRIES};
