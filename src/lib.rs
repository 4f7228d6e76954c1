//! # ARK Pulse Drop Core
//!
//! Client-side bookkeeping for ARK Pulse Drop: the daily play quota, the coin
//! ledger, rewarded-ad settlement and the local leaderboard.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PULSE DROP CORE                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  core/           - Injected seams                            │
//! │  ├── clock.rs    - Calendar day and wall-clock time          │
//! │  └── store.rs    - Durable key-value JSON storage            │
//! │                                                              │
//! │  ledger/         - Stateful rules                            │
//! │  ├── tier.rs     - User tiers and daily limits               │
//! │  ├── quota.rs    - Daily play quota, ad-bonus rebates        │
//! │  ├── currency.rs - Coin balance, purchases, equip            │
//! │  └── catalog.rs  - Cosmetic items                            │
//! │                                                              │
//! │  reward/         - Boundary for ad and payment layers        │
//! │  ├── ads.rs      - Interstitial cadence                      │
//! │  ├── mediator.rs - Rewarded ad settlement                    │
//! │  └── payment.rs  - Coin pack credits                         │
//! │                                                              │
//! │  scores/         - Local leaderboard                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Single Writer
//!
//! All ledger operations run on one logical thread per player. Each one is a
//! read-modify-write against the store with no locking. If two devices ever
//! write the same record, the last write wins.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod core;
pub mod ledger;
pub mod reward;
pub mod scores;

// Re-export commonly used types
pub use config::{ConfigError, LedgerConfig};
pub use crate::core::clock::{Clock, ManualClock, SystemClock};
pub use crate::core::store::{FileStore, KeyValueStore, MemoryStore, StoreError};
pub use ledger::currency::{compute_earned_coins, CurrencyLedger, PurchaseError};
pub use ledger::quota::{QuotaDenial, QuotaLedger, QuotaRecord};
pub use ledger::tier::{PlayAllowance, Tier, TierTable};
pub use reward::mediator::{AdOutcome, RewardKind, RewardMediator, RewardOutcome};
pub use scores::leaderboard::Leaderboard;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
