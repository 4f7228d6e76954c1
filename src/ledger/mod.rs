//! Ledger Module
//!
//! The only stateful logic in the crate: the daily play quota and the coin
//! ledger. Both read-modify-write through an injected store, assuming a single
//! writer per player.
//!
//! ## Module Structure
//!
//! - `tier`: User tiers and their daily limits
//! - `quota`: Daily play quota with ad-bonus rebates
//! - `currency`: Coin balance, purchases, equip
//! - `catalog`: Cosmetic items offered for coins

pub mod catalog;
pub mod currency;
pub mod quota;
pub mod tier;

// Re-export key types
pub use catalog::{skin_catalog, CatalogItem, DEFAULT_ITEM_ID};
pub use currency::{compute_earned_coins, CurrencyAccount, CurrencyLedger, PurchaseError};
pub use quota::{rollover_if_stale, QuotaDenial, QuotaLedger, QuotaRecord};
pub use tier::{PlayAllowance, Tier, TierLimits, TierTable, UnknownTier};
