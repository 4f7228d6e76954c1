//! Coin Balance and Cosmetic Unlocks
//!
//! One [`CurrencyAccount`] per local player. The ledger keeps it in memory
//! and writes it through to the store after every mutation.
//!
//! ## Invariants
//!
//! - The balance is unsigned and is only debited after a funds check.
//! - The default item is always unlocked.
//! - The equipped item is always unlocked.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::store::{load_record, save_record, KeyValueStore};
use crate::ledger::catalog::{find_item, CatalogItem, DEFAULT_ITEM_ID};

/// Storage key for the currency account.
pub const ACCOUNT_KEY: &str = "arkPD_shop";

/// Coins earned for a finished game.
///
/// `floor(score * 0.15) + max_combo * 2 + level * 5`, computed in integers.
pub fn compute_earned_coins(score: u64, max_combo: u32, level: u32) -> u64 {
    (score.saturating_mul(15) / 100)
        .saturating_add(u64::from(max_combo) * 2)
        .saturating_add(u64::from(level) * 5)
}

fn default_equipped() -> String {
    DEFAULT_ITEM_ID.to_string()
}

fn default_unlocked() -> BTreeSet<String> {
    BTreeSet::from([DEFAULT_ITEM_ID.to_string()])
}

/// Persisted coin balance and unlock set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyAccount {
    #[serde(rename = "coins", default)]
    balance: u64,
    #[serde(default = "default_equipped")]
    equipped: String,
    #[serde(default = "default_unlocked")]
    unlocked: BTreeSet<String>,
}

impl Default for CurrencyAccount {
    fn default() -> Self {
        Self {
            balance: 0,
            equipped: default_equipped(),
            unlocked: default_unlocked(),
        }
    }
}

impl CurrencyAccount {
    /// Spendable coins.
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Currently equipped item id.
    pub fn equipped(&self) -> &str {
        &self.equipped
    }

    /// All unlocked item ids.
    pub fn unlocked(&self) -> &BTreeSet<String> {
        &self.unlocked
    }

    /// Restore the invariants on an account read from storage.
    fn repaired(mut self) -> Self {
        self.unlocked.insert(DEFAULT_ITEM_ID.to_string());
        if !self.unlocked.contains(&self.equipped) {
            debug!("Equipped item {} not unlocked, reverting to default", self.equipped);
            self.equipped = default_equipped();
        }
        self
    }
}

/// Purchase refusals.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PurchaseError {
    /// Item is not in the catalog.
    #[error("item not found: {0}")]
    NotFound(String),

    /// Item is already unlocked.
    #[error("item already owned: {0}")]
    AlreadyOwned(String),

    /// Balance is below the item price.
    #[error("insufficient funds: balance {balance}, price {price}")]
    InsufficientFunds {
        /// Balance at the time of the attempt.
        balance: u64,
        /// Item price.
        price: u64,
    },

    /// The debit could not be written; nothing changed.
    #[error("purchase not persisted")]
    NotPersisted,
}

/// Currency ledger over a persistent store.
#[derive(Debug)]
pub struct CurrencyLedger<S> {
    store: S,
    account: CurrencyAccount,
}

impl<S: KeyValueStore> CurrencyLedger<S> {
    /// Load the account from `store`, creating a default one on first run.
    pub fn open(store: S) -> Self {
        let account = match load_record::<CurrencyAccount, _>(&store, ACCOUNT_KEY) {
            Some(account) => account.repaired(),
            None => {
                info!("Creating new currency account");
                let account = CurrencyAccount::default();
                save_record(&store, ACCOUNT_KEY, &account);
                account
            }
        };
        Self { store, account }
    }

    /// Snapshot of the account.
    pub fn account(&self) -> &CurrencyAccount {
        &self.account
    }

    /// Spendable coins.
    pub fn balance(&self) -> u64 {
        self.account.balance
    }

    /// Check if an item is unlocked.
    pub fn is_unlocked(&self, item_id: &str) -> bool {
        self.account.unlocked.contains(item_id)
    }

    /// Currently equipped item id.
    pub fn equipped_id(&self) -> &str {
        &self.account.equipped
    }

    /// Catalog entry for the equipped item, falling back to the first entry
    /// when the equipped id is not in `catalog`.
    pub fn equipped_item<'a>(&self, catalog: &'a [CatalogItem]) -> Option<&'a CatalogItem> {
        find_item(catalog, &self.account.equipped).or_else(|| catalog.first())
    }

    /// Credit coins. Returns false (and changes nothing) when the new
    /// balance cannot be written.
    pub fn earn(&mut self, amount: u64) -> bool {
        let mut next = self.account.clone();
        next.balance = next.balance.saturating_add(amount);
        if !self.commit(next) {
            return false;
        }
        info!("Earned {} coins, balance {}", amount, self.account.balance);
        true
    }

    /// Buy and unlock a catalog item.
    pub fn purchase(
        &mut self,
        item_id: &str,
        catalog: &[CatalogItem],
    ) -> Result<(), PurchaseError> {
        let item = find_item(catalog, item_id)
            .ok_or_else(|| PurchaseError::NotFound(item_id.to_string()))?;

        if self.is_unlocked(item_id) {
            return Err(PurchaseError::AlreadyOwned(item_id.to_string()));
        }

        let remaining = self.account.balance.checked_sub(item.price).ok_or(
            PurchaseError::InsufficientFunds {
                balance: self.account.balance,
                price: item.price,
            },
        )?;

        let mut next = self.account.clone();
        next.balance = remaining;
        next.unlocked.insert(item.id.clone());
        if !self.commit(next) {
            return Err(PurchaseError::NotPersisted);
        }
        info!("Purchased {} for {}, balance {}", item.id, item.price, remaining);
        Ok(())
    }

    /// Equip an unlocked item. Returns false (and changes nothing) when the
    /// item is locked or the choice cannot be written.
    pub fn equip(&mut self, item_id: &str) -> bool {
        if !self.is_unlocked(item_id) {
            debug!("Cannot equip locked item {}", item_id);
            return false;
        }
        let mut next = self.account.clone();
        next.equipped = item_id.to_string();
        if !self.commit(next) {
            return false;
        }
        info!("Equipped {}", item_id);
        true
    }

    /// Write `next` and adopt it only once the store has it.
    fn commit(&mut self, next: CurrencyAccount) -> bool {
        if !save_record(&self.store, ACCOUNT_KEY, &next) {
            return false;
        }
        self.account = next;
        true
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::{FlakyStore, MemoryStore};
    use crate::ledger::catalog::skin_catalog;
    use serde_json::json;

    #[test]
    fn test_compute_earned_coins() {
        assert_eq!(compute_earned_coins(1000, 20, 3), 205);
        assert_eq!(compute_earned_coins(0, 0, 0), 0);
        // floor(7 * 0.15) = 1
        assert_eq!(compute_earned_coins(7, 0, 0), 1);
        assert_eq!(compute_earned_coins(u64::MAX, u32::MAX, u32::MAX), u64::MAX);
    }

    #[test]
    fn test_new_account_defaults() {
        let store = MemoryStore::new();
        let ledger = CurrencyLedger::open(&store);
        assert_eq!(ledger.balance(), 0);
        assert_eq!(ledger.equipped_id(), DEFAULT_ITEM_ID);
        assert!(ledger.is_unlocked(DEFAULT_ITEM_ID));
        assert_eq!(
            store.load(ACCOUNT_KEY).unwrap(),
            Some(json!({"coins": 0, "equipped": "default", "unlocked": ["default"]}))
        );
    }

    #[test]
    fn test_purchase_outcomes() {
        let store = MemoryStore::new();
        let catalog = skin_catalog();
        let mut ledger = CurrencyLedger::open(&store);
        ledger.earn(300);

        assert_eq!(
            ledger.purchase("pack_l", &catalog),
            Err(PurchaseError::NotFound("pack_l".into()))
        );
        assert_eq!(
            ledger.purchase("violet", &catalog),
            Err(PurchaseError::InsufficientFunds { balance: 300, price: 350 })
        );
        assert_eq!(ledger.balance(), 300);

        assert_eq!(ledger.purchase("neon_green", &catalog), Ok(()));
        assert_eq!(ledger.balance(), 100);
        assert!(ledger.is_unlocked("neon_green"));

        assert_eq!(
            ledger.purchase("neon_green", &catalog),
            Err(PurchaseError::AlreadyOwned("neon_green".into()))
        );
        assert_eq!(
            ledger.purchase(DEFAULT_ITEM_ID, &catalog),
            Err(PurchaseError::AlreadyOwned(DEFAULT_ITEM_ID.into()))
        );
        assert_eq!(ledger.balance(), 100);
    }

    #[test]
    fn test_insufficient_funds_against_custom_catalog() {
        let store = MemoryStore::new();
        let catalog = vec![CatalogItem::new("pack_l", "Large pack", 350)];
        let mut ledger = CurrencyLedger::open(&store);
        ledger.earn(300);

        assert!(matches!(
            ledger.purchase("pack_l", &catalog),
            Err(PurchaseError::InsufficientFunds { .. })
        ));
        assert_eq!(ledger.balance(), 300);
        assert!(!ledger.is_unlocked("pack_l"));
    }

    #[test]
    fn test_exact_balance_purchase() {
        let store = MemoryStore::new();
        let mut ledger = CurrencyLedger::open(&store);
        ledger.earn(2000);
        assert_eq!(ledger.purchase("rainbow", &skin_catalog()), Ok(()));
        assert_eq!(ledger.balance(), 0);
    }

    #[test]
    fn test_equip_requires_unlock() {
        let store = MemoryStore::new();
        let catalog = skin_catalog();
        let mut ledger = CurrencyLedger::open(&store);

        assert!(!ledger.equip("gold"));
        assert_eq!(ledger.equipped_id(), DEFAULT_ITEM_ID);

        ledger.earn(1000);
        ledger.purchase("gold", &catalog).unwrap();
        assert!(ledger.equip("gold"));
        assert_eq!(ledger.equipped_item(&catalog).map(|i| i.name.as_str()), Some("Pure Gold"));

        assert!(ledger.equip(DEFAULT_ITEM_ID));
    }

    #[test]
    fn test_account_survives_reopen() {
        let store = MemoryStore::new();
        {
            let mut ledger = CurrencyLedger::open(&store);
            ledger.earn(500);
            ledger.purchase("rose", &skin_catalog()).unwrap();
            ledger.equip("rose");
        }
        let ledger = CurrencyLedger::open(&store);
        assert_eq!(ledger.balance(), 0);
        assert_eq!(ledger.equipped_id(), "rose");
        assert!(ledger.is_unlocked("rose"));
    }

    #[test]
    fn test_stored_account_is_repaired() {
        let store = MemoryStore::new();
        store
            .save(ACCOUNT_KEY, &json!({"coins": 40, "equipped": "gold", "unlocked": ["ice"]}))
            .unwrap();

        let ledger = CurrencyLedger::open(&store);
        assert_eq!(ledger.balance(), 40);
        assert_eq!(ledger.equipped_id(), DEFAULT_ITEM_ID);
        assert!(ledger.is_unlocked(DEFAULT_ITEM_ID));
        assert!(ledger.is_unlocked("ice"));
    }

    #[test]
    fn test_partial_and_corrupt_accounts() {
        let store = MemoryStore::new();
        store.save(ACCOUNT_KEY, &json!({"coins": 12})).unwrap();
        let ledger = CurrencyLedger::open(&store);
        assert_eq!(ledger.balance(), 12);
        assert_eq!(ledger.equipped_id(), DEFAULT_ITEM_ID);

        store.save(ACCOUNT_KEY, &json!({"coins": -5})).unwrap();
        let ledger = CurrencyLedger::open(&store);
        assert_eq!(ledger.account(), &CurrencyAccount::default());
    }

    #[test]
    fn test_equipped_item_fallback() {
        let store = MemoryStore::new();
        let ledger = CurrencyLedger::open(&store);
        let catalog = vec![CatalogItem::new("basic", "Basic", 0)];
        assert_eq!(ledger.equipped_item(&catalog).map(|i| i.id.as_str()), Some("basic"));
        assert_eq!(ledger.equipped_item(&[]), None);
    }

    #[test]
    fn test_unpersisted_purchase_changes_nothing() {
        let store = FlakyStore::failing_after(usize::MAX);
        let catalog = skin_catalog();
        {
            let mut ledger = CurrencyLedger::open(&store);
            assert!(ledger.earn(600));
            store.break_writes();

            assert_eq!(ledger.purchase("rose", &catalog), Err(PurchaseError::NotPersisted));
            assert_eq!(ledger.balance(), 600);
            assert!(!ledger.is_unlocked("rose"));
            assert!(!ledger.equip("rose"));
        }

        let reopened = CurrencyLedger::open(&store);
        assert_eq!(reopened.balance(), 600);
        assert!(!reopened.is_unlocked("rose"));
    }

    #[test]
    fn test_unpersisted_earn_and_equip_are_refused() {
        let store = FlakyStore::failing_after(usize::MAX);
        let mut ledger = CurrencyLedger::open(&store);
        assert!(ledger.earn(500));
        ledger.purchase("rose", &skin_catalog()).unwrap();
        store.break_writes();

        assert!(!ledger.earn(100));
        assert_eq!(ledger.balance(), 0);
        assert!(!ledger.equip("rose"));
        assert_eq!(ledger.equipped_id(), DEFAULT_ITEM_ID);
        assert_eq!(CurrencyLedger::open(&store).account(), ledger.account());
    }
}
