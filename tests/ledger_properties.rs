//! Property-Based Tests for the Quota and Currency Ledgers
//!
//! ## Properties Verified
//!
//! - Capped tiers stop at `max_plays` and denied plays do not mutate state
//! - VIP can always play
//! - A full quota resets on the next calendar day
//! - Ad bonuses stop at `max_ad_bonus` and denied grants do not mutate state
//! - The coin balance never goes negative across earn/purchase sequences
//! - `equip` succeeds exactly for unlocked items

use std::sync::Arc;

use proptest::prelude::*;
use pulse_drop::ledger::catalog::{skin_catalog, DEFAULT_ITEM_ID};
use pulse_drop::{
    CurrencyLedger, ManualClock, MemoryStore, PlayAllowance, PurchaseError, QuotaLedger, Tier,
};

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::at(2026, 2, 14, 12, 0, 0).unwrap())
}

fn capped_tier() -> impl Strategy<Value = Tier> {
    prop_oneof![Just(Tier::Guest), Just(Tier::Registered), Just(Tier::Federated)]
}

#[derive(Debug, Clone)]
enum CurrencyOp {
    Earn(u64),
    Purchase(usize),
    Equip(usize),
}

fn currency_op() -> impl Strategy<Value = CurrencyOp> {
    prop_oneof![
        (0u64..600).prop_map(CurrencyOp::Earn),
        (0usize..10).prop_map(CurrencyOp::Purchase),
        (0usize..10).prop_map(CurrencyOp::Equip),
    ]
}

fn item_id(index: usize) -> String {
    skin_catalog()
        .get(index)
        .map(|item| item.id.clone())
        .unwrap_or_else(|| format!("missing_{}", index))
}

// ============================================================================
// Quota Properties
// ============================================================================

proptest! {
    /// Property: after max_plays plays the tier is blocked and stays unchanged
    #[test]
    fn prop_quota_cap_holds(tier in capped_tier(), extra in 1usize..10) {
        let store = MemoryStore::new();
        let clock = clock();
        let quota = QuotaLedger::new(&store, Arc::clone(&clock));
        let max = quota.max_plays(tier).limit().unwrap();

        for _ in 0..max {
            prop_assert!(quota.consume_play(tier));
        }
        prop_assert!(!quota.can_play(tier));

        let before = quota.today_record();
        for _ in 0..extra {
            prop_assert!(!quota.consume_play(tier));
        }
        prop_assert_eq!(quota.today_record(), before);
        prop_assert_eq!(quota.remaining_plays(tier), PlayAllowance::Limited(0));
    }

    /// Property: VIP can always play
    #[test]
    fn prop_vip_always_plays(prior in 0usize..50) {
        let store = MemoryStore::new();
        let quota = QuotaLedger::new(&store, clock());
        for _ in 0..prior {
            quota.consume_play(Tier::Guest);
            quota.consume_play(Tier::Vip);
        }
        prop_assert!(quota.can_play(Tier::Vip));
        prop_assert!(quota.consume_play(Tier::Vip));
    }

    /// Property: a full quota resets on any later day
    #[test]
    fn prop_rollover_resets(tier in capped_tier(), days in 1i64..400) {
        let store = MemoryStore::new();
        let clock = clock();
        let quota = QuotaLedger::new(&store, Arc::clone(&clock));
        while quota.consume_play(tier) {}
        prop_assert!(!quota.can_play(tier));

        clock.advance(chrono::TimeDelta::days(days));
        prop_assert!(quota.can_play(tier));
        prop_assert_eq!(quota.today_record().plays, 0);
    }

    /// Property: the bonus cap holds and a denied grant changes nothing
    #[test]
    fn prop_bonus_cap_holds(tier in capped_tier(), plays in 0usize..6) {
        let store = MemoryStore::new();
        let quota = QuotaLedger::new(&store, clock());
        for _ in 0..plays {
            quota.consume_play(tier);
        }

        let max = quota.limits(tier).max_ad_bonus;
        for _ in 0..max {
            prop_assert!(quota.grant_ad_bonus(tier));
        }

        let before = quota.today_record();
        prop_assert_eq!(before.ad_bonus, max);
        prop_assert!(!quota.grant_ad_bonus(tier));
        prop_assert_eq!(quota.today_record(), before);
    }
}

// ============================================================================
// Currency Properties
// ============================================================================

proptest! {
    /// Property: balance tracks earn/purchase exactly and never underflows
    #[test]
    fn prop_balance_never_negative(ops in prop::collection::vec(currency_op(), 0..40)) {
        let store = MemoryStore::new();
        let catalog = skin_catalog();
        let mut ledger = CurrencyLedger::open(&store);
        let mut expected: u64 = 0;

        for op in ops {
            match op {
                CurrencyOp::Earn(amount) => {
                    ledger.earn(amount);
                    expected += amount;
                }
                CurrencyOp::Purchase(index) => {
                    let before = ledger.balance();
                    match ledger.purchase(&item_id(index), &catalog) {
                        Ok(()) => {
                            let price = catalog[index].price;
                            prop_assert!(before >= price);
                            expected -= price;
                        }
                        Err(PurchaseError::InsufficientFunds { balance, price }) => {
                            prop_assert!(balance < price);
                        }
                        Err(_) => {}
                    }
                }
                CurrencyOp::Equip(index) => {
                    let id = item_id(index);
                    let unlocked = ledger.is_unlocked(&id);
                    prop_assert_eq!(ledger.equip(&id), unlocked);
                }
            }
            prop_assert_eq!(ledger.balance(), expected);
            prop_assert!(ledger.is_unlocked(ledger.equipped_id()));
            prop_assert!(ledger.is_unlocked(DEFAULT_ITEM_ID));
        }
    }

    /// Property: a successful purchase always makes the item equippable
    #[test]
    fn prop_purchase_then_equip(index in 1usize..8) {
        let store = MemoryStore::new();
        let catalog = skin_catalog();
        let mut ledger = CurrencyLedger::open(&store);
        let id = catalog[index].id.clone();

        prop_assert!(!ledger.equip(&id));
        ledger.earn(catalog[index].price);
        prop_assert!(ledger.purchase(&id, &catalog).is_ok());
        prop_assert!(ledger.equip(&id));
        prop_assert_eq!(ledger.equipped_id(), id.as_str());
    }
}
