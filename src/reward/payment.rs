//! Coin Pack Credits
//!
//! Payment capture happens in the payment provider's SDK. Once an order is
//! captured, the caller hands the order here to credit the pack's coins and
//! get back the record to forward to a remote purchase log.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::core::store::KeyValueStore;
use crate::ledger::currency::CurrencyLedger;

/// A real-money coin pack.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinPack {
    /// Stable pack id.
    pub id: String,
    /// Coins credited.
    pub coins: u64,
    /// Decimal price as sent to the payment provider.
    pub price: String,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Display label.
    pub label: String,
    /// Promotional tag, empty for none.
    pub bonus: String,
}

/// The shipped coin packs, smallest first.
pub fn coin_packs() -> Vec<CoinPack> {
    [
        ("pack_s", 500, "0.99", "500 Coins", ""),
        ("pack_m", 1200, "1.99", "1,200 Coins", "+20%"),
        ("pack_l", 3000, "3.99", "3,000 Coins", "+50%"),
        ("pack_xl", 8000, "7.99", "8,000 Coins", "BEST VALUE"),
    ]
    .into_iter()
    .map(|(id, coins, price, label, bonus)| CoinPack {
        id: id.to_string(),
        coins,
        price: price.to_string(),
        currency: "USD".to_string(),
        label: label.to_string(),
        bonus: bonus.to_string(),
    })
    .collect()
}

/// A captured order reported by the payment provider.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCapture {
    /// Provider order id.
    pub order_id: String,
    /// Pack that was bought.
    pub pack_id: String,
    /// Payer email, if the provider shared it.
    #[serde(default)]
    pub payer_email: Option<String>,
}

/// Audit record for a credited purchase.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    /// Provider order id.
    pub order_id: String,
    /// Pack that was bought.
    pub pack_id: String,
    /// Coins credited.
    pub coins: u64,
    /// Amount charged.
    pub amount: String,
    /// Currency of `amount`.
    pub currency: String,
    /// Payer email, empty when unknown.
    pub payer_email: String,
}

/// Payment credit errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentError {
    /// Captured order names a pack we do not sell.
    #[error("unknown coin pack: {0}")]
    UnknownPack(String),

    /// Coins could not be written; the order stays uncredited.
    #[error("credit for order {0} not persisted")]
    NotPersisted(String),
}

/// Credit the coins for a captured order.
pub fn credit_capture<S: KeyValueStore>(
    capture: &PaymentCapture,
    packs: &[CoinPack],
    currency: &mut CurrencyLedger<S>,
) -> Result<PurchaseRecord, PaymentError> {
    let pack = packs
        .iter()
        .find(|p| p.id == capture.pack_id)
        .ok_or_else(|| PaymentError::UnknownPack(capture.pack_id.clone()))?;

    if !currency.earn(pack.coins) {
        return Err(PaymentError::NotPersisted(capture.order_id.clone()));
    }
    info!("Order {} credited {} coins ({})", capture.order_id, pack.coins, pack.id);

    Ok(PurchaseRecord {
        order_id: capture.order_id.clone(),
        pack_id: pack.id.clone(),
        coins: pack.coins,
        amount: pack.price.clone(),
        currency: pack.currency.clone(),
        payer_email: capture.payer_email.clone().unwrap_or_default(),
    })
}
