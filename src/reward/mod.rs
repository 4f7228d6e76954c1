//! Reward Boundary
//!
//! Where the external ad and payment layers call into the ledgers. Nothing
//! here talks to an SDK; callers report outcomes and this module applies them.

pub mod ads;
pub mod mediator;
pub mod payment;

pub use ads::{InterstitialSchedule, DEFAULT_INTERSTITIAL_EVERY};
pub use mediator::{AdOutcome, DeclineReason, RewardKind, RewardMediator, RewardOutcome};
pub use payment::{
    coin_packs, credit_capture, CoinPack, PaymentCapture, PaymentError, PurchaseRecord,
};
