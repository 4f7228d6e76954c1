//! Rewarded Ad Settlement
//!
//! The ad layer owns showing the ad and its timeouts. Once it knows how the
//! ad ended it hands the outcome here, and the mediator turns it into ledger
//! grants. A dismissed ad means no grant operation is ever invoked.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::clock::Clock;
use crate::core::store::KeyValueStore;
use crate::ledger::currency::CurrencyLedger;
use crate::ledger::quota::{QuotaDenial, QuotaLedger};
use crate::ledger::tier::Tier;

/// What a rewarded ad pays out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardKind {
    /// One rebated play.
    BonusPlay,
    /// A coin credit.
    Coins(u64),
    /// Continue the current run. Once per session.
    Revive,
    /// Double the final score. Applied by the game.
    DoubleScore,
}

/// How the ad layer reports an ad ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdOutcome {
    /// Watched to completion.
    Viewed,
    /// Closed before completion.
    Dismissed,
    /// No ad could be served.
    Unavailable,
}

/// Why a reward was not granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeclineReason {
    /// Player closed the ad early.
    #[error("ad dismissed")]
    Dismissed,
    /// No ad available and fallback grants are disabled.
    #[error("no ad available")]
    Unavailable,
    /// Revive already used this session.
    #[error("revive already used")]
    ReviveUsed,
    /// Daily ad bonus cap reached.
    #[error("ad bonus exhausted")]
    BonusExhausted,
    /// The grant could not be written to the store.
    #[error("reward not persisted")]
    NotPersisted,
}

/// Result of settling a rewarded ad.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewardOutcome {
    /// Reward applied.
    Granted(RewardKind),
    /// Nothing applied.
    Declined(DeclineReason),
}

impl RewardOutcome {
    /// Check if the reward was applied.
    pub fn is_granted(&self) -> bool {
        matches!(self, RewardOutcome::Granted(_))
    }
}

/// Per-session reward mediator.
#[derive(Debug, Clone)]
pub struct RewardMediator {
    revive_used: bool,
    grant_on_unavailable: bool,
}

impl RewardMediator {
    /// Create a mediator. With `grant_on_unavailable`, rewards are granted when
    /// no ad can be served.
    pub fn new(grant_on_unavailable: bool) -> Self {
        Self {
            revive_used: false,
            grant_on_unavailable,
        }
    }

    /// Check if a revive can still be offered this session.
    pub fn can_revive(&self) -> bool {
        !self.revive_used
    }

    /// Start a new session (re-enables the revive).
    pub fn reset_session(&mut self) {
        self.revive_used = false;
    }

    /// Check if an ad for `kind` is worth offering right now.
    pub fn should_offer<S, C>(
        &self,
        kind: RewardKind,
        tier: Tier,
        quota: &QuotaLedger<S, C>,
    ) -> bool
    where
        S: KeyValueStore,
        C: Clock,
    {
        match kind {
            RewardKind::Revive => self.can_revive(),
            RewardKind::BonusPlay => quota.remaining_ad_bonuses(tier) > 0,
            RewardKind::Coins(_) | RewardKind::DoubleScore => true,
        }
    }

    /// Apply the outcome of a rewarded ad to the ledgers.
    pub fn settle<S, C, T>(
        &mut self,
        kind: RewardKind,
        outcome: AdOutcome,
        tier: Tier,
        quota: &QuotaLedger<S, C>,
        currency: &mut CurrencyLedger<T>,
    ) -> RewardOutcome
    where
        S: KeyValueStore,
        C: Clock,
        T: KeyValueStore,
    {
        if kind == RewardKind::Revive && self.revive_used {
            return RewardOutcome::Declined(DeclineReason::ReviveUsed);
        }

        match outcome {
            AdOutcome::Viewed => {}
            AdOutcome::Unavailable if self.grant_on_unavailable => {
                debug!("No rewarded ad available, granting {:?} anyway", kind);
            }
            AdOutcome::Unavailable => return RewardOutcome::Declined(DeclineReason::Unavailable),
            AdOutcome::Dismissed => {
                debug!("Rewarded ad dismissed, no {:?}", kind);
                return RewardOutcome::Declined(DeclineReason::Dismissed);
            }
        }

        match kind {
            RewardKind::BonusPlay => match quota.try_grant_ad_bonus(tier) {
                Ok(_) => {}
                Err(QuotaDenial::NotPersisted) => {
                    return RewardOutcome::Declined(DeclineReason::NotPersisted)
                }
                Err(_) => return RewardOutcome::Declined(DeclineReason::BonusExhausted),
            },
            RewardKind::Coins(amount) => {
                if !currency.earn(amount) {
                    return RewardOutcome::Declined(DeclineReason::NotPersisted);
                }
            }
            RewardKind::Revive => self.revive_used = true,
            RewardKind::DoubleScore => {}
        }

        info!("Reward granted: {:?}", kind);
        RewardOutcome::Granted(kind)
    }
}

impl Default for RewardMediator {
    fn default() -> Self {
        Self::new(true)
    }
}

// =============================================================================
// TESTS
// =============================================================================
