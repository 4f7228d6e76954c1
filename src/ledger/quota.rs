//! Daily Play Quota
//!
//! Gates game starts by a per-tier daily cap. Watching a rewarded ad rebates
//! one consumed play instead of raising the cap.
//!
//! ## Day Rollover
//!
//! There is no day-end event. Every read or write first passes the stored
//! record through [`rollover_if_stale`]; a record from any other day is
//! replaced by a zeroed record for today before the operation proceeds.

use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::clock::Clock;
use crate::core::store::{load_record, save_record, KeyValueStore};
use crate::ledger::tier::{PlayAllowance, Tier, TierLimits, TierTable};

/// Storage key for today's quota record.
pub const QUOTA_KEY: &str = "arkPD_energy";

/// Plays consumed on one calendar day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaRecord {
    /// Day this record counts for.
    pub date: NaiveDate,
    /// Plays consumed today.
    pub plays: u32,
    /// Ad bonuses granted today.
    pub ad_bonus: u32,
}

impl QuotaRecord {
    /// A zeroed record for `date`.
    pub fn fresh(date: NaiveDate) -> Self {
        Self { date, plays: 0, ad_bonus: 0 }
    }
}

/// Replace a record from any day other than `today` with a fresh one.
pub fn rollover_if_stale(record: QuotaRecord, today: NaiveDate) -> QuotaRecord {
    if record.date == today {
        record
    } else {
        QuotaRecord::fresh(today)
    }
}

/// Reasons a quota operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QuotaDenial {
    /// Daily play cap reached.
    #[error("daily play limit reached ({plays}/{max})")]
    QuotaExceeded {
        /// Plays consumed today.
        plays: u32,
        /// Cap for the tier.
        max: u32,
    },

    /// Daily ad bonus cap reached.
    #[error("ad bonus exhausted ({granted}/{max})")]
    BonusExhausted {
        /// Bonuses granted today.
        granted: u32,
        /// Cap for the tier.
        max: u32,
    },

    /// The updated record could not be written.
    #[error("quota record not persisted")]
    NotPersisted,
}

/// Daily quota ledger.
///
/// Holds no in-memory copy of the record; each call reads through the store
/// so a restart or a second instance sees the same counts.
#[derive(Debug)]
pub struct QuotaLedger<S, C> {
    store: S,
    clock: C,
    table: TierTable,
}

impl<S: KeyValueStore, C: Clock> QuotaLedger<S, C> {
    /// Create a ledger with the default tier table.
    pub fn new(store: S, clock: C) -> Self {
        Self::with_table(store, clock, TierTable::default())
    }

    /// Create a ledger with custom tier limits.
    pub fn with_table(store: S, clock: C, table: TierTable) -> Self {
        Self { store, clock, table }
    }

    /// Limits in effect for a tier.
    pub fn limits(&self, tier: Tier) -> TierLimits {
        self.table.limits(tier)
    }

    /// Today's record, rolling over (and persisting) if the stored one is stale
    /// or unreadable.
    pub fn today_record(&self) -> QuotaRecord {
        let today = self.clock.today();
        let Some(stored) = load_record::<QuotaRecord, _>(&self.store, QUOTA_KEY) else {
            debug!("No quota record, starting {}", today);
            let fresh = QuotaRecord::fresh(today);
            save_record(&self.store, QUOTA_KEY, &fresh);
            return fresh;
        };

        if stored.date == today {
            return stored;
        }

        info!("Quota rollover {} -> {}", stored.date, today);
        let fresh = rollover_if_stale(stored, today);
        save_record(&self.store, QUOTA_KEY, &fresh);
        fresh
    }

    /// Check if the tier may start another game today.
    pub fn can_play(&self, tier: Tier) -> bool {
        let record = self.today_record();
        match self.limits(tier).max_plays {
            PlayAllowance::Unlimited => true,
            PlayAllowance::Limited(max) => record.plays < max,
        }
    }

    /// Consume one play, returning what is left.
    pub fn try_consume_play(&self, tier: Tier) -> Result<PlayAllowance, QuotaDenial> {
        let max = match self.limits(tier).max_plays {
            PlayAllowance::Unlimited => return Ok(PlayAllowance::Unlimited),
            PlayAllowance::Limited(max) => max,
        };

        let mut record = self.today_record();
        if record.plays >= max {
            debug!("Play denied for {}: {}/{}", tier, record.plays, max);
            return Err(QuotaDenial::QuotaExceeded { plays: record.plays, max });
        }

        record.plays += 1;
        if !save_record(&self.store, QUOTA_KEY, &record) {
            return Err(QuotaDenial::NotPersisted);
        }
        info!("Play consumed for {}: {}/{}", tier, record.plays, max);
        Ok(PlayAllowance::Limited(max - record.plays))
    }

    /// Consume one play. Returns false when the daily cap is reached or the
    /// play could not be recorded.
    pub fn consume_play(&self, tier: Tier) -> bool {
        self.try_consume_play(tier).is_ok()
    }

    /// Grant one ad bonus, refunding a consumed play if there is one.
    ///
    /// A player who has not played yet today still uses up a bonus but gains
    /// nothing, since plays never go below zero.
    pub fn try_grant_ad_bonus(&self, tier: Tier) -> Result<QuotaRecord, QuotaDenial> {
        let max = self.limits(tier).max_ad_bonus;
        let mut record = self.today_record();
        if record.ad_bonus >= max {
            debug!("Ad bonus denied for {}: {}/{}", tier, record.ad_bonus, max);
            return Err(QuotaDenial::BonusExhausted { granted: record.ad_bonus, max });
        }

        record.ad_bonus += 1;
        record.plays = record.plays.saturating_sub(1);
        if !save_record(&self.store, QUOTA_KEY, &record) {
            return Err(QuotaDenial::NotPersisted);
        }
        info!(
            "Ad bonus granted for {}: bonus {}/{}, plays now {}",
            tier, record.ad_bonus, max, record.plays
        );
        Ok(record)
    }

    /// Grant one ad bonus. Returns false when the daily bonus cap is reached
    /// or the grant could not be recorded.
    pub fn grant_ad_bonus(&self, tier: Tier) -> bool {
        self.try_grant_ad_bonus(tier).is_ok()
    }

    /// Plays left today.
    pub fn remaining_plays(&self, tier: Tier) -> PlayAllowance {
        let record = self.today_record();
        match self.limits(tier).max_plays {
            PlayAllowance::Unlimited => PlayAllowance::Unlimited,
            PlayAllowance::Limited(max) => {
                PlayAllowance::Limited(max.saturating_sub(record.plays))
            }
        }
    }

    /// Ad bonuses left today.
    pub fn remaining_ad_bonuses(&self, tier: Tier) -> u32 {
        let record = self.today_record();
        self.limits(tier).max_ad_bonus.saturating_sub(record.ad_bonus)
    }

    /// Check if the tier has no play cap.
    pub fn is_unlimited(&self, tier: Tier) -> bool {
        self.limits(tier).max_plays.is_unlimited()
    }

    /// Daily play cap for the tier.
    pub fn max_plays(&self, tier: Tier) -> PlayAllowance {
        self.limits(tier).max_plays
    }

    /// Time until the quota resets at local midnight.
    pub fn time_until_reset(&self) -> Duration {
        self.clock.until_midnight()
    }

    /// Reset countdown as `HH:MM:SS`.
    pub fn reset_countdown(&self) -> String {
        format_countdown(self.time_until_reset())
    }
}

/// Format a duration as `HH:MM:SS`, truncating sub-second precision.
pub fn format_countdown(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs % 3600) / 60, secs % 60)
}

// =============================================================================
// TESTS
// =============================================================================
