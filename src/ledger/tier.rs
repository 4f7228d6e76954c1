//! User Tiers and Quota Limits
//!
//! Every tier maps to exactly one [`TierLimits`] row. There is no fallback
//! lookup: unknown tier names are rejected at parse time.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User classification that determines daily quota.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Not signed in.
    Guest,
    /// Signed in with email/password.
    Registered,
    /// Signed in through an external identity provider.
    Federated,
    /// Paying player with unlimited plays.
    Vip,
}

impl Tier {
    /// All tiers, in ascending privilege order.
    pub const ALL: [Tier; 4] = [Tier::Guest, Tier::Registered, Tier::Federated, Tier::Vip];

    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Guest => "guest",
            Tier::Registered => "registered",
            Tier::Federated => "federated",
            Tier::Vip => "vip",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tier name did not match any known tier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tier: {0}")]
pub struct UnknownTier(pub String);

impl FromStr for Tier {
    type Err = UnknownTier;

    /// Accepts the canonical names plus the `login`/`google` aliases used by
    /// older clients.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "guest" => Ok(Tier::Guest),
            "registered" | "login" => Ok(Tier::Registered),
            "federated" | "google" => Ok(Tier::Federated),
            "vip" => Ok(Tier::Vip),
            _ => Err(UnknownTier(s.to_string())),
        }
    }
}

/// A play count that may be unbounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlayAllowance {
    /// At most this many.
    Limited(u32),
    /// No cap.
    Unlimited,
}

impl PlayAllowance {
    /// Check for the unbounded case.
    pub fn is_unlimited(&self) -> bool {
        matches!(self, PlayAllowance::Unlimited)
    }

    /// The finite count, if any.
    pub fn limit(&self) -> Option<u32> {
        match self {
            PlayAllowance::Limited(n) => Some(*n),
            PlayAllowance::Unlimited => None,
        }
    }
}

impl fmt::Display for PlayAllowance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlayAllowance::Limited(n) => write!(f, "{}", n),
            PlayAllowance::Unlimited => f.write_str("unlimited"),
        }
    }
}

/// Daily limits for one tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierLimits {
    /// Plays per day.
    pub max_plays: PlayAllowance,
    /// Ad-granted bonus plays per day.
    pub max_ad_bonus: u32,
}

impl TierLimits {
    /// Limits for a capped tier.
    pub const fn limited(max_plays: u32, max_ad_bonus: u32) -> Self {
        Self {
            max_plays: PlayAllowance::Limited(max_plays),
            max_ad_bonus,
        }
    }

    /// The VIP row: unbounded plays, no bonus.
    pub const UNLIMITED: TierLimits = TierLimits {
        max_plays: PlayAllowance::Unlimited,
        max_ad_bonus: 0,
    };
}

/// Total mapping from [`Tier`] to [`TierLimits`].
///
/// The VIP row is fixed; only the capped tiers are configurable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TierTable {
    guest: TierLimits,
    registered: TierLimits,
    federated: TierLimits,
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            guest: TierLimits::limited(3, 5),
            registered: TierLimits::limited(5, 5),
            federated: TierLimits::limited(5, 5),
        }
    }
}

impl TierTable {
    /// Build a table from explicit capped rows.
    pub fn new(guest: TierLimits, registered: TierLimits, federated: TierLimits) -> Self {
        Self { guest, registered, federated }
    }

    /// Limits for a tier.
    pub fn limits(&self, tier: Tier) -> TierLimits {
        match tier {
            Tier::Guest => self.guest,
            Tier::Registered => self.registered,
            Tier::Federated => self.federated,
            Tier::Vip => TierLimits::UNLIMITED,
        }
    }

    /// Replace the row for a capped tier. The VIP row is ignored.
    pub fn with_limits(mut self, tier: Tier, limits: TierLimits) -> Self {
        match tier {
            Tier::Guest => self.guest = limits,
            Tier::Registered => self.registered = limits,
            Tier::Federated => self.federated = limits,
            Tier::Vip => {}
        }
        self
    }
}

// =============================================================================
// TESTS
// =============================================================================
