//! Runtime Configuration
//!
//! Everything has a default; environment variables override it.

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::ledger::tier::{PlayAllowance, Tier, TierLimits, TierTable};
use crate::reward::ads::DEFAULT_INTERSTITIAL_EVERY;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Variable is set but not a valid value.
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue {
        /// Variable name.
        var: String,
        /// Raw value.
        value: String,
    },
}

/// Ledger configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct LedgerConfig {
    /// Directory for the file-backed store.
    pub data_dir: PathBuf,
    /// Default tracing level when `RUST_LOG` is not set.
    pub log_level: String,
    /// Show an interstitial every this many games.
    pub interstitial_every: u32,
    /// Grant rewarded-ad rewards when no ad can be served.
    pub grant_on_unavailable: bool,
    /// Daily limits per tier.
    pub tiers: TierTable,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("pulse-data"),
            log_level: "info".to_string(),
            interstitial_every: DEFAULT_INTERSTITIAL_EVERY,
            grant_on_unavailable: true,
            tiers: TierTable::default(),
        }
    }
}

impl LedgerConfig {
    /// Create config from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Create config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("PULSE_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(level) = lookup("PULSE_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(every) = parse_var::<u32, _>(&lookup, "PULSE_INTERSTITIAL_EVERY")? {
            if every == 0 {
                return Err(invalid("PULSE_INTERSTITIAL_EVERY", "0"));
            }
            config.interstitial_every = every;
        }
        if let Some(raw) = lookup("PULSE_GRANT_ON_UNAVAILABLE") {
            config.grant_on_unavailable = match raw.as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(invalid("PULSE_GRANT_ON_UNAVAILABLE", &raw)),
            };
        }

        let max_ad_bonus = parse_var::<u32, _>(&lookup, "PULSE_MAX_AD_BONUS")?;
        let overrides = [
            (Tier::Guest, "PULSE_GUEST_MAX_PLAYS"),
            (Tier::Registered, "PULSE_REGISTERED_MAX_PLAYS"),
            (Tier::Federated, "PULSE_FEDERATED_MAX_PLAYS"),
        ];
        for (tier, var) in overrides {
            let current = config.tiers.limits(tier);
            let max_plays = match parse_var::<u32, _>(&lookup, var)? {
                Some(n) => PlayAllowance::Limited(n),
                None => current.max_plays,
            };
            let limits = TierLimits {
                max_plays,
                max_ad_bonus: max_ad_bonus.unwrap_or(current.max_ad_bonus),
            };
            config.tiers = config.tiers.with_limits(tier, limits);
        }

        Ok(config)
    }
}

fn parse_var<T, F>(lookup: &F, var: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw.trim().parse().map(Some).map_err(|_| invalid(var, &raw)),
    }
}

fn invalid(var: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        var: var.to_string(),
        value: value.to_string(),
    }
}
