use crate::error::{GainsError, GainsResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Lot-selection strategy for stock sells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LotStrategy {
    /// Oldest lot first
    #[default]
    Fifo,
    /// Newest lot first
    Lifo,
    /// Highest cost per share first
    Hifo,
}

impl FromStr for LotStrategy {
    type Err = GainsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FIFO" => Ok(Self::Fifo),
            "LIFO" => Ok(Self::Lifo),
            "HIFO" => Ok(Self::Hifo),
            other => Err(GainsError::InvalidConfig(format!(
                "unknown lot strategy '{}' (expected FIFO, LIFO or HIFO)",
                other
            ))),
        }
    }
}

impl std::fmt::Display for LotStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LotStrategy::Fifo => write!(f, "FIFO"),
            LotStrategy::Lifo => write!(f, "LIFO"),
            LotStrategy::Hifo => write!(f, "HIFO"),
        }
    }
}

/// How short calls are classified at open time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShortCallPolicy {
    /// Every short call is a covered call. Exports rarely cover the full
    /// share history, so ownership cannot be proven reliably.
    #[default]
    AlwaysCovered,
    /// Covered only when enough shares are held (or ownership evidence
    /// exists), otherwise naked.
    Strict,
}

impl FromStr for ShortCallPolicy {
    type Err = GainsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "always_covered" | "covered" => Ok(Self::AlwaysCovered),
            "strict" => Ok(Self::Strict),
            other => Err(GainsError::InvalidConfig(format!(
                "unknown short call policy '{}' (expected always_covered or strict)",
                other
            ))),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub lot_strategy: LotStrategy,
    pub short_call_policy: ShortCallPolicy,
    /// Current portfolio value appended as the terminal XIRR flow (0 = none)
    pub portfolio_value: f64,
    /// Days either side of a losing sale searched for replacement buys
    /// (0 turns wash sale detection off)
    pub wash_sale_window_days: u32,
    /// Lots held strictly longer than this are long-term
    pub long_term_threshold_days: u32,
    /// Shares per option contract
    pub contract_multiplier: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lot_strategy: LotStrategy::Fifo,
            short_call_policy: ShortCallPolicy::AlwaysCovered,
            portfolio_value: 0.0,
            wash_sale_window_days: 30,
            long_term_threshold_days: 365,
            contract_multiplier: 100.0,
        }
    }
}

impl EngineConfig {
    /// Load from `GAINS_*` environment variables, falling back to defaults.
    pub fn from_env() -> GainsResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load from an arbitrary key lookup (environment, test map, ...).
    pub fn from_lookup<F>(lookup: F) -> GainsResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            lot_strategy: match lookup("GAINS_LOT_STRATEGY") {
                Some(v) => v.parse()?,
                None => defaults.lot_strategy,
            },
            short_call_policy: match lookup("GAINS_SHORT_CALL_POLICY") {
                Some(v) => v.parse()?,
                None => defaults.short_call_policy,
            },
            portfolio_value: parse_var(&lookup, "GAINS_PORTFOLIO_VALUE", defaults.portfolio_value)?,
            wash_sale_window_days: parse_var(
                &lookup,
                "GAINS_WASH_SALE_DAYS",
                defaults.wash_sale_window_days,
            )?,
            long_term_threshold_days: parse_var(
                &lookup,
                "GAINS_LONG_TERM_DAYS",
                defaults.long_term_threshold_days,
            )?,
            contract_multiplier: parse_var(
                &lookup,
                "GAINS_CONTRACT_MULTIPLIER",
                defaults.contract_multiplier,
            )?,
        };

        config.validate()?;
        tracing::debug!(
            "Engine config: {} lots, {:?} short calls, wash window {}d, long-term after {}d",
            config.lot_strategy,
            config.short_call_policy,
            config.wash_sale_window_days,
            config.long_term_threshold_days
        );
        Ok(config)
    }

    pub fn validate(&self) -> GainsResult<()> {
        if !self.portfolio_value.is_finite() || self.portfolio_value < 0.0 {
            return Err(GainsError::InvalidConfig(format!(
                "portfolio value must be a non-negative number, got {}",
                self.portfolio_value
            )));
        }
        if !self.contract_multiplier.is_finite() || self.contract_multiplier <= 0.0 {
            return Err(GainsError::InvalidConfig(format!(
                "contract multiplier must be positive, got {}",
                self.contract_multiplier
            )));
        }
        Ok(())
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> GainsResult<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| GainsError::InvalidConfig(format!("{}='{}': {}", key, raw, e))),
        None => Ok(default),
    }
}
