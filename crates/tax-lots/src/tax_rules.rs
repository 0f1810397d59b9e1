//! Tax Rules
//!
//! Holding-period thresholds, wash sale window, and the tax lot record.

use chrono::{DateTime, Utc};
use gains_core::EngineConfig;
use serde::{Deserialize, Serialize};

const SECONDS_PER_DAY: i64 = 86_400;

/// Tax rules applied while matching lots
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxRules {
    /// Wash sale window in days (before and after)
    pub wash_sale_window_days: u32,
    /// Lots held strictly longer than this many days are long-term
    pub long_term_threshold_days: u32,
    /// Whether losing sales are checked for replacement purchases
    pub has_wash_sale_rule: bool,
}

impl Default for TaxRules {
    fn default() -> Self {
        Self::us()
    }
}

impl TaxRules {
    /// US rules: 30-day wash sale window, long-term after one year
    pub fn us() -> Self {
        Self {
            wash_sale_window_days: 30,
            long_term_threshold_days: 365,
            has_wash_sale_rule: true,
        }
    }

    /// A zero-day wash sale window turns detection off.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self {
            wash_sale_window_days: config.wash_sale_window_days,
            long_term_threshold_days: config.long_term_threshold_days,
            has_wash_sale_rule: config.wash_sale_window_days > 0,
        }
    }

    /// Whole days between acquisition and sale, rounded up
    pub fn holding_days(&self, acquired: DateTime<Utc>, sold: DateTime<Utc>) -> i64 {
        let seconds = (sold - acquired).num_seconds().abs();
        (seconds + SECONDS_PER_DAY - 1) / SECONDS_PER_DAY
    }

    pub fn holding_period(&self, days_held: i64) -> HoldingPeriod {
        if days_held > self.long_term_threshold_days as i64 {
            HoldingPeriod::LongTerm
        } else {
            HoldingPeriod::ShortTerm
        }
    }
}

/// Holding period of a single lot closure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HoldingPeriod {
    #[serde(rename = "SHORT")]
    ShortTerm,
    #[serde(rename = "LONG")]
    LongTerm,
}

/// Holding period of a whole sell trade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeTerm {
    Short,
    Long,
    /// Some lots short-term, some long-term
    Mixed,
}

impl TradeTerm {
    /// Derive the trade term from its lot closures. `None` when empty.
    pub fn from_periods<I>(periods: I) -> Option<Self>
    where
        I: IntoIterator<Item = HoldingPeriod>,
    {
        let mut any_long = false;
        let mut any_short = false;
        for period in periods {
            match period {
                HoldingPeriod::LongTerm => any_long = true,
                HoldingPeriod::ShortTerm => any_short = true,
            }
        }

        match (any_long, any_short) {
            (true, false) => Some(TradeTerm::Long),
            (false, true) => Some(TradeTerm::Short),
            (true, true) => Some(TradeTerm::Mixed),
            (false, false) => None,
        }
    }
}

impl std::fmt::Display for TradeTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TradeTerm::Short => write!(f, "SHORT"),
            TradeTerm::Long => write!(f, "LONG"),
            TradeTerm::Mixed => write!(f, "MIXED"),
        }
    }
}

/// An open batch of shares acquired at one time and price
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaxLot {
    /// Remaining shares
    pub quantity: f64,
    /// Price plus per-share commission and fees
    pub cost_per_share: f64,
    pub acquisition_date: DateTime<Utc>,
}

impl TaxLot {
    pub fn new(quantity: f64, cost_per_share: f64, acquisition_date: DateTime<Utc>) -> Self {
        Self {
            quantity,
            cost_per_share,
            acquisition_date,
        }
    }

    /// Remaining cost basis
    pub fn cost_basis(&self) -> f64 {
        self.quantity * self.cost_per_share
    }
}
