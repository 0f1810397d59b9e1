//! Strategy classification and per-strategy aggregates

use crate::contract::OptionType;
use gains_core::ShortCallPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tax_lots::OpenPositions;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionSide {
    /// Bought to open
    Long,
    /// Sold to open
    Short,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OptionStrategy {
    CoveredCalls,
    NakedCalls,
    CashSecuredPuts,
    LongCalls,
    LongPuts,
}

impl OptionStrategy {
    pub const ALL: [OptionStrategy; 5] = [
        OptionStrategy::CoveredCalls,
        OptionStrategy::NakedCalls,
        OptionStrategy::CashSecuredPuts,
        OptionStrategy::LongCalls,
        OptionStrategy::LongPuts,
    ];

    /// Premium-selling strategies
    pub fn is_short(&self) -> bool {
        matches!(
            self,
            OptionStrategy::CoveredCalls | OptionStrategy::NakedCalls | OptionStrategy::CashSecuredPuts
        )
    }

    pub fn side(&self) -> OptionSide {
        if self.is_short() {
            OptionSide::Short
        } else {
            OptionSide::Long
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OptionStrategy::CoveredCalls => "Covered Calls",
            OptionStrategy::NakedCalls => "Naked Calls",
            OptionStrategy::CashSecuredPuts => "Cash-Secured Puts",
            OptionStrategy::LongCalls => "Long Calls",
            OptionStrategy::LongPuts => "Long Puts",
        }
    }
}

impl std::fmt::Display for OptionStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Decides the strategy of a position when it is opened
pub struct StrategyClassifier<'a> {
    policy: ShortCallPolicy,
    contract_multiplier: f64,
    open_stock: &'a OpenPositions,
    ownership_evidence: &'a HashSet<String>,
}

impl<'a> StrategyClassifier<'a> {
    pub fn new(
        policy: ShortCallPolicy,
        contract_multiplier: f64,
        open_stock: &'a OpenPositions,
        ownership_evidence: &'a HashSet<String>,
    ) -> Self {
        Self {
            policy,
            contract_multiplier,
            open_stock,
            ownership_evidence,
        }
    }

    /// Strategy for a position opened on `side`
    pub fn classify(
        &self,
        side: OptionSide,
        option_type: OptionType,
        underlying: &str,
        contracts: f64,
    ) -> OptionStrategy {
        match (side, option_type) {
            (OptionSide::Short, OptionType::Call) => {
                if self.is_covered(underlying, contracts) {
                    OptionStrategy::CoveredCalls
                } else {
                    OptionStrategy::NakedCalls
                }
            }
            (OptionSide::Short, OptionType::Put) => OptionStrategy::CashSecuredPuts,
            (OptionSide::Long, OptionType::Call) => OptionStrategy::LongCalls,
            (OptionSide::Long, OptionType::Put) => OptionStrategy::LongPuts,
        }
    }

    fn is_covered(&self, underlying: &str, contracts: f64) -> bool {
        match self.policy {
            ShortCallPolicy::AlwaysCovered => true,
            ShortCallPolicy::Strict => {
                if self.ownership_evidence.contains(underlying) {
                    return true;
                }
                let shares: f64 = self
                    .open_stock
                    .get(underlying)
                    .map(|lots| lots.iter().map(|l| l.quantity).sum())
                    .unwrap_or(0.0);
                (shares / self.contract_multiplier).floor() >= contracts
            }
        }
    }
}

/// Running totals for one strategy. Amounts are positive magnitudes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    pub opened: usize,
    pub closed: usize,
    pub wins: usize,
    pub premium_collected: f64,
    pub premium_paid: f64,
    /// Short strategies: premium kept on close/expiry/assignment
    pub premium_retained: f64,
    /// Short strategies: cost of buying back above the premium collected
    pub premium_lost: f64,
    /// Long strategies
    pub gains: f64,
    pub losses: f64,
    pub net_pl: f64,
}

impl StrategyStats {
    pub fn record_open(&mut self, side: OptionSide, premium: f64) {
        self.opened += 1;
        match side {
            OptionSide::Short => self.premium_collected += premium,
            OptionSide::Long => self.premium_paid += premium,
        }
    }

    pub fn record_close(&mut self, strategy: OptionStrategy, realized_pl: f64) {
        self.closed += 1;
        if realized_pl > 0.0 {
            self.wins += 1;
        }

        match (strategy.is_short(), realized_pl >= 0.0) {
            (true, true) => self.premium_retained += realized_pl,
            (true, false) => self.premium_lost += -realized_pl,
            (false, true) => self.gains += realized_pl,
            (false, false) => self.losses += -realized_pl,
        }

        self.net_pl = if strategy.is_short() {
            self.premium_retained - self.premium_lost
        } else {
            self.gains - self.losses
        };
    }

    pub fn win_rate(&self) -> f64 {
        if self.closed == 0 {
            0.0
        } else {
            self.wins as f64 / self.closed as f64 * 100.0
        }
    }
}
