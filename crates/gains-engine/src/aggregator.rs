//! Gains/Losses Aggregator
//!
//! Pure composition of the stock and option results. Losses are kept as
//! negative numbers so `net_pl = gains + losses` at every level.

use crate::tax_year::{summarize_by_year, TaxYearSummary};
use chrono::{DateTime, Utc};
use options_engine::{OptionMatchResult, OptionPosition, OptionStrategy, OptionTrade, StrategyStats};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tax_lots::{HoldingPeriod, LotMatchResult, OpenPositions, StockTrade, WashSaleSummary};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StockResults {
    pub total_realized_gains: f64,
    pub total_realized_losses: f64,
    pub net_pl: f64,
    pub trades: Vec<StockTrade>,
    pub open_positions: OpenPositions,
    pub wash_sales: WashSaleSummary,
}

impl From<LotMatchResult> for StockResults {
    fn from(result: LotMatchResult) -> Self {
        let gains = result.total_realized_gains();
        let losses = result.total_realized_losses();
        Self {
            total_realized_gains: gains,
            total_realized_losses: losses,
            net_pl: gains + losses,
            trades: result.trades,
            open_positions: result.open_positions,
            wash_sales: result.wash_sales,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionResults {
    pub total_realized_gains: f64,
    pub total_realized_losses: f64,
    pub net_pl: f64,
    pub trades: Vec<OptionTrade>,
    pub open_positions: BTreeMap<String, Vec<OptionPosition>>,
    pub strategy_summary: BTreeMap<OptionStrategy, StrategyStats>,
    pub win_rate: f64,
}

impl From<OptionMatchResult> for OptionResults {
    fn from(result: OptionMatchResult) -> Self {
        let gains = result.total_realized_gains();
        let losses = result.total_realized_losses();
        Self {
            total_realized_gains: gains,
            total_realized_losses: losses,
            net_pl: gains + losses,
            trades: result.trades,
            open_positions: result.open_positions,
            strategy_summary: result.strategy_summary,
            win_rate: result.win_rate,
        }
    }
}

/// One row of the merged trade list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "asset_class", rename_all = "lowercase")]
pub enum ReportTrade {
    Stock(StockTrade),
    Option(OptionTrade),
}

impl ReportTrade {
    pub fn date(&self) -> DateTime<Utc> {
        match self {
            ReportTrade::Stock(t) => t.date,
            ReportTrade::Option(t) => t.date,
        }
    }

    pub fn symbol(&self) -> &str {
        match self {
            ReportTrade::Stock(t) => &t.symbol,
            ReportTrade::Option(t) => &t.symbol,
        }
    }

    pub fn realized_pl(&self) -> f64 {
        match self {
            ReportTrade::Stock(t) => t.realized_pl,
            ReportTrade::Option(t) => t.realized_pl,
        }
    }
}

/// Realized P&L split by holding period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermBreakdown {
    pub short_term_net: f64,
    pub long_term_net: f64,
}

impl TermBreakdown {
    fn from_results(stock: &StockResults, options: &OptionResults) -> Self {
        let mut breakdown = Self::default();

        for closure in stock.trades.iter().flat_map(|t| t.closures.iter()) {
            match closure.holding_period {
                HoldingPeriod::ShortTerm => breakdown.short_term_net += closure.realized_pl,
                HoldingPeriod::LongTerm => breakdown.long_term_net += closure.realized_pl,
            }
        }

        // Options are always short-term
        breakdown.short_term_net += options.net_pl;
        breakdown
    }
}

/// Combined report handed to presentation and PDF collaborators
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GainsReport {
    pub total_realized_gains: f64,
    /// Negative number
    pub total_realized_losses: f64,
    pub net_pl: f64,
    pub stock_results: StockResults,
    pub option_results: OptionResults,
    /// Stock and option trades ordered by date
    pub all_trades: Vec<ReportTrade>,
    pub term_breakdown: TermBreakdown,
    pub tax_years: Vec<TaxYearSummary>,
    /// Annualized XIRR in percent
    pub annualized_return: f64,
}

/// Merge stock and option results into one report.
pub fn combine(stock: LotMatchResult, options: OptionMatchResult) -> GainsReport {
    let stock_results = StockResults::from(stock);
    let option_results = OptionResults::from(options);

    let total_realized_gains =
        stock_results.total_realized_gains + option_results.total_realized_gains;
    let total_realized_losses =
        stock_results.total_realized_losses + option_results.total_realized_losses;

    let mut all_trades: Vec<ReportTrade> = stock_results
        .trades
        .iter()
        .cloned()
        .map(ReportTrade::Stock)
        .chain(option_results.trades.iter().cloned().map(ReportTrade::Option))
        .collect();
    all_trades.sort_by_key(|t| t.date());

    let term_breakdown = TermBreakdown::from_results(&stock_results, &option_results);
    let tax_years = summarize_by_year(&stock_results.trades, &option_results.trades);

    GainsReport {
        total_realized_gains,
        total_realized_losses,
        net_pl: total_realized_gains + total_realized_losses,
        stock_results,
        option_results,
        all_trades,
        term_breakdown,
        tax_years,
        annualized_return: 0.0,
    }
}
