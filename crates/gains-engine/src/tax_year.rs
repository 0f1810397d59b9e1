//! Per-tax-year rollup of realized gains and losses

use chrono::Datelike;
use options_engine::OptionTrade;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tax_lots::{HoldingPeriod, StockTrade};

/// Realized results for one calendar year. Loss fields are negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaxYearSummary {
    pub tax_year: i32,
    pub short_term_gains: f64,
    pub short_term_losses: f64,
    pub long_term_gains: f64,
    pub long_term_losses: f64,
    pub net_short_term: f64,
    pub net_long_term: f64,
    pub total_net: f64,
    /// Losses on sells flagged as possible wash sales (negative)
    pub wash_sale_flagged_losses: f64,
}

impl TaxYearSummary {
    fn new(tax_year: i32) -> Self {
        Self {
            tax_year,
            ..Self::default()
        }
    }

    fn add(&mut self, period: HoldingPeriod, realized_pl: f64) {
        match (period, realized_pl >= 0.0) {
            (HoldingPeriod::ShortTerm, true) => self.short_term_gains += realized_pl,
            (HoldingPeriod::ShortTerm, false) => self.short_term_losses += realized_pl,
            (HoldingPeriod::LongTerm, true) => self.long_term_gains += realized_pl,
            (HoldingPeriod::LongTerm, false) => self.long_term_losses += realized_pl,
        }
    }

    fn finish(&mut self) {
        self.net_short_term = self.short_term_gains + self.short_term_losses;
        self.net_long_term = self.long_term_gains + self.long_term_losses;
        self.total_net = self.net_short_term + self.net_long_term;
    }
}

/// Group realized stock lot closures and closing option trades by the
/// calendar year of the closing event.
pub fn summarize_by_year(stock: &[StockTrade], options: &[OptionTrade]) -> Vec<TaxYearSummary> {
    let mut years: BTreeMap<i32, TaxYearSummary> = BTreeMap::new();

    for trade in stock.iter().filter(|t| t.is_sell()) {
        let year = trade.date.year();
        let summary = years
            .entry(year)
            .or_insert_with(|| TaxYearSummary::new(year));

        for closure in &trade.closures {
            summary.add(closure.holding_period, closure.realized_pl);
        }
        if trade.is_wash_sale {
            summary.wash_sale_flagged_losses += trade.realized_pl;
        }
    }

    for trade in options.iter().filter(|t| t.trade_type.is_closing()) {
        let year = trade.date.year();
        years
            .entry(year)
            .or_insert_with(|| TaxYearSummary::new(year))
            .add(trade.holding_period, trade.realized_pl);
    }

    years
        .into_values()
        .map(|mut summary| {
            summary.finish();
            summary
        })
        .collect()
}
