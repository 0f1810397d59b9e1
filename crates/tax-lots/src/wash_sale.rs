//! Wash Sale Detection
//!
//! Flags losing sells that have a same-symbol replacement purchase inside
//! the wash sale window. Advisory only: cost basis is never adjusted.

use crate::lot_matcher::StockTrade;
use crate::tax_rules::TaxRules;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use gains_core::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

/// Calendar window around a losing sale
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WashSaleWindow {
    pub symbol: String,
    pub sale_date: NaiveDate,
    pub window_start: NaiveDate,
    pub window_end: NaiveDate,
    /// Loss amount at risk (positive)
    pub loss_amount: f64,
}

impl WashSaleWindow {
    pub fn new(symbol: String, sale_date: NaiveDate, loss_amount: f64, rules: &TaxRules) -> Self {
        let window_days = rules.wash_sale_window_days as i64;

        Self {
            symbol,
            sale_date,
            window_start: sale_date - Duration::days(window_days),
            window_end: sale_date + Duration::days(window_days),
            loss_amount,
        }
    }

    /// Inclusive on both ends
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.window_start && date <= self.window_end
    }

    /// Calendar days between the sale and `date`
    pub fn distance_days(&self, date: NaiveDate) -> i64 {
        (date - self.sale_date).num_days().abs()
    }
}

/// Summary of flagged wash sales for one matcher run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WashSaleSummary {
    pub flagged_count: usize,
    /// Sum of flagged losses (positive)
    pub total_flagged_loss: f64,
    pub affected_symbols: Vec<String>,
}

/// Post-processing pass over completed stock trades
pub struct WashSaleDetector<'a> {
    rules: &'a TaxRules,
}

impl<'a> WashSaleDetector<'a> {
    pub fn new(rules: &'a TaxRules) -> Self {
        Self { rules }
    }

    /// Flag every losing sell with a qualifying replacement buy.
    ///
    /// Buys whose timestamp equals an acquisition date of one of the sell's
    /// own consumed lots are not replacements.
    pub fn apply(&self, trades: &mut [StockTrade], buys: &[&Transaction]) -> WashSaleSummary {
        let mut summary = WashSaleSummary::default();
        if !self.rules.has_wash_sale_rule {
            return summary;
        }

        let mut affected = BTreeSet::new();

        for trade in trades.iter_mut() {
            if !trade.is_sell() || trade.realized_pl >= 0.0 {
                continue;
            }

            let window = WashSaleWindow::new(
                trade.symbol.clone(),
                trade.date.date_naive(),
                -trade.realized_pl,
                self.rules,
            );

            let Some(replacement) = self.find_replacement(&window, trade, buys) else {
                continue;
            };

            trade.is_wash_sale = true;
            trade.wash_sale_note = Some(format!(
                "Possible wash sale: {} repurchased on {} ({} days from this sale). \
                 The ${:.2} loss may be disallowed; cost basis was not adjusted.",
                trade.symbol,
                replacement.date_naive(),
                window.distance_days(replacement.date_naive()),
                window.loss_amount
            ));

            tracing::debug!(
                "Wash sale flagged for {} sold {} (replacement {})",
                trade.symbol,
                window.sale_date,
                replacement.date_naive()
            );

            summary.flagged_count += 1;
            summary.total_flagged_loss += window.loss_amount;
            affected.insert(trade.symbol.clone());
        }

        summary.affected_symbols = affected.into_iter().collect();
        summary
    }

    /// Closest qualifying purchase date; earliest wins a tie
    fn find_replacement(
        &self,
        window: &WashSaleWindow,
        trade: &StockTrade,
        buys: &[&Transaction],
    ) -> Option<DateTime<Utc>> {
        let matched: HashSet<DateTime<Utc>> = trade.matched_acquisition_dates().collect();

        buys.iter()
            .filter(|buy| buy.symbol == window.symbol)
            .filter(|buy| window.contains(buy.date.date_naive()))
            .filter(|buy| !matched.contains(&buy.date))
            .map(|buy| buy.date)
            .min_by_key(|date| (window.distance_days(date.date_naive()), *date))
    }
}
