//! Tax-Lot Matcher
//!
//! Replays stock BUY/SELL transactions in date order, keeping per-symbol lot
//! queues, and realizes each SELL against lots chosen by the configured
//! strategy. All state lives inside a single `match_transactions` call.

use crate::tax_rules::{HoldingPeriod, TaxLot, TaxRules, TradeTerm};
use crate::wash_sale::{WashSaleDetector, WashSaleSummary};
use chrono::{DateTime, Utc};
use gains_core::{LotStrategy, Transaction, TransactionType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Quantities at or below this are treated as exhausted
pub const QUANTITY_EPSILON: f64 = 1e-9;

/// Remaining lots per symbol after all transactions are replayed
pub type OpenPositions = BTreeMap<String, Vec<TaxLot>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

/// The part of a SELL realized against one lot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LotClosure {
    pub quantity: f64,
    /// `None` for orphaned shares with no purchase on record
    pub acquisition_date: Option<DateTime<Utc>>,
    pub cost_per_share: f64,
    pub cost: f64,
    /// Share of the sell proceeds attributed to this lot
    pub proceeds: f64,
    pub realized_pl: f64,
    pub holding_days: Option<i64>,
    pub holding_period: HoldingPeriod,
    pub orphaned: bool,
}

/// A realized (SELL) or recorded (BUY) stock trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockTrade {
    pub date: DateTime<Utc>,
    pub symbol: String,
    #[serde(rename = "type")]
    pub side: TradeSide,
    pub quantity: f64,
    pub price: f64,
    pub proceeds: f64,
    pub cost: f64,
    pub realized_pl: f64,
    /// Only set on SELL trades
    pub term: Option<TradeTerm>,
    pub closures: Vec<LotClosure>,
    pub is_wash_sale: bool,
    pub wash_sale_note: Option<String>,
    /// Assumptions made while matching (orphaned shares)
    pub note: Option<String>,
}

impl StockTrade {
    pub fn is_sell(&self) -> bool {
        self.side == TradeSide::Sell
    }

    /// Acquisition dates of the lots this sell consumed
    pub fn matched_acquisition_dates(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.closures.iter().filter_map(|c| c.acquisition_date)
    }
}

/// Output of a matcher run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LotMatchResult {
    pub trades: Vec<StockTrade>,
    pub open_positions: OpenPositions,
    pub wash_sales: WashSaleSummary,
}

impl LotMatchResult {
    pub fn sells(&self) -> impl Iterator<Item = &StockTrade> {
        self.trades.iter().filter(|t| t.is_sell())
    }

    /// Sum of positive realized P&L across sells
    pub fn total_realized_gains(&self) -> f64 {
        self.sells()
            .map(|t| t.realized_pl)
            .filter(|pl| *pl > 0.0)
            .sum()
    }

    /// Sum of negative realized P&L across sells (a negative number)
    pub fn total_realized_losses(&self) -> f64 {
        self.sells()
            .map(|t| t.realized_pl)
            .filter(|pl| *pl < 0.0)
            .sum()
    }

    /// Shares still held for a symbol
    pub fn shares_held(&self, symbol: &str) -> f64 {
        self.open_positions
            .get(symbol)
            .map(|lots| lots.iter().map(|l| l.quantity).sum())
            .unwrap_or(0.0)
    }
}

/// Index of the next lot to consume under `strategy`
pub fn select_lot(lots: &[TaxLot], strategy: LotStrategy) -> Option<usize> {
    if lots.is_empty() {
        return None;
    }

    match strategy {
        LotStrategy::Fifo => Some(0),
        LotStrategy::Lifo => Some(lots.len() - 1),
        LotStrategy::Hifo => {
            let mut best = 0;
            for (idx, lot) in lots.iter().enumerate().skip(1) {
                if lot.cost_per_share > lots[best].cost_per_share {
                    best = idx;
                }
            }
            Some(best)
        }
    }
}

/// Matches stock sells to purchase lots
#[derive(Debug, Clone)]
pub struct LotMatcher {
    strategy: LotStrategy,
    rules: TaxRules,
}

impl LotMatcher {
    pub fn new(strategy: LotStrategy, rules: TaxRules) -> Self {
        Self { strategy, rules }
    }

    pub fn strategy(&self) -> LotStrategy {
        self.strategy
    }

    pub fn rules(&self) -> &TaxRules {
        &self.rules
    }

    /// Replay `transactions` and realize every stock sell.
    ///
    /// Option events, dividends and invalid transactions are ignored. The
    /// input slice is left untouched, so repeated runs with different
    /// strategies see the same history.
    pub fn match_transactions(&self, transactions: &[Transaction]) -> LotMatchResult {
        let mut ordered: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| !tx.is_option && tx.transaction_type.is_stock_trade())
            .filter(|tx| match tx.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Skipping stock transaction: {}", e);
                    false
                }
            })
            .collect();
        // Stable: same-date ties keep source order
        ordered.sort_by_key(|tx| tx.date);

        let mut lots: HashMap<String, Vec<TaxLot>> = HashMap::new();
        let mut trades = Vec::with_capacity(ordered.len());
        let mut buys: Vec<&Transaction> = Vec::new();

        for tx in ordered {
            if tx.quantity <= QUANTITY_EPSILON {
                tracing::warn!(
                    "Skipping zero-quantity {} {} on {}",
                    tx.transaction_type,
                    tx.symbol,
                    tx.date.date_naive()
                );
                continue;
            }

            match tx.transaction_type {
                TransactionType::Buy => {
                    trades.push(self.apply_buy(tx, &mut lots));
                    buys.push(tx);
                }
                TransactionType::Sell => {
                    let symbol_lots = lots.entry(tx.symbol.clone()).or_default();
                    trades.push(self.apply_sell(tx, symbol_lots));
                }
                _ => {}
            }
        }

        let wash_sales = WashSaleDetector::new(&self.rules).apply(&mut trades, &buys);

        let open_positions: OpenPositions = lots
            .into_iter()
            .filter(|(_, symbol_lots)| !symbol_lots.is_empty())
            .collect();

        tracing::debug!(
            "Lot matching ({}) produced {} trades, {} open symbols",
            self.strategy,
            trades.len(),
            open_positions.len()
        );

        LotMatchResult {
            trades,
            open_positions,
            wash_sales,
        }
    }

    fn apply_buy(&self, tx: &Transaction, lots: &mut HashMap<String, Vec<TaxLot>>) -> StockTrade {
        let cost_per_share = tx.price + tx.total_costs() / tx.quantity;
        let lot = TaxLot::new(tx.quantity, cost_per_share, tx.date);
        let cost = lot.cost_basis();

        lots.entry(tx.symbol.clone()).or_default().push(lot);

        StockTrade {
            date: tx.date,
            symbol: tx.symbol.clone(),
            side: TradeSide::Buy,
            quantity: tx.quantity,
            price: tx.price,
            proceeds: 0.0,
            cost,
            realized_pl: 0.0,
            term: None,
            closures: Vec::new(),
            is_wash_sale: false,
            wash_sale_note: None,
            note: None,
        }
    }

    fn apply_sell(&self, tx: &Transaction, symbol_lots: &mut Vec<TaxLot>) -> StockTrade {
        let total_proceeds = tx.quantity * tx.price - tx.total_costs();
        let prorate = |units: f64| units / tx.quantity * total_proceeds;

        let mut closures = Vec::new();
        let mut remaining = tx.quantity;

        while remaining > QUANTITY_EPSILON {
            let Some(idx) = select_lot(symbol_lots, self.strategy) else {
                break;
            };

            let lot = &mut symbol_lots[idx];
            let units = lot.quantity.min(remaining);
            let cost = units * lot.cost_per_share;
            let proceeds = prorate(units);
            let holding_days = self.rules.holding_days(lot.acquisition_date, tx.date);

            closures.push(LotClosure {
                quantity: units,
                acquisition_date: Some(lot.acquisition_date),
                cost_per_share: lot.cost_per_share,
                cost,
                proceeds,
                realized_pl: proceeds - cost,
                holding_days: Some(holding_days),
                holding_period: self.rules.holding_period(holding_days),
                orphaned: false,
            });

            lot.quantity -= units;
            remaining -= units;

            tracing::debug!(
                "{} sell on {}: consumed {} shares from lot acquired {}",
                tx.symbol,
                tx.date.date_naive(),
                units,
                lot.acquisition_date.date_naive()
            );

            if lot.quantity <= QUANTITY_EPSILON {
                symbol_lots.remove(idx);
            }
        }

        let note = if remaining > QUANTITY_EPSILON {
            let proceeds = prorate(remaining);
            closures.push(LotClosure {
                quantity: remaining,
                acquisition_date: None,
                cost_per_share: 0.0,
                cost: 0.0,
                proceeds,
                realized_pl: proceeds,
                holding_days: None,
                holding_period: HoldingPeriod::LongTerm,
                orphaned: true,
            });

            let message = if (remaining - tx.quantity).abs() <= QUANTITY_EPSILON {
                format!(
                    "No purchase history for {}: assumed zero cost basis and long-term holding for {} shares",
                    tx.symbol, remaining
                )
            } else {
                format!(
                    "{} of {} shares had no matching lots: assumed zero cost basis and long-term holding",
                    remaining, tx.quantity
                )
            };
            tracing::warn!("{} sell on {}: {}", tx.symbol, tx.date.date_naive(), message);
            Some(message)
        } else {
            None
        };

        let cost: f64 = closures.iter().map(|c| c.cost).sum();
        let term = TradeTerm::from_periods(closures.iter().map(|c| c.holding_period));

        StockTrade {
            date: tx.date,
            symbol: tx.symbol.clone(),
            side: TradeSide::Sell,
            quantity: tx.quantity,
            price: tx.price,
            proceeds: total_proceeds,
            cost,
            realized_pl: total_proceeds - cost,
            term,
            closures,
            is_wash_sale: false,
            wash_sale_note: None,
            note,
        }
    }
}
