//! Normalized ledger transactions
//!
//! A `Transaction` is the typed output of the CSV normalizer and the only
//! input the engine accepts. Transactions are never mutated by the engine.

use crate::error::{GainsError, GainsResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Kind of ledger event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    Buy,
    Sell,
    Dividend,
    OptionBuyOpen,
    OptionSellOpen,
    OptionBuyClose,
    OptionSellClose,
    OptionExpired,
    OptionAssigned,
    Other,
}

impl TransactionType {
    /// Stock side of the ledger (lot matching input)
    pub fn is_stock_trade(&self) -> bool {
        matches!(self, TransactionType::Buy | TransactionType::Sell)
    }

    /// Any option lifecycle event
    pub fn is_option_event(&self) -> bool {
        matches!(
            self,
            TransactionType::OptionBuyOpen
                | TransactionType::OptionSellOpen
                | TransactionType::OptionBuyClose
                | TransactionType::OptionSellClose
                | TransactionType::OptionExpired
                | TransactionType::OptionAssigned
        )
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Buy => write!(f, "BUY"),
            TransactionType::Sell => write!(f, "SELL"),
            TransactionType::Dividend => write!(f, "DIVIDEND"),
            TransactionType::OptionBuyOpen => write!(f, "OPTION_BUY_OPEN"),
            TransactionType::OptionSellOpen => write!(f, "OPTION_SELL_OPEN"),
            TransactionType::OptionBuyClose => write!(f, "OPTION_BUY_CLOSE"),
            TransactionType::OptionSellClose => write!(f, "OPTION_SELL_CLOSE"),
            TransactionType::OptionExpired => write!(f, "OPTION_EXPIRED"),
            TransactionType::OptionAssigned => write!(f, "OPTION_ASSIGNED"),
            TransactionType::Other => write!(f, "OTHER"),
        }
    }
}

/// A single normalized ledger event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: DateTime<Utc>,
    /// Ticker, or dash-stripped option symbol (ticker + YYMMDD + C/P + strike)
    pub symbol: String,
    pub transaction_type: TransactionType,
    pub quantity: f64,
    /// Per share, or per-share premium for options
    pub price: f64,
    #[serde(default)]
    pub commission: f64,
    #[serde(default)]
    pub fees: f64,
    /// Signed cash effect as reported by the broker (0 when unknown)
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub is_option: bool,
    /// Source columns kept verbatim for fallback lookups
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub raw: BTreeMap<String, String>,
}

impl Transaction {
    /// Stock transaction with no costs and an unknown cash amount
    pub fn stock(
        date: DateTime<Utc>,
        symbol: impl Into<String>,
        transaction_type: TransactionType,
        quantity: f64,
        price: f64,
    ) -> Self {
        Self {
            date,
            symbol: symbol.into(),
            transaction_type,
            quantity,
            price,
            commission: 0.0,
            fees: 0.0,
            amount: 0.0,
            is_option: false,
            raw: BTreeMap::new(),
        }
    }

    /// Option transaction; `price` is the per-share premium
    pub fn option(
        date: DateTime<Utc>,
        symbol: impl Into<String>,
        transaction_type: TransactionType,
        contracts: f64,
        price: f64,
    ) -> Self {
        Self {
            is_option: true,
            ..Self::stock(date, symbol, transaction_type, contracts, price)
        }
    }

    pub fn with_costs(mut self, commission: f64, fees: f64) -> Self {
        self.commission = commission;
        self.fees = fees;
        self
    }

    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = amount;
        self
    }

    /// Commission plus fees
    pub fn total_costs(&self) -> f64 {
        self.commission + self.fees
    }

    /// Check the numeric fields before handing the transaction to the engine.
    pub fn validate(&self) -> GainsResult<()> {
        let fields = [
            ("quantity", self.quantity),
            ("price", self.price),
            ("commission", self.commission),
            ("fees", self.fees),
            ("amount", self.amount),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Err(GainsError::InvalidTransaction(format!(
                    "{} {} on {}: {} is not a finite number",
                    self.transaction_type,
                    self.symbol,
                    self.date.date_naive(),
                    name
                )));
            }
        }

        if self.quantity < 0.0 {
            return Err(GainsError::InvalidTransaction(format!(
                "{} {} on {}: negative quantity {}",
                self.transaction_type,
                self.symbol,
                self.date.date_naive(),
                self.quantity
            )));
        }

        if self.symbol.trim().is_empty() && self.transaction_type != TransactionType::Other {
            return Err(GainsError::InvalidTransaction(format!(
                "{} on {}: missing symbol",
                self.transaction_type,
                self.date.date_naive()
            )));
        }

        Ok(())
    }

    /// Signed cash effect of this transaction.
    ///
    /// Uses the broker-reported `amount` when present, otherwise derives it
    /// from quantity and price (scaled by `multiplier` for options).
    pub fn cash_amount(&self, multiplier: f64) -> f64 {
        if self.amount != 0.0 {
            return self.amount;
        }

        let scale = if self.is_option { multiplier } else { 1.0 };
        let gross = self.quantity * self.price * scale;
        match self.transaction_type {
            TransactionType::Buy
            | TransactionType::OptionBuyOpen
            | TransactionType::OptionBuyClose => -(gross + self.total_costs()),
            TransactionType::Sell
            | TransactionType::OptionSellOpen
            | TransactionType::OptionSellClose => gross - self.total_costs(),
            TransactionType::Dividend => gross,
            TransactionType::OptionExpired
            | TransactionType::OptionAssigned
            | TransactionType::Other => -self.total_costs(),
        }
    }
}
