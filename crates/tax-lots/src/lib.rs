//! Tax Lots
//!
//! Cost-basis lot matching (FIFO / LIFO / HIFO) for stock sells, holding
//! period classification, and advisory wash sale detection.

pub mod lot_matcher;
pub mod tax_rules;
pub mod wash_sale;

pub use lot_matcher::{
    select_lot, LotClosure, LotMatchResult, LotMatcher, OpenPositions, StockTrade, TradeSide,
};
pub use tax_rules::{HoldingPeriod, TaxLot, TaxRules, TradeTerm};
pub use wash_sale::{WashSaleDetector, WashSaleSummary, WashSaleWindow};
