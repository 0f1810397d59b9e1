//! Gains Engine
//!
//! Runs the full pipeline over a transaction history: stock lot matching,
//! wash sale flagging, option strategy matching, aggregation and XIRR.

pub mod aggregator;
pub mod engine;
pub mod tax_year;


pub use aggregator::{combine, GainsReport, OptionResults, ReportTrade, StockResults, TermBreakdown};
pub use engine::{ownership_evidence, GainsEngine};
pub use tax_year::{summarize_by_year, TaxYearSummary};
