//! Ledger Import
//!
//! Turns a broker transaction export (CSV) into normalized
//! [`gains_core::Transaction`] values. This is the only place raw broker
//! text is interpreted; the engine never sees unparsed fields.

pub mod fields;
pub mod normalizer;

pub use fields::{classify_action, parse_date, parse_money};
pub use normalizer::parse_csv;
