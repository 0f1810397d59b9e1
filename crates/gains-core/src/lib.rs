//! Gains Core
//!
//! Shared data model for the gains/losses engine: normalized ledger
//! transactions, boundary validation, and engine configuration.

pub mod config;
pub mod error;
pub mod transaction;

pub use config::{EngineConfig, LotStrategy, ShortCallPolicy};
pub use error::*;
pub use transaction::{Transaction, TransactionType};
