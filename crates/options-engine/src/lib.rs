//! Options Engine
//!
//! Classifies option positions into strategies at open time and matches
//! closing events (buy/sell to close, expiration, assignment) against a
//! FIFO queue per option symbol.

pub mod contract;
pub mod matcher;
pub mod strategy;

pub use contract::{normalize_symbol, underlying_symbol, OptionContract, OptionType};
pub use matcher::{OptionMatchResult, OptionPosition, OptionTrade, OptionTradeType, OptionsMatcher};
pub use strategy::{OptionSide, OptionStrategy, StrategyClassifier, StrategyStats};
