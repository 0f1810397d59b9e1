//! Performance
//!
//! Annualized money-weighted return (XIRR) over a transaction history.

pub mod cash_flows;
pub mod xirr;

pub use cash_flows::{annualized_return, build_cash_flows, CashFlow};
pub use xirr::{npv, solve, XirrSolution};
