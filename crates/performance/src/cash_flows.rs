//! Cash-flow construction for XIRR
//!
//! Transaction-flow policy: every stock BUY (outflow), SELL (inflow) and
//! DIVIDEND (inflow) is a dated flow at its signed cash amount. Option
//! events, transfers and other ledger rows are not flows. A positive
//! portfolio value is added as a terminal inflow on the latest
//! transaction date.

use chrono::{DateTime, Utc};
use gains_core::{Transaction, TransactionType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CashFlow {
    pub date: DateTime<Utc>,
    /// Negative = money invested, positive = money returned
    pub amount: f64,
}

fn is_flow(tx: &Transaction) -> bool {
    !tx.is_option
        && matches!(
            tx.transaction_type,
            TransactionType::Buy | TransactionType::Sell | TransactionType::Dividend
        )
}

/// Dated, signed flows in ascending date order (ties keep source order).
pub fn build_cash_flows(
    transactions: &[Transaction],
    portfolio_value: f64,
    contract_multiplier: f64,
) -> Vec<CashFlow> {
    let valid: Vec<&Transaction> = transactions
        .iter()
        .filter(|tx| tx.validate().is_ok())
        .collect();

    let mut flows: Vec<CashFlow> = valid
        .iter()
        .filter(|tx| is_flow(tx))
        .map(|tx| CashFlow {
            date: tx.date,
            amount: tx.cash_amount(contract_multiplier),
        })
        .filter(|f| f.amount != 0.0)
        .collect();
    flows.sort_by_key(|f| f.date);

    if portfolio_value > 0.0 && !flows.is_empty() {
        if let Some(last_date) = valid.iter().map(|tx| tx.date).max() {
            flows.push(CashFlow {
                date: last_date,
                amount: portfolio_value,
            });
        }
    }

    flows
}

/// Annualized return (percent) of a transaction history.
pub fn annualized_return(
    transactions: &[Transaction],
    portfolio_value: f64,
    contract_multiplier: f64,
) -> f64 {
    let flows = build_cash_flows(transactions, portfolio_value, contract_multiplier);
    let solution = crate::xirr::solve_detailed(&flows);

    tracing::info!(
        "XIRR over {} cash flows: {:.2}% ({} iterations, converged: {})",
        flows.len(),
        solution.percent(),
        solution.iterations,
        solution.converged
    );

    solution.percent()
}
