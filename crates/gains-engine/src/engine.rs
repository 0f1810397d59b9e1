//! End-to-end pipeline
//!
//! transactions -> lot matcher -> (stock trades, open lots) -> options
//! matcher -> aggregator, plus XIRR over the same transactions. Each run
//! builds fresh state, so switching the lot strategy and re-running gives
//! the same answer as a first run with that strategy.

use crate::aggregator::{combine, GainsReport};
use gains_core::{EngineConfig, LotStrategy, Transaction, TransactionType};
use options_engine::{underlying_symbol, OptionsMatcher};
use std::collections::HashSet;
use tax_lots::{LotMatcher, TaxRules};

/// Symbols whose history shows shares were held at some point: stock sells
/// and dividends. Used by the strict short-call policy.
pub fn ownership_evidence(transactions: &[Transaction]) -> HashSet<String> {
    transactions
        .iter()
        .filter(|tx| !tx.is_option)
        .filter(|tx| {
            matches!(
                tx.transaction_type,
                TransactionType::Sell | TransactionType::Dividend
            )
        })
        .map(|tx| underlying_symbol(&tx.symbol))
        .filter(|symbol| !symbol.is_empty())
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct GainsEngine {
    config: EngineConfig,
}

impl GainsEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Same configuration with a different lot strategy
    pub fn with_strategy(&self, lot_strategy: LotStrategy) -> Self {
        Self {
            config: EngineConfig {
                lot_strategy,
                ..self.config.clone()
            },
        }
    }

    /// Run with ownership evidence derived from the history itself.
    pub fn run(&self, transactions: &[Transaction]) -> GainsReport {
        let evidence = ownership_evidence(transactions);
        self.run_with_evidence(transactions, &evidence)
    }

    pub fn run_with_evidence(
        &self,
        transactions: &[Transaction],
        ownership_evidence: &HashSet<String>,
    ) -> GainsReport {
        let rules = TaxRules::from_config(&self.config);

        let stock = LotMatcher::new(self.config.lot_strategy, rules).match_transactions(transactions);

        let options = OptionsMatcher::new(
            self.config.short_call_policy,
            self.config.contract_multiplier,
        )
        .match_transactions(transactions, &stock.open_positions, ownership_evidence);

        let mut report = combine(stock, options);
        report.annualized_return = performance::annualized_return(
            transactions,
            self.config.portfolio_value,
            self.config.contract_multiplier,
        );

        tracing::info!(
            "Gains report ({}): net P&L {:.2} (stock {:.2}, options {:.2}), {} trades, {} wash sales",
            self.config.lot_strategy,
            report.net_pl,
            report.stock_results.net_pl,
            report.option_results.net_pl,
            report.all_trades.len(),
            report.stock_results.wash_sales.flagged_count
        );

        report
    }
}
