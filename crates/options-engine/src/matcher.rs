//! Option position matching
//!
//! Every option symbol keeps its own FIFO queue of open positions,
//! independent of the stock lot strategy. Strategy and side are fixed when
//! a position opens and carried to whatever event closes it.

use crate::contract::{OptionContract, OptionType};
use crate::strategy::{OptionSide, OptionStrategy, StrategyClassifier, StrategyStats};
use chrono::{DateTime, Utc};
use gains_core::{ShortCallPolicy, Transaction, TransactionType};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tax_lots::{HoldingPeriod, OpenPositions};

const QUANTITY_EPSILON: f64 = 1e-9;

/// An open option position waiting in its symbol's queue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionPosition {
    pub quantity: f64,
    /// Cash premium per contract (already scaled by the multiplier)
    pub premium_per_contract: f64,
    pub open_date: DateTime<Utc>,
    pub side: OptionSide,
    pub strategy: OptionStrategy,
    pub option_type: OptionType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OptionTradeType {
    SellOpen,
    BuyOpen,
    BuyClose,
    SellClose,
    Expired,
    Assigned,
}

impl OptionTradeType {
    pub fn is_closing(&self) -> bool {
        !matches!(self, OptionTradeType::SellOpen | OptionTradeType::BuyOpen)
    }
}

/// Realized (closing) or recorded (opening) option trade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionTrade {
    pub date: DateTime<Utc>,
    pub symbol: String,
    pub underlying_symbol: String,
    #[serde(rename = "type")]
    pub trade_type: OptionTradeType,
    pub option_type: OptionType,
    pub strategy: OptionStrategy,
    pub quantity: f64,
    /// Cash premium attributed to this record (positive)
    pub premium: f64,
    pub realized_pl: f64,
    /// Options are always short-term
    pub holding_period: HoldingPeriod,
    /// Open date of the matched position, if any
    pub open_date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Output of an options matcher run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionMatchResult {
    pub trades: Vec<OptionTrade>,
    pub open_positions: BTreeMap<String, Vec<OptionPosition>>,
    pub strategy_summary: BTreeMap<OptionStrategy, StrategyStats>,
    /// Percentage of closing trades with positive P&L (0 when none)
    pub win_rate: f64,
}

impl OptionMatchResult {
    pub fn closing_trades(&self) -> impl Iterator<Item = &OptionTrade> {
        self.trades.iter().filter(|t| t.trade_type.is_closing())
    }

    pub fn total_realized_gains(&self) -> f64 {
        self.closing_trades()
            .map(|t| t.realized_pl)
            .filter(|pl| *pl > 0.0)
            .sum()
    }

    /// Negative number
    pub fn total_realized_losses(&self) -> f64 {
        self.closing_trades()
            .map(|t| t.realized_pl)
            .filter(|pl| *pl < 0.0)
            .sum()
    }

    pub fn net_pl(&self) -> f64 {
        self.total_realized_gains() + self.total_realized_losses()
    }
}

/// Slice of a queued position consumed by a closing event
struct Consumed {
    units: f64,
    position: OptionPosition,
}

type PositionQueues = HashMap<String, VecDeque<OptionPosition>>;

pub struct OptionsMatcher {
    policy: ShortCallPolicy,
    contract_multiplier: f64,
}

impl OptionsMatcher {
    pub fn new(policy: ShortCallPolicy, contract_multiplier: f64) -> Self {
        Self {
            policy,
            contract_multiplier,
        }
    }

    /// Match option events in date order.
    ///
    /// `open_stock` and `ownership_evidence` only matter for short calls
    /// under the strict policy.
    pub fn match_transactions(
        &self,
        transactions: &[Transaction],
        open_stock: &OpenPositions,
        ownership_evidence: &HashSet<String>,
    ) -> OptionMatchResult {
        let classifier = StrategyClassifier::new(
            self.policy,
            self.contract_multiplier,
            open_stock,
            ownership_evidence,
        );

        let mut ordered: Vec<&Transaction> = transactions
            .iter()
            .filter(|tx| tx.transaction_type.is_option_event())
            .filter(|tx| match tx.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("Skipping option transaction: {}", e);
                    false
                }
            })
            .collect();
        ordered.sort_by_key(|tx| tx.date);

        let mut queues: PositionQueues = HashMap::new();
        let mut trades = Vec::new();
        let mut summary: BTreeMap<OptionStrategy, StrategyStats> = BTreeMap::new();

        for tx in ordered {
            let contract = OptionContract::parse(&tx.symbol);
            let queue = queues.entry(contract.symbol.clone()).or_default();

            let produced = match tx.transaction_type {
                TransactionType::OptionSellOpen => {
                    vec![self.open(tx, &contract, OptionSide::Short, &classifier, queue)]
                }
                TransactionType::OptionBuyOpen => {
                    vec![self.open(tx, &contract, OptionSide::Long, &classifier, queue)]
                }
                TransactionType::OptionBuyClose => {
                    self.close(tx, &contract, OptionSide::Short, &classifier, queue)
                }
                TransactionType::OptionSellClose => {
                    self.close(tx, &contract, OptionSide::Long, &classifier, queue)
                }
                TransactionType::OptionExpired | TransactionType::OptionAssigned => {
                    self.settle(tx, &contract, queue)
                }
                _ => Vec::new(),
            };

            for trade in &produced {
                let stats = summary.entry(trade.strategy).or_default();
                if trade.trade_type.is_closing() {
                    stats.record_close(trade.strategy, trade.realized_pl);
                } else {
                    stats.record_open(trade.strategy.side(), trade.premium);
                }
            }
            trades.extend(produced);
        }

        let closed = trades.iter().filter(|t| t.trade_type.is_closing()).count();
        let wins = trades
            .iter()
            .filter(|t| t.trade_type.is_closing() && t.realized_pl > 0.0)
            .count();
        let win_rate = if closed == 0 {
            0.0
        } else {
            wins as f64 / closed as f64 * 100.0
        };

        let open_positions = queues
            .into_iter()
            .filter(|(_, queue)| !queue.is_empty())
            .map(|(symbol, queue)| (symbol, queue.into_iter().collect()))
            .collect();

        tracing::debug!(
            "Option matching produced {} trades ({} closed, win rate {:.1}%)",
            trades.len(),
            closed,
            win_rate
        );

        OptionMatchResult {
            trades,
            open_positions,
            strategy_summary: summary,
            win_rate,
        }
    }

    fn open(
        &self,
        tx: &Transaction,
        contract: &OptionContract,
        side: OptionSide,
        classifier: &StrategyClassifier<'_>,
        queue: &mut VecDeque<OptionPosition>,
    ) -> OptionTrade {
        let premium = self.side_premium(tx, side, true);
        let strategy =
            classifier.classify(side, contract.option_type, &contract.underlying, tx.quantity);

        if tx.quantity > QUANTITY_EPSILON {
            queue.push_back(OptionPosition {
                quantity: tx.quantity,
                premium_per_contract: premium / tx.quantity,
                open_date: tx.date,
                side,
                strategy,
                option_type: contract.option_type,
            });
        } else {
            tracing::warn!("Zero-contract open for {} on {}", contract.symbol, tx.date.date_naive());
        }

        let trade_type = match side {
            OptionSide::Short => OptionTradeType::SellOpen,
            OptionSide::Long => OptionTradeType::BuyOpen,
        };
        self.trade(tx, contract, trade_type, strategy, tx.quantity, premium, 0.0, None, None)
    }

    /// Buy-to-close (against shorts) or sell-to-close (against longs)
    fn close(
        &self,
        tx: &Transaction,
        contract: &OptionContract,
        side: OptionSide,
        classifier: &StrategyClassifier<'_>,
        queue: &mut VecDeque<OptionPosition>,
    ) -> Vec<OptionTrade> {
        let close_premium = self.side_premium(tx, side, false);
        let trade_type = match side {
            OptionSide::Short => OptionTradeType::BuyClose,
            OptionSide::Long => OptionTradeType::SellClose,
        };

        // No contract count: close the oldest position on this side
        let quantity = if tx.quantity > QUANTITY_EPSILON {
            tx.quantity
        } else {
            queue
                .iter()
                .find(|p| p.side == side)
                .map(|p| p.quantity)
                .unwrap_or(0.0)
        };
        let prorate = |units: f64| {
            if quantity > QUANTITY_EPSILON {
                units / quantity * close_premium
            } else {
                close_premium
            }
        };

        let (consumed, unmatched) = consume(queue, side, quantity);
        let mut trades = Vec::with_capacity(consumed.len() + 1);

        for piece in consumed {
            let opening = piece.units * piece.position.premium_per_contract;
            let closing = prorate(piece.units);
            let realized_pl = match side {
                OptionSide::Short => opening - closing,
                OptionSide::Long => closing - opening,
            };
            trades.push(self.trade(
                tx,
                contract,
                trade_type,
                piece.position.strategy,
                piece.units,
                closing,
                realized_pl,
                Some(piece.position.open_date),
                None,
            ));
        }

        if unmatched > QUANTITY_EPSILON || trades.is_empty() {
            let strategy =
                classifier.classify(side, contract.option_type, &contract.underlying, unmatched);
            let closing = prorate(unmatched);
            let realized_pl = match side {
                OptionSide::Short => -closing,
                OptionSide::Long => closing,
            };
            let note = format!(
                "No open position for {} {} contracts: assumed zero opening premium",
                unmatched, contract.symbol
            );
            tracing::warn!("{} on {}: {}", trade_type_label(trade_type), tx.date.date_naive(), note);
            trades.push(self.trade(
                tx,
                contract,
                trade_type,
                strategy,
                unmatched,
                closing,
                realized_pl,
                None,
                Some(note),
            ));
        }

        trades
    }

    /// Expiration or assignment, consumed from the front of the queue
    fn settle(
        &self,
        tx: &Transaction,
        contract: &OptionContract,
        queue: &mut VecDeque<OptionPosition>,
    ) -> Vec<OptionTrade> {
        let trade_type = if tx.transaction_type == TransactionType::OptionExpired {
            OptionTradeType::Expired
        } else {
            OptionTradeType::Assigned
        };

        let Some(front) = queue.front() else {
            tracing::warn!(
                "{} for {} on {} with no open position, skipped",
                trade_type_label(trade_type),
                contract.symbol,
                tx.date.date_naive()
            );
            return Vec::new();
        };

        let side = front.side;
        let quantity = if tx.quantity > QUANTITY_EPSILON {
            tx.quantity
        } else {
            front.quantity
        };

        let (consumed, unmatched) = consume(queue, side, quantity);
        if unmatched > QUANTITY_EPSILON {
            tracing::warn!(
                "{} for {}: {} contracts exceeded open positions",
                trade_type_label(trade_type),
                contract.symbol,
                unmatched
            );
        }

        consumed
            .into_iter()
            .map(|piece| {
                let premium = piece.units * piece.position.premium_per_contract;
                let realized_pl = match piece.position.side {
                    OptionSide::Short => premium,
                    OptionSide::Long => -premium,
                };
                self.trade(
                    tx,
                    contract,
                    trade_type,
                    piece.position.strategy,
                    piece.units,
                    premium,
                    realized_pl,
                    Some(piece.position.open_date),
                    None,
                )
            })
            .collect()
    }

    /// Premium seen from the position's side, signed so that a short
    /// collects on open and pays on close while a long does the reverse.
    /// Costs larger than the gross premium flip the sign.
    fn side_premium(&self, tx: &Transaction, side: OptionSide, opening: bool) -> f64 {
        let cash = tx.cash_amount(self.contract_multiplier);
        match (side, opening) {
            (OptionSide::Short, true) | (OptionSide::Long, false) => cash,
            (OptionSide::Short, false) | (OptionSide::Long, true) => -cash,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn trade(
        &self,
        tx: &Transaction,
        contract: &OptionContract,
        trade_type: OptionTradeType,
        strategy: OptionStrategy,
        quantity: f64,
        premium: f64,
        realized_pl: f64,
        open_date: Option<DateTime<Utc>>,
        note: Option<String>,
    ) -> OptionTrade {
        OptionTrade {
            date: tx.date,
            symbol: contract.symbol.clone(),
            underlying_symbol: contract.underlying.clone(),
            trade_type,
            option_type: contract.option_type,
            strategy,
            quantity,
            premium,
            realized_pl,
            holding_period: HoldingPeriod::ShortTerm,
            open_date,
            note,
        }
    }
}

/// Take `quantity` contracts from the oldest positions on `side`.
/// Returns the consumed slices and whatever could not be matched.
fn consume(queue: &mut VecDeque<OptionPosition>, side: OptionSide, quantity: f64) -> (Vec<Consumed>, f64) {
    let mut consumed = Vec::new();
    let mut remaining = quantity;

    while remaining > QUANTITY_EPSILON {
        let Some(idx) = queue.iter().position(|p| p.side == side) else {
            break;
        };

        let position = &mut queue[idx];
        let units = position.quantity.min(remaining);
        consumed.push(Consumed {
            units,
            position: position.clone(),
        });

        position.quantity -= units;
        remaining -= units;

        if position.quantity <= QUANTITY_EPSILON {
            queue.remove(idx);
        }
    }

    (consumed, remaining.max(0.0))
}

fn trade_type_label(trade_type: OptionTradeType) -> &'static str {
    match trade_type {
        OptionTradeType::SellOpen => "SELL_OPEN",
        OptionTradeType::BuyOpen => "BUY_OPEN",
        OptionTradeType::BuyClose => "BUY_CLOSE",
        OptionTradeType::SellClose => "SELL_CLOSE",
        OptionTradeType::Expired => "EXPIRED",
        OptionTradeType::Assigned => "ASSIGNED",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use tax_lots::TaxLot;

    const CALL: &str = "XYZ240315C50";
    const PUT: &str = "XYZ240315P45";

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap() + Duration::days(offset)
    }

    fn opt(offset: i64, symbol: &str, kind: TransactionType, contracts: f64, price: f64) -> Transaction {
        Transaction::option(day(offset), symbol, kind, contracts, price)
    }

    fn run(txs: &[Transaction]) -> OptionMatchResult {
        OptionsMatcher::new(ShortCallPolicy::AlwaysCovered, 100.0).match_transactions(
            txs,
            &OpenPositions::new(),
            &HashSet::new(),
        )
    }

    #[test]
    fn test_covered_call_expires_worthless() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionSellOpen, 1.0, 2.0),
            opt(30, CALL, TransactionType::OptionExpired, 1.0, 0.0),
        ];
        let result = run(&txs);

        let stats = &result.strategy_summary[&OptionStrategy::CoveredCalls];
        assert!((stats.premium_retained - 200.0).abs() < 1e-9);
        assert!((stats.net_pl - 200.0).abs() < 1e-9);
        assert!((result.net_pl() - 200.0).abs() < 1e-9);
        assert_eq!(result.win_rate, 100.0);
        assert!(result.open_positions.is_empty());

        let expired = result.closing_trades().next().unwrap();
        assert_eq!(expired.trade_type, OptionTradeType::Expired);
        assert_eq!(expired.underlying_symbol, "XYZ");
        assert_eq!(expired.holding_period, HoldingPeriod::ShortTerm);
    }

    #[test]
    fn test_buy_to_close_loss_on_short_put() {
        let txs = vec![
            opt(0, PUT, TransactionType::OptionSellOpen, 2.0, 1.0),
            opt(10, PUT, TransactionType::OptionBuyClose, 2.0, 1.5),
        ];
        let result = run(&txs);

        let close = result.closing_trades().next().unwrap();
        assert_eq!(close.strategy, OptionStrategy::CashSecuredPuts);
        assert!((close.realized_pl - (-100.0)).abs() < 1e-9);

        let stats = &result.strategy_summary[&OptionStrategy::CashSecuredPuts];
        assert!((stats.premium_lost - 100.0).abs() < 1e-9);
        assert!((stats.premium_collected - 200.0).abs() < 1e-9);
        assert!((stats.premium_paid - 0.0).abs() < 1e-9);
        assert_eq!(result.win_rate, 0.0);
    }

    #[test]
    fn test_sell_to_close_long_call_gain() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionBuyOpen, 1.0, 3.0),
            opt(5, CALL, TransactionType::OptionSellClose, 1.0, 4.25),
        ];
        let result = run(&txs);

        let close = result.closing_trades().next().unwrap();
        assert_eq!(close.strategy, OptionStrategy::LongCalls);
        assert!((close.realized_pl - 125.0).abs() < 1e-9);
        assert!((result.strategy_summary[&OptionStrategy::LongCalls].gains - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_fifo_queue_prorates_across_positions() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionSellOpen, 1.0, 2.0),
            opt(1, CALL, TransactionType::OptionSellOpen, 2.0, 3.0),
            opt(2, CALL, TransactionType::OptionBuyClose, 2.0, 1.0),
        ];
        let result = run(&txs);
        let closes: Vec<_> = result.closing_trades().collect();

        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].open_date, Some(day(0)));
        assert!((closes[0].realized_pl - 100.0).abs() < 1e-9);
        assert_eq!(closes[1].open_date, Some(day(1)));
        assert!((closes[1].realized_pl - 200.0).abs() < 1e-9);

        let left = &result.open_positions[CALL];
        assert_eq!(left.len(), 1);
        assert!((left[0].quantity - 1.0).abs() < 1e-9);
        assert!((left[0].premium_per_contract - 300.0).abs() < 1e-9);
    }

    #[test]
    fn test_long_expiry_loses_premium() {
        let txs = vec![
            opt(0, PUT, TransactionType::OptionBuyOpen, 3.0, 0.5),
            opt(40, PUT, TransactionType::OptionExpired, 3.0, 0.0),
        ];
        let result = run(&txs);
        let stats = &result.strategy_summary[&OptionStrategy::LongPuts];
        assert!((stats.losses - 150.0).abs() < 1e-9);
        assert!((result.total_realized_losses() - (-150.0)).abs() < 1e-9);
    }

    #[test]
    fn test_assignment_realizes_premium() {
        let txs = vec![
            opt(0, PUT, TransactionType::OptionSellOpen, 1.0, 1.2).with_costs(0.65, 0.0),
            opt(20, PUT, TransactionType::OptionAssigned, 1.0, 0.0),
        ];
        let result = run(&txs);
        let assigned = result.closing_trades().next().unwrap();
        assert_eq!(assigned.trade_type, OptionTradeType::Assigned);
        assert!((assigned.realized_pl - 119.35).abs() < 1e-9);
    }

    #[test]
    fn test_orphan_close_and_settlement() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionBuyClose, 1.0, 0.4),
            opt(1, PUT, TransactionType::OptionExpired, 1.0, 0.0),
        ];
        let result = run(&txs);
        let closes: Vec<_> = result.closing_trades().collect();

        assert_eq!(closes.len(), 1);
        assert!((closes[0].realized_pl - (-40.0)).abs() < 1e-9);
        assert_eq!(closes[0].strategy, OptionStrategy::CoveredCalls);
        assert!(closes[0].note.is_some());
    }

    #[test]
    fn test_close_skips_positions_on_other_side() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionBuyOpen, 1.0, 1.0),
            opt(1, CALL, TransactionType::OptionSellOpen, 1.0, 2.0),
            opt(2, CALL, TransactionType::OptionBuyClose, 1.0, 0.5),
        ];
        let result = run(&txs);
        let close = result.closing_trades().next().unwrap();
        assert_eq!(close.open_date, Some(day(1)));
        assert!((close.realized_pl - 150.0).abs() < 1e-9);
        assert_eq!(result.open_positions[CALL][0].side, OptionSide::Long);
    }

    #[test]
    fn test_strict_policy_marks_naked_calls() {
        let date = day(0);
        let mut stock = OpenPositions::new();
        stock.insert("XYZ".to_string(), vec![TaxLot::new(100.0, 40.0, date)]);

        let txs = vec![
            opt(0, CALL, TransactionType::OptionSellOpen, 1.0, 2.0),
            opt(0, "ABC240315C10", TransactionType::OptionSellOpen, 1.0, 1.0),
        ];
        let result = OptionsMatcher::new(ShortCallPolicy::Strict, 100.0).match_transactions(
            &txs,
            &stock,
            &HashSet::new(),
        );

        assert_eq!(result.trades[0].strategy, OptionStrategy::CoveredCalls);
        assert_eq!(result.trades[1].strategy, OptionStrategy::NakedCalls);
    }

    #[test]
    fn test_close_costs_exceeding_premium() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionBuyOpen, 1.0, 1.0),
            opt(3, CALL, TransactionType::OptionSellClose, 1.0, 0.0).with_costs(0.65, 0.0),
        ];
        let result = run(&txs);
        let close = result.closing_trades().next().unwrap();

        assert!((close.premium - (-0.65)).abs() < 1e-9);
        assert!((close.realized_pl - (-100.65)).abs() < 1e-9);
        assert!((result.strategy_summary[&OptionStrategy::LongCalls].losses - 100.65).abs() < 1e-9);
    }

    #[test]
    fn test_open_costs_exceeding_premium() {
        let txs = vec![
            opt(0, PUT, TransactionType::OptionSellOpen, 1.0, 0.0).with_costs(0.65, 0.0),
            opt(9, PUT, TransactionType::OptionExpired, 1.0, 0.0),
        ];
        let result = run(&txs);
        assert!((result.trades[0].premium - (-0.65)).abs() < 1e-9);
        assert!((result.net_pl() - (-0.65)).abs() < 1e-9);
    }

    #[test]
    fn test_zero_quantity_close_takes_front_position() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionSellOpen, 1.0, 2.0),
            opt(4, CALL, TransactionType::OptionBuyClose, 0.0, 0.0).with_amount(-50.0),
        ];
        let result = run(&txs);
        let close = result.closing_trades().next().unwrap();

        assert!((close.realized_pl - 150.0).abs() < 1e-9);
        assert!((close.quantity - 1.0).abs() < 1e-9);
        assert_eq!(close.open_date, Some(day(0)));
        assert!(close.note.is_none());
        assert!(result.open_positions.is_empty());
    }

    #[test]
    fn test_zero_quantity_close_without_position() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionBuyOpen, 1.0, 1.0),
            opt(1, CALL, TransactionType::OptionBuyClose, 0.0, 0.0).with_amount(-30.0),
        ];
        let result = run(&txs);
        let close = result.closing_trades().next().unwrap();

        assert!((close.realized_pl - (-30.0)).abs() < 1e-9);
        assert!(close.note.is_some());
        assert_eq!(result.open_positions[CALL][0].side, OptionSide::Long);
    }

    #[test]
    fn test_assignment_of_long_position_loses_premium() {
        let txs = vec![
            opt(0, CALL, TransactionType::OptionBuyOpen, 2.0, 1.5),
            opt(15, CALL, TransactionType::OptionAssigned, 2.0, 0.0),
        ];
        let result = run(&txs);
        let assigned = result.closing_trades().next().unwrap();

        assert_eq!(assigned.trade_type, OptionTradeType::Assigned);
        assert_eq!(assigned.strategy, OptionStrategy::LongCalls);
        assert!((assigned.realized_pl - (-300.0)).abs() < 1e-9);
        assert!((result.strategy_summary[&OptionStrategy::LongCalls].losses - 300.0).abs() < 1e-9);
        assert_eq!(result.win_rate, 0.0);
    }

    #[test]
    fn test_zero_quantity_settlement_consumes_front_entry() {
        let txs = vec![
            opt(0, PUT, TransactionType::OptionSellOpen, 2.0, 1.0),
            opt(1, PUT, TransactionType::OptionSellOpen, 1.0, 3.0),
            opt(30, PUT, TransactionType::OptionExpired, 0.0, 0.0),
            opt(31, PUT, TransactionType::OptionAssigned, 0.0, 0.0),
        ];
        let result = run(&txs);
        let closes: Vec<_> = result.closing_trades().collect();

        assert_eq!(closes.len(), 2);
        assert_eq!(closes[0].trade_type, OptionTradeType::Expired);
        assert!((closes[0].quantity - 2.0).abs() < 1e-9);
        assert!((closes[0].realized_pl - 200.0).abs() < 1e-9);
        assert_eq!(closes[1].trade_type, OptionTradeType::Assigned);
        assert_eq!(closes[1].open_date, Some(day(1)));
        assert!((closes[1].realized_pl - 300.0).abs() < 1e-9);
        assert!(result.open_positions.is_empty());
    }

    #[test]
    fn test_win_rate_empty() {
        let result = run(&[opt(0, CALL, TransactionType::OptionSellOpen, 1.0, 2.0)]);
        assert_eq!(result.win_rate, 0.0);
        assert_eq!(result.net_pl(), 0.0);
    }
}
