//! CSV normalizer
//!
//! Expected header (case-insensitive):
//! `Date, Action, Symbol, Quantity, Price, Fees & Comm, Amount`.
//! Separate `Commission` and `Fees` columns are also accepted.

use crate::fields::{classify_action, parse_date, parse_money};
use anyhow::{Context, Result};
use gains_core::Transaction;
use options_engine::{normalize_symbol, OptionContract};
use std::collections::{BTreeMap, HashMap};

/// Header lookup by lower-cased column name
struct Columns {
    index: HashMap<String, usize>,
    names: Vec<String>,
}

impl Columns {
    fn new(headers: &csv::StringRecord) -> Self {
        let names: Vec<String> = headers.iter().map(|h| h.trim().to_string()).collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.to_lowercase(), i))
            .collect();
        Self { index, names }
    }

    /// First non-empty value among the candidate column names
    fn get<'r>(&self, record: &'r csv::StringRecord, candidates: &[&str]) -> &'r str {
        candidates
            .iter()
            .filter_map(|name| self.index.get(*name))
            .filter_map(|&i| record.get(i))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .unwrap_or("")
    }

    fn raw(&self, record: &csv::StringRecord) -> BTreeMap<String, String> {
        self.names
            .iter()
            .zip(record.iter())
            .filter(|(name, _)| !name.is_empty())
            .map(|(name, value)| (name.clone(), value.trim().to_string()))
            .collect()
    }
}

/// Parse a broker export into normalized transactions in file order.
pub fn parse_csv(csv_data: &str) -> Result<Vec<Transaction>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(csv_data.as_bytes());

    let columns = Columns::new(reader.headers().context("reading CSV header")?);

    let mut transactions = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        // Header is line 1
        let row = i + 2;
        let record = result.with_context(|| format!("reading CSV row {}", row))?;

        let date = columns.get(&record, &["date"]);
        let action = columns.get(&record, &["action"]);
        if date.is_empty() || action.is_empty() {
            skipped += 1;
            continue;
        }

        let tx = parse_row(&columns, &record)
            .with_context(|| format!("row {}: {} {}", row, date, action))?;
        transactions.push(tx);
    }

    tracing::info!(
        "Parsed {} transactions from CSV ({} rows skipped)",
        transactions.len(),
        skipped
    );

    Ok(transactions)
}

fn parse_row(columns: &Columns, record: &csv::StringRecord) -> Result<Transaction> {
    let date = parse_date(columns.get(record, &["date"]))?;
    let transaction_type = classify_action(columns.get(record, &["action"]));
    let symbol = normalize_symbol(columns.get(record, &["symbol"]));

    let quantity = parse_money(columns.get(record, &["quantity", "qty"]))?.abs();
    let price = parse_money(columns.get(record, &["price"]))?.abs();
    let commission =
        parse_money(columns.get(record, &["fees & comm", "commission", "fees & commissions"]))?
            .abs();
    let fees = parse_money(columns.get(record, &["fees"]))?.abs();
    let amount = parse_money(columns.get(record, &["amount"]))?;

    let is_option = transaction_type.is_option_event() || OptionContract::parse(&symbol).parsed;

    let tx = Transaction {
        date,
        symbol,
        transaction_type,
        quantity,
        price,
        commission,
        fees,
        amount,
        is_option,
        raw: columns.raw(record),
    };
    tx.validate()?;
    Ok(tx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gains_core::TransactionType;

    const EXPORT: &str = "\
Date,Action,Symbol,Description,Quantity,Price,Fees & Comm,Amount
01/03/2023,Buy,XYZ,XYZ CORP,10,$10.00,,($100.00)
02/07/2024 as of 02/06/2024,Sell,XYZ,XYZ CORP,10,$15.00,$0.65,$149.35
03/01/2024,Sell to Open,XYZ-240419C20,CALL XYZ,1,$2.00,$0.66,$199.34
04/19/2024,Expired,XYZ-240419C20,CALL XYZ,1,,,
03/15/2024,Qualified Dividend,XYZ,XYZ CORP,,,,$12.40
Transactions Total,,,,,,,$260.09
";

    #[test]
    fn test_parse_broker_export() {
        let txs = parse_csv(EXPORT).unwrap();
        assert_eq!(txs.len(), 5);

        assert_eq!(txs[0].transaction_type, TransactionType::Buy);
        assert_eq!(txs[0].amount, -100.0);
        assert!(!txs[0].is_option);

        assert_eq!(txs[1].transaction_type, TransactionType::Sell);
        assert!((txs[1].commission - 0.65).abs() < 1e-9);
        assert_eq!(txs[1].date, parse_date("02/07/2024").unwrap());

        assert_eq!(txs[2].symbol, "XYZ240419C20");
        assert_eq!(txs[2].transaction_type, TransactionType::OptionSellOpen);
        assert!(txs[2].is_option);

        assert_eq!(txs[3].transaction_type, TransactionType::OptionExpired);
        assert_eq!(txs[3].price, 0.0);

        assert_eq!(txs[4].transaction_type, TransactionType::Dividend);
        assert!((txs[4].amount - 12.4).abs() < 1e-9);
        assert_eq!(txs[4].raw.get("Description").map(String::as_str), Some("XYZ CORP"));
    }

    #[test]
    fn test_separate_commission_and_fee_columns() {
        let csv = "date,action,symbol,quantity,price,commission,fees,amount\n\
                   2024-01-02,Buy,abc,5,20,1.00,0.02,-101.02\n";
        let txs = parse_csv(csv).unwrap();
        assert_eq!(txs[0].symbol, "ABC");
        assert_eq!(txs[0].commission, 1.0);
        assert!((txs[0].fees - 0.02).abs() < 1e-9);
        assert!((txs[0].total_costs() - 1.02).abs() < 1e-9);
    }

    #[test]
    fn test_option_detected_from_symbol() {
        let csv = "Date,Action,Symbol,Quantity,Price,Amount\n\
                   01/02/2024,Journal,XYZ 240119P15,1,,\n";
        let txs = parse_csv(csv).unwrap();
        assert_eq!(txs[0].transaction_type, TransactionType::Other);
        assert!(txs[0].is_option);
    }

    #[test]
    fn test_bad_row_reports_row_number() {
        let csv = "Date,Action,Symbol,Quantity,Price,Amount\n\
                   01/02/2024,Buy,XYZ,10,10,-100\n\
                   01/03/2024,Buy,XYZ,ten,10,-100\n";
        let err = parse_csv(csv).unwrap_err();
        assert!(format!("{:#}", err).contains("row 3"));
    }

    #[test]
    fn test_header_only() {
        let txs = parse_csv("Date,Action,Symbol,Quantity,Price,Amount\n").unwrap();
        assert!(txs.is_empty());
    }
}
