//! Field-level parsing of broker export text

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use gains_core::{GainsError, GainsResult, TransactionType};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::str::FromStr;

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d"];

/// Map broker action text to a transaction type.
///
/// Option actions are checked before plain buy/sell since "Buy to Open"
/// also starts with "buy".
pub fn classify_action(action: &str) -> TransactionType {
    let action = action.trim().to_lowercase();

    if action.contains("to open") {
        if action.starts_with("sell") {
            return TransactionType::OptionSellOpen;
        }
        if action.starts_with("buy") {
            return TransactionType::OptionBuyOpen;
        }
    }
    if action.contains("to close") {
        if action.starts_with("sell") {
            return TransactionType::OptionSellClose;
        }
        if action.starts_with("buy") {
            return TransactionType::OptionBuyClose;
        }
    }
    if action.starts_with("expired") {
        return TransactionType::OptionExpired;
    }
    if action.starts_with("assigned") || action.starts_with("exercised") {
        return TransactionType::OptionAssigned;
    }
    if action.contains("div") && !action.contains("reinvest shares") {
        return TransactionType::Dividend;
    }

    match action.as_str() {
        "buy" | "reinvest shares" => TransactionType::Buy,
        "sell" => TransactionType::Sell,
        _ => TransactionType::Other,
    }
}

/// Parse a money or quantity column.
///
/// Accepts `$`, thousands separators, a leading sign and accounting-style
/// parentheses. Empty text is zero.
pub fn parse_money(text: &str) -> GainsResult<f64> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(0.0);
    }

    let (negative, body) = match trimmed.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => (true, inner),
        None => (false, trimmed),
    };
    let cleaned: String = body
        .chars()
        .filter(|c| *c != '$' && *c != ',' && !c.is_whitespace())
        .collect();

    let value = Decimal::from_str(&cleaned)
        .map_err(|e| GainsError::Parse(format!("invalid amount '{}': {}", text, e)))?;
    let value = if negative { -value.abs() } else { value };

    value
        .to_f64()
        .ok_or_else(|| GainsError::Parse(format!("amount '{}' out of range", text)))
}

/// Parse a transaction date as midnight UTC.
///
/// `MM/DD/YYYY as of MM/DD/YYYY` keeps the first date.
pub fn parse_date(text: &str) -> GainsResult<DateTime<Utc>> {
    let first = text.split(" as of ").next().unwrap_or("").trim();

    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(first, fmt).ok())
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .ok_or_else(|| GainsError::Parse(format!("unrecognized date '{}'", text)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_classify_stock_actions() {
        assert_eq!(classify_action("Buy"), TransactionType::Buy);
        assert_eq!(classify_action(" SELL "), TransactionType::Sell);
        assert_eq!(classify_action("Reinvest Shares"), TransactionType::Buy);
        assert_eq!(classify_action("Qualified Dividend"), TransactionType::Dividend);
        assert_eq!(classify_action("Cash Dividend"), TransactionType::Dividend);
        assert_eq!(classify_action("Reinvest Dividend"), TransactionType::Dividend);
        assert_eq!(classify_action("MoneyLink Transfer"), TransactionType::Other);
        assert_eq!(classify_action(""), TransactionType::Other);
    }

    #[test]
    fn test_classify_option_actions() {
        assert_eq!(classify_action("Sell to Open"), TransactionType::OptionSellOpen);
        assert_eq!(classify_action("Buy to Open"), TransactionType::OptionBuyOpen);
        assert_eq!(classify_action("Buy to Close"), TransactionType::OptionBuyClose);
        assert_eq!(classify_action("sell to close"), TransactionType::OptionSellClose);
        assert_eq!(classify_action("Expired"), TransactionType::OptionExpired);
        assert_eq!(classify_action("Assigned"), TransactionType::OptionAssigned);
    }

    #[test]
    fn test_parse_money_formats() {
        assert!((parse_money("$1,234.56").unwrap() - 1234.56).abs() < 1e-9);
        assert_eq!(parse_money("-$99.50").unwrap(), -99.5);
        assert_eq!(parse_money("($1,000.00)").unwrap(), -1000.0);
        assert_eq!(parse_money("  ").unwrap(), 0.0);
        assert!((parse_money("0.65").unwrap() - 0.65).abs() < 1e-9);
    }

    #[test]
    fn test_parse_money_rejects_garbage() {
        assert!(matches!(parse_money("abc"), Err(GainsError::Parse(_))));
    }

    #[test]
    fn test_parse_date_formats() {
        let us = parse_date("03/15/2024").unwrap();
        assert_eq!((us.year(), us.month(), us.day()), (2024, 3, 15));

        let iso = parse_date("2024-03-15").unwrap();
        assert_eq!(us, iso);

        let as_of = parse_date("03/18/2024 as of 03/15/2024").unwrap();
        assert_eq!(as_of.day(), 18);

        assert!(parse_date("15.03.2024").is_err());
    }
}
