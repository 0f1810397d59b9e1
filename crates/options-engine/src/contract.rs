//! Option symbol parsing
//!
//! Broker exports encode contracts as ticker + YYMMDD + C/P + strike
//! (e.g. `AAPL240119C150` or OCC-style `AAPL240119C00150000`).

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static CONTRACT_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn contract_pattern() -> Option<&'static Regex> {
    CONTRACT_PATTERN
        .get_or_init(|| Regex::new(r"(\d{6})([CP])(\d+(?:\.\d+)?)").ok())
        .as_ref()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OptionType {
    Call,
    Put,
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OptionType::Call => write!(f, "CALL"),
            OptionType::Put => write!(f, "PUT"),
        }
    }
}

/// Upper-case and strip dashes and whitespace
pub fn normalize_symbol(symbol: &str) -> String {
    symbol
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}

/// Leading alphabetic run of the normalized symbol
pub fn underlying_symbol(symbol: &str) -> String {
    normalize_symbol(symbol)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect()
}

/// Decoded option contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptionContract {
    pub symbol: String,
    pub underlying: String,
    pub expiry: Option<NaiveDate>,
    pub option_type: OptionType,
    pub strike: Option<f64>,
    /// False when the type came from the character heuristic
    pub parsed: bool,
}

impl OptionContract {
    /// Decode a symbol. Never fails: unrecognized layouts fall back to
    /// guessing the type from the last letter after the ticker.
    pub fn parse(symbol: &str) -> Self {
        let normalized = normalize_symbol(symbol);
        let underlying = underlying_symbol(&normalized);
        let rest = &normalized[underlying.len()..];

        if let Some(caps) = contract_pattern().and_then(|re| re.captures(rest)) {
            let expiry = NaiveDate::parse_from_str(&caps[1], "%y%m%d").ok();
            let option_type = if &caps[2] == "P" {
                OptionType::Put
            } else {
                OptionType::Call
            };
            let strike = parse_strike(&caps[3]);

            return Self {
                symbol: normalized,
                underlying,
                expiry,
                option_type,
                strike,
                parsed: true,
            };
        }

        tracing::debug!("Unrecognized option symbol '{}', guessing type", normalized);
        let option_type = match rest.chars().filter(|c| c.is_ascii_alphabetic()).last() {
            Some('P') => OptionType::Put,
            _ => OptionType::Call,
        };

        Self {
            symbol: normalized,
            underlying,
            expiry: None,
            option_type,
            strike: None,
            parsed: false,
        }
    }
}

/// OCC strikes are 8 digits with three implied decimals
fn parse_strike(raw: &str) -> Option<f64> {
    let value: f64 = raw.parse().ok()?;
    if raw.len() == 8 && !raw.contains('.') {
        Some(value / 1000.0)
    } else {
        Some(value)
    }
}
