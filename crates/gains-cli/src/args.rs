use anyhow::{anyhow, bail, Result};
use gains_core::LotStrategy;

pub const USAGE: &str = "\
Usage: gains-report <transactions.csv> [options]

Options:
  --strategy fifo|lifo|hifo   Lot selection for stock sells
  --portfolio-value N         Current value, added as the final XIRR flow
  --strict-calls              Classify short calls as covered only with share evidence
  --json                      Print the full report as JSON";

#[derive(Debug, Clone, PartialEq)]
pub struct CliArgs {
    pub path: String,
    pub strategy: Option<LotStrategy>,
    pub portfolio_value: Option<f64>,
    pub strict_calls: bool,
    pub json: bool,
}

impl CliArgs {
    pub fn parse(args: &[String]) -> Result<Self> {
        let mut path = None;
        let mut strategy = None;
        let mut portfolio_value = None;
        let mut strict_calls = false;
        let mut json = false;

        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--strategy" => {
                    let value = iter.next().ok_or_else(|| anyhow!("--strategy needs a value"))?;
                    strategy = Some(value.parse::<LotStrategy>()?);
                }
                "--portfolio-value" => {
                    let value = iter
                        .next()
                        .ok_or_else(|| anyhow!("--portfolio-value needs a value"))?;
                    let parsed: f64 = value
                        .parse()
                        .map_err(|_| anyhow!("invalid portfolio value '{}'", value))?;
                    portfolio_value = Some(parsed);
                }
                "--strict-calls" => strict_calls = true,
                "--json" => json = true,
                flag if flag.starts_with("--") => bail!("unknown option {}", flag),
                file => {
                    if path.is_some() {
                        bail!("unexpected argument {}", file);
                    }
                    path = Some(file.to_string());
                }
            }
        }

        Ok(Self {
            path: path.ok_or_else(|| anyhow!("missing CSV path"))?,
            strategy,
            portfolio_value,
            strict_calls,
            json,
        })
    }
}
