//! gains-report: realized gains/losses report for a broker CSV export.
//!
//! Usage:
//!   gains-report transactions.csv
//!   gains-report transactions.csv --strategy hifo --portfolio-value 25000
//!   gains-report transactions.csv --strict-calls --json
//!
//! Defaults come from the environment (GAINS_* variables, `.env` honored);
//! flags override them.

mod args;
mod render;

use anyhow::{Context, Result};
use args::CliArgs;
use gains_core::{EngineConfig, ShortCallPolicy};
use gains_engine::GainsEngine;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so the report on stdout stays clean
    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let cli = match CliArgs::parse(&raw) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("{}\n\n{}", e, args::USAGE);
            std::process::exit(2);
        }
    };

    let mut config = EngineConfig::from_env()?;
    if let Some(strategy) = cli.strategy {
        config.lot_strategy = strategy;
    }
    if let Some(value) = cli.portfolio_value {
        config.portfolio_value = value;
    }
    if cli.strict_calls {
        config.short_call_policy = ShortCallPolicy::Strict;
    }
    config.validate()?;

    tracing::info!(
        "Lot strategy {}, short calls {:?}, portfolio value {:.2}",
        config.lot_strategy,
        config.short_call_policy,
        config.portfolio_value
    );

    let csv_data = tokio::fs::read_to_string(&cli.path)
        .await
        .with_context(|| format!("reading {}", cli.path))?;
    let transactions = ledger_import::parse_csv(&csv_data)
        .with_context(|| format!("parsing {}", cli.path))?;

    let report = GainsEngine::new(config).run(&transactions);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::summary(&report));
    }

    Ok(())
}
