use gains_engine::GainsReport;
use options_engine::{OptionStrategy, StrategyStats};
use std::fmt::Write;

fn money(value: f64) -> String {
    if value < 0.0 {
        format!("-${:.2}", -value)
    } else {
        format!("${:.2}", value)
    }
}

/// Plain-text summary of a report
pub fn summary(report: &GainsReport) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail
    let _ = write_summary(&mut out, report);
    out
}

fn write_summary(out: &mut String, report: &GainsReport) -> std::fmt::Result {
    writeln!(out, "Realized Gains/Losses")?;
    writeln!(out, "=====================")?;
    writeln!(out, "Total gains:        {:>14}", money(report.total_realized_gains))?;
    writeln!(out, "Total losses:       {:>14}", money(report.total_realized_losses))?;
    writeln!(out, "Net P&L:            {:>14}", money(report.net_pl))?;
    writeln!(out, "  Short-term net:   {:>14}", money(report.term_breakdown.short_term_net))?;
    writeln!(out, "  Long-term net:    {:>14}", money(report.term_breakdown.long_term_net))?;
    writeln!(out, "Annualized return:  {:>13.2}%", report.annualized_return)?;
    writeln!(out)?;

    let stock = &report.stock_results;
    writeln!(out, "Stocks")?;
    writeln!(
        out,
        "  Net {} over {} sells",
        money(stock.net_pl),
        stock.trades.iter().filter(|t| t.is_sell()).count()
    )?;
    if stock.wash_sales.flagged_count > 0 {
        writeln!(
            out,
            "  {} possible wash sales ({} of losses) in {}",
            stock.wash_sales.flagged_count,
            money(stock.wash_sales.total_flagged_loss),
            stock.wash_sales.affected_symbols.join(", ")
        )?;
    }
    writeln!(out)?;

    let options = &report.option_results;
    writeln!(out, "Options")?;
    let none = StrategyStats::default();
    for strategy in OptionStrategy::ALL {
        let stats = options.strategy_summary.get(&strategy).unwrap_or(&none);
        writeln!(
            out,
            "  {:<18} opened {:>3}  closed {:>3}  win rate {:>5.1}%  net {:>12}",
            strategy.label(),
            stats.opened,
            stats.closed,
            stats.win_rate(),
            money(stats.net_pl)
        )?;
    }
    writeln!(out, "  Overall win rate: {:.1}%", options.win_rate)?;

    if !report.tax_years.is_empty() {
        writeln!(out)?;
        writeln!(out, "Tax years")?;
        for year in &report.tax_years {
            writeln!(
                out,
                "  {}  short-term {:>12}  long-term {:>12}  total {:>12}",
                year.tax_year,
                money(year.net_short_term),
                money(year.net_long_term),
                money(year.total_net)
            )?;
        }
    }

    Ok(())
}
