//! XIRR: internal rate of return for irregularly timed cash flows.
//! Stateless functions, Newton's method with a fixed iteration cap.

use crate::cash_flows::CashFlow;
use serde::{Deserialize, Serialize};

const INITIAL_GUESS: f64 = 0.1;
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-4;
const MIN_DERIVATIVE: f64 = 1e-10;
const DAYS_PER_YEAR: f64 = 365.0;

/// Outcome of the root search. `rate` is a fraction (0.1 = 10%).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XirrSolution {
    pub rate: f64,
    pub iterations: usize,
    pub converged: bool,
}

impl XirrSolution {
    pub fn percent(&self) -> f64 {
        self.rate * 100.0
    }
}

/// Years from the first flow's date to each flow's date.
fn year_offsets(flows: &[CashFlow]) -> Vec<f64> {
    let Some(first) = flows.first() else {
        return Vec::new();
    };
    let start = first.date.date_naive();
    flows
        .iter()
        .map(|f| (f.date.date_naive() - start).num_days() as f64 / DAYS_PER_YEAR)
        .collect()
}

/// Net present value at `rate`.
pub fn npv(flows: &[CashFlow], rate: f64) -> f64 {
    flows
        .iter()
        .zip(year_offsets(flows))
        .map(|(f, years)| f.amount / (1.0 + rate).powf(years))
        .sum()
}

fn npv_with_derivative(flows: &[CashFlow], years: &[f64], rate: f64) -> (f64, f64) {
    let mut value = 0.0;
    let mut derivative = 0.0;
    for (f, &t) in flows.iter().zip(years) {
        value += f.amount / (1.0 + rate).powf(t);
        derivative += -t * f.amount / (1.0 + rate).powf(t + 1.0);
    }
    (value, derivative)
}

/// Newton iteration from a 10% guess.
///
/// Stops when a step is smaller than 1e-4, after 100 iterations, or early
/// when the derivative is flat; the current estimate is returned in every
/// case. Fewer than two flows yields a zero rate.
pub fn solve_detailed(flows: &[CashFlow]) -> XirrSolution {
    if flows.len() < 2 {
        return XirrSolution {
            rate: 0.0,
            iterations: 0,
            converged: false,
        };
    }

    let years = year_offsets(flows);
    let mut rate = INITIAL_GUESS;

    for iteration in 0..MAX_ITERATIONS {
        let (value, derivative) = npv_with_derivative(flows, &years, rate);

        if derivative.abs() < MIN_DERIVATIVE || !derivative.is_finite() || !value.is_finite() {
            tracing::debug!("XIRR stopped on flat derivative at iteration {}", iteration);
            return XirrSolution {
                rate,
                iterations: iteration,
                converged: false,
            };
        }

        let next = rate - value / derivative;
        if !next.is_finite() {
            return XirrSolution {
                rate,
                iterations: iteration,
                converged: false,
            };
        }

        let step = (next - rate).abs();
        rate = next;

        if step < TOLERANCE {
            return XirrSolution {
                rate,
                iterations: iteration + 1,
                converged: true,
            };
        }
    }

    tracing::debug!("XIRR did not converge after {} iterations", MAX_ITERATIONS);
    XirrSolution {
        rate,
        iterations: MAX_ITERATIONS,
        converged: false,
    }
}

/// Annualized rate of return as a percentage.
pub fn solve(flows: &[CashFlow]) -> f64 {
    solve_detailed(flows).percent()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn day(offset: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap() + Duration::days(offset)
    }

    fn flow(offset: i64, amount: f64) -> CashFlow {
        CashFlow {
            date: day(offset),
            amount,
        }
    }

    #[test]
    fn test_one_year_ten_percent() {
        let flows = vec![flow(0, -1000.0), flow(365, 1100.0)];
        let solution = solve_detailed(&flows);
        assert!(solution.converged);
        assert!((solve(&flows) - 10.0).abs() < 1e-6);
    }

    #[test]
    fn test_multi_flow_root() {
        let flows = vec![
            flow(0, -10000.0),
            flow(90, -2500.0),
            flow(200, 1000.0),
            flow(500, 13500.0),
        ];
        let solution = solve_detailed(&flows);
        assert!(solution.converged);
        assert!(npv(&flows, solution.rate).abs() < 1.0);
        assert!(solution.rate > 0.0);
    }

    #[test]
    fn test_loss_gives_negative_rate() {
        let flows = vec![flow(0, -1000.0), flow(730, 810.0)];
        let rate = solve(&flows);
        assert!((rate - (-10.0)).abs() < 1e-3);
    }

    #[test]
    fn test_fewer_than_two_flows() {
        assert_eq!(solve(&[]), 0.0);
        assert_eq!(solve(&[flow(0, -500.0)]), 0.0);
    }

    #[test]
    fn test_same_day_flows_stop_early() {
        let flows = vec![flow(0, -1000.0), flow(0, 1000.0)];
        let solution = solve_detailed(&flows);
        assert!(!solution.converged);
        assert_eq!(solution.iterations, 0);
        assert!((solution.rate - INITIAL_GUESS).abs() < 1e-12);
    }

    #[test]
    fn test_npv_at_zero_rate_is_sum() {
        let flows = vec![flow(0, -100.0), flow(100, 40.0), flow(200, 70.0)];
        assert!((npv(&flows, 0.0) - 10.0).abs() < 1e-12);
    }
}
