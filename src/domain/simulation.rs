//! NAV simulation engine.
//!
//! A state machine over the aligned date sequence: one transition per date,
//! carrying shares forward on non-rebalancing dates and solving the implicit
//! fee-aware NAV equation at each rebalance. State at date t depends on
//! state at t-1, so evaluation is strictly sequential.

use chrono::NaiveDate;

use super::align::AlignedSchedule;
use super::error::NavsimError;
use super::panel::PricePanel;
use super::solver::RootSolver;

/// Realized portfolio state for one date.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub date: NaiveDate,
    pub nav: f64,
    pub fee: f64,
    /// Shares held per asset, against normalized prices.
    pub shares: Vec<f64>,
    /// Realized weight per asset: shares * price / NAV. Equals the target
    /// exactly on a rebalance date.
    pub weights: Vec<f64>,
    /// Absolute weight change attributable to trading, per asset.
    pub turnover: Vec<f64>,
}

/// Fee incurred moving holdings from `before` to `after` shares at prices
/// `prices`: sum of |share change| * fee rate * price, per asset.
pub fn rebalance_fee(before: &[f64], after: &[f64], rates: &[f64], prices: &[f64]) -> f64 {
    before
        .iter()
        .zip(after)
        .zip(rates)
        .zip(prices)
        .map(|(((sb, sa), f), p)| (sb - sa).abs() * f * p)
        .sum()
}

/// Simulate the NAV trajectory of `schedule` applied to `panel`.
///
/// `panel` must start at the schedule's first date with the schedule's dates
/// a subset of its index, as [`align`](super::align::align) guarantees.
/// `fee_rates` is one rate per asset in panel column order. Pure function:
/// no state survives outside the returned series.
pub fn simulate(
    panel: &PricePanel,
    schedule: &AlignedSchedule,
    fee_rates: &[f64],
    solver: &RootSolver,
) -> Result<Vec<PortfolioState>, NavsimError> {
    if schedule.is_empty() || panel.is_empty() {
        return Err(NavsimError::EmptySchedule);
    }
    if schedule.dates[0] != panel.dates[0] {
        return Err(NavsimError::UnalignedSchedule {
            date: schedule.dates[0],
        });
    }

    let prices = panel.normalized();
    let n_assets = panel.assets.len();
    let mut states: Vec<PortfolioState> = Vec::with_capacity(panel.len());
    let mut next_target = 0usize;

    for (idx, (&date, p)) in prices.dates.iter().zip(&prices.rows).enumerate() {
        let target = if next_target < schedule.len() && schedule.dates[next_target] == date {
            let row = &schedule.rows[next_target];
            next_target += 1;
            Some(row)
        } else {
            None
        };

        let state = if idx == 0 {
            // The aligner guarantees the first date carries a target.
            let Some(w) = target else {
                return Err(NavsimError::UnalignedSchedule { date });
            };
            let shares: Vec<f64> = w.iter().zip(p).map(|(w, p)| w / p).collect();
            let fee = rebalance_fee(&vec![0.0; n_assets], &shares, fee_rates, p);
            PortfolioState {
                date,
                nav: 1.0,
                fee,
                weights: w.clone(),
                turnover: w.iter().map(|w| w.abs()).collect(),
                shares,
            }
        } else {
            let prev = &states[idx - 1];
            let p_prev = &prices.rows[idx - 1];
            // Mark-to-market carry of yesterday's holdings.
            let nav_before = prev.nav
                + prev
                    .shares
                    .iter()
                    .zip(p.iter().zip(p_prev))
                    .map(|(s, (pt, pp))| s * (pt - pp))
                    .sum::<f64>();

            match target {
                None => {
                    if !nav_before.is_finite() {
                        return Err(NavsimError::InvalidNav {
                            date,
                            value: nav_before,
                        });
                    }
                    let shares = prev.shares.clone();
                    let weights = shares
                        .iter()
                        .zip(p)
                        .map(|(s, p)| s * p / nav_before)
                        .collect();
                    PortfolioState {
                        date,
                        nav: nav_before,
                        fee: 0.0,
                        shares,
                        weights,
                        turnover: vec![0.0; n_assets],
                    }
                }
                Some(w) => {
                    // Post-rebalance NAV x satisfies fee(x) - nav_before + x = 0,
                    // where the post shares are those implied by hitting the
                    // target weights at NAV x.
                    let residual = |x: f64| {
                        let after: Vec<f64> =
                            w.iter().zip(p).map(|(w, p)| w / p * x).collect();
                        rebalance_fee(&prev.shares, &after, fee_rates, p) - nav_before + x
                    };
                    let nav_after = solver.solve(residual, nav_before).map_err(|failure| {
                        NavsimError::SolverDiverged {
                            date,
                            residual: failure.residual,
                            iterations: failure.iterations,
                        }
                    })?;
                    if !nav_after.is_finite() || nav_after < 0.0 {
                        return Err(NavsimError::InvalidNav {
                            date,
                            value: nav_after,
                        });
                    }
                    let shares = w.iter().zip(p).map(|(w, p)| w * nav_after / p).collect();
                    // Turnover compares against the previous row's realized
                    // weight, not the pre-rebalance drifted weight. Quirk
                    // preserved for parity with the reporting convention.
                    let turnover = w
                        .iter()
                        .zip(&prev.weights)
                        .map(|(wt, wp)| (wt - wp).abs())
                        .collect();
                    PortfolioState {
                        date,
                        nav: nav_after,
                        fee: nav_before - nav_after,
                        shares,
                        weights: w.clone(),
                        turnover,
                    }
                }
            }
        };
        states.push(state);
    }

    if next_target != schedule.len() {
        return Err(NavsimError::UnalignedSchedule {
            date: schedule.dates[next_target],
        });
    }
    Ok(states)
}
