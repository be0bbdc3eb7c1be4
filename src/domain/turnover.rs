//! Turnover and fee aggregation.

use chrono::Datelike;

use super::simulation::PortfolioState;

/// Summed turnover and fees for one reporting window.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnoverTotals {
    /// Per-asset turnover, panel column order.
    pub per_asset: Vec<f64>,
    /// Portfolio-level turnover: sum across assets.
    pub portfolio: f64,
    pub fees: f64,
}

fn sum_states(states: &[PortfolioState], n_assets: usize) -> TurnoverTotals {
    let mut per_asset = vec![0.0; n_assets];
    let mut fees = 0.0;
    for state in states {
        for (total, t) in per_asset.iter_mut().zip(&state.turnover) {
            *total += t;
        }
        fees += state.fee;
    }
    TurnoverTotals {
        portfolio: per_asset.iter().sum(),
        per_asset,
        fees,
    }
}

/// Whole-period totals.
pub fn whole_period(states: &[PortfolioState], n_assets: usize) -> TurnoverTotals {
    sum_states(states, n_assets)
}

/// Per-calendar-year totals, years ascending.
pub fn by_year(states: &[PortfolioState], n_assets: usize) -> Vec<(i32, TurnoverTotals)> {
    let mut out: Vec<(i32, TurnoverTotals)> = Vec::new();
    let mut lo = 0;
    while lo < states.len() {
        let year = states[lo].date.year();
        let hi = lo + states[lo..].partition_point(|s| s.date.year() == year);
        out.push((year, sum_states(&states[lo..hi], n_assets)));
        lo = hi;
    }
    out
}
