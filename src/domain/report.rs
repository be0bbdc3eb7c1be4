//! Backtest report assembly.
//!
//! Joins the statistics rows with turnover/fee totals into one record per
//! reporting period, ready for serialization by a report adapter.

use chrono::NaiveDate;

use super::error::NavsimError;
use super::simulation::PortfolioState;
use super::stats::{self, NavSeries, PeriodLabel};
use super::turnover::{self, TurnoverTotals};

/// One row of the summary table: a reporting period with its performance
/// statistics and trading totals. Produced once from a finalized NAV series
/// and never mutated afterward.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceRecord {
    pub label: PeriodLabel,
    pub holding_period_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub max_drawdown: f64,
    pub drawdown_start: NaiveDate,
    pub drawdown_formation: NaiveDate,
    /// `None` means the drawdown has not yet recovered.
    pub recovery: Option<NaiveDate>,
    pub sharpe: f64,
    pub calmar: f64,
    pub asset_turnover: Vec<f64>,
    pub portfolio_turnover: f64,
    pub total_fee: f64,
}

/// Summary of one backtest run: asset order plus the whole-period record
/// followed by one record per reported calendar year.
#[derive(Debug, Clone, PartialEq)]
pub struct BacktestReport {
    pub assets: Vec<String>,
    pub records: Vec<PerformanceRecord>,
}

/// Build the report from a finalized state series.
///
/// Turnover and fees are attached to the year they occurred in; a
/// single-observation first year is not reported as a statistics row, so
/// its trading totals surface only in the whole-period record.
pub fn build_report(
    states: &[PortfolioState],
    assets: &[String],
    annualization_factor: u32,
    risk_free_rate: f64,
) -> Result<BacktestReport, NavsimError> {
    let series = NavSeries::from_states(states);
    let rows = stats::period_stats(&series, annualization_factor, risk_free_rate)?;

    let whole = turnover::whole_period(states, assets.len());
    let yearly = turnover::by_year(states, assets.len());

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        // Reported years are slices of the same state series the by-year
        // grouping covers, so a missing year marks corrupt input.
        let totals: &TurnoverTotals = match row.label {
            PeriodLabel::FullPeriod => &whole,
            PeriodLabel::Year(year) => yearly
                .iter()
                .find(|(y, _)| *y == year)
                .map(|(_, t)| t)
                .ok_or_else(|| NavsimError::Data {
                    reason: format!("no turnover totals for year {year}"),
                })?,
        };
        records.push(PerformanceRecord {
            label: row.label,
            holding_period_return: row.stats.holding_period_return,
            annualized_return: row.stats.annualized_return,
            annualized_volatility: row.stats.annualized_volatility,
            max_drawdown: row.stats.drawdown.mdd,
            drawdown_start: row.stats.drawdown.start,
            drawdown_formation: row.stats.drawdown.formation,
            recovery: row.recovery,
            sharpe: row.stats.sharpe,
            calmar: row.stats.calmar,
            asset_turnover: totals.per_asset.clone(),
            portfolio_turnover: totals.portfolio,
            total_fee: totals.fees,
        });
    }

    Ok(BacktestReport {
        assets: assets.to_vec(),
        records,
    })
}
