//! Performance statistics over a NAV series.
//!
//! Converts a finalized NAV series into return, volatility, drawdown and
//! ratio metrics, for the whole horizon and broken out by calendar year.

use chrono::{Datelike, NaiveDate};

use super::error::NavsimError;
use super::panel::PricePanel;
use super::simulation::PortfolioState;

/// A single NAV (or closing price) series, dates ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct NavSeries {
    pub dates: Vec<NaiveDate>,
    pub values: Vec<f64>,
}

impl NavSeries {
    pub fn new(dates: Vec<NaiveDate>, values: Vec<f64>) -> Self {
        debug_assert_eq!(dates.len(), values.len());
        NavSeries { dates, values }
    }

    pub fn from_states(states: &[PortfolioState]) -> Self {
        NavSeries {
            dates: states.iter().map(|s| s.date).collect(),
            values: states.iter().map(|s| s.nav).collect(),
        }
    }

    /// One price column of a panel, NaN cells dropped. A panel holding many
    /// assets may leave gaps in columns it does not actively weight.
    pub fn from_panel_column(panel: &PricePanel, asset: &str) -> Result<Self, NavsimError> {
        let col = panel.column_index(asset)?;
        let mut dates = Vec::new();
        let mut values = Vec::new();
        for (&date, row) in panel.dates.iter().zip(&panel.rows) {
            if row[col].is_finite() {
                dates.push(date);
                values.push(row[col]);
            }
        }
        Ok(NavSeries { dates, values })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    fn value_at(&self, date: NaiveDate) -> Option<f64> {
        self.dates
            .binary_search(&date)
            .ok()
            .map(|idx| self.values[idx])
    }
}

/// Whether a reported slice spans the full horizon (annualize) or one
/// calendar year (report the raw holding-period return unannualized).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    FullPeriod,
    CalendarYear,
}

/// Maximum drawdown with its key dates. `start` is the peak the drawdown
/// fell from, `formation` the trough where it was deepest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Drawdown {
    pub mdd: f64,
    pub start: NaiveDate,
    pub formation: NaiveDate,
}

/// Statistics for one reporting slice.
#[derive(Debug, Clone, PartialEq)]
pub struct PerfStats {
    pub holding_period_return: f64,
    pub annualized_return: f64,
    pub annualized_volatility: f64,
    pub drawdown: Drawdown,
    pub sharpe: f64,
    pub calmar: f64,
}

/// Compute the statistics of one NAV slice.
///
/// For `CalendarYear` slices the reported "annualized return" is the raw
/// holding-period return for that year, while the full-period figure is
/// properly annualized. The asymmetry is an intentional, documented
/// contract inherited from the reporting convention, not a bug.
pub fn compute(
    series: &NavSeries,
    period: ReportPeriod,
    annualization_factor: u32,
    risk_free_rate: f64,
) -> Result<PerfStats, NavsimError> {
    let n = series.len();
    if n < 2 {
        return Err(NavsimError::InsufficientObservations { points: n });
    }

    let returns: Vec<f64> = series
        .values
        .windows(2)
        .map(|w| w[1] / w[0] - 1.0)
        .collect();

    let holding_period_return = series.values[n - 1] / series.values[0] - 1.0;
    let annualized_return = match period {
        ReportPeriod::FullPeriod => {
            let exponent = annualization_factor as f64 / (n - 1) as f64;
            (1.0 + holding_period_return).powf(exponent) - 1.0
        }
        ReportPeriod::CalendarYear => holding_period_return,
    };

    let annualized_volatility =
        sample_stddev(&returns) * (annualization_factor as f64).sqrt();

    let drawdown = max_drawdown(series);
    let sharpe = (annualized_return - risk_free_rate) / annualized_volatility;
    let calmar = if drawdown.mdd > 0.0 {
        (annualized_return - risk_free_rate) / drawdown.mdd
    } else {
        f64::NAN
    };

    Ok(PerfStats {
        holding_period_return,
        annualized_return,
        annualized_volatility,
        drawdown,
        sharpe,
        calmar,
    })
}

/// Bessel-corrected standard deviation; NaN with fewer than two samples.
fn sample_stddev(values: &[f64]) -> f64 {
    let m = values.len();
    if m < 2 {
        return f64::NAN;
    }
    let mean = values.iter().sum::<f64>() / m as f64;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (m - 1) as f64;
    variance.sqrt()
}

/// Maximum drawdown of a non-empty series.
///
/// The drawdown series is NAV over its running maximum, minus one;
/// formation is the (first) date of the minimum and start the (first)
/// running-maximum date at or before it.
pub fn max_drawdown(series: &NavSeries) -> Drawdown {
    let mut peak = series.values[0];
    let mut peak_date = series.dates[0];
    let mut mdd = 0.0f64;
    let mut start = peak_date;
    let mut formation = peak_date;

    for (&date, &value) in series.dates.iter().zip(&series.values) {
        if value > peak {
            peak = value;
            peak_date = date;
        }
        let dd = value / peak - 1.0;
        if dd < -mdd {
            mdd = -dd;
            formation = date;
            start = peak_date;
        }
    }

    Drawdown {
        mdd,
        start,
        formation,
    }
}

/// First date strictly after `formation` at which NAV recovers to its level
/// at `start`. `None` means not yet recovered within the series.
pub fn recovery_after(
    series: &NavSeries,
    start: NaiveDate,
    formation: NaiveDate,
) -> Option<NaiveDate> {
    let target = series.value_at(start)?;
    series
        .dates
        .iter()
        .zip(&series.values)
        .find(|&(&date, &value)| date > formation && value >= target)
        .map(|(&date, _)| date)
}

/// Partition a series by calendar year.
///
/// Each year after the first is prepended with the prior year's last
/// observation as an anchor, so returns and drawdowns are measured from the
/// true prior close rather than an artificial start. A first year holding a
/// single observation is not reported; it exists solely to seed the next
/// year's anchor.
pub fn split_by_year(series: &NavSeries) -> Vec<(i32, NavSeries)> {
    let mut groups: Vec<(i32, usize, usize)> = Vec::new();
    for (idx, date) in series.dates.iter().enumerate() {
        match groups.last_mut() {
            Some((year, _, end)) if *year == date.year() => *end = idx + 1,
            _ => groups.push((date.year(), idx, idx + 1)),
        }
    }

    let mut out = Vec::with_capacity(groups.len());
    for (pos, &(year, lo, hi)) in groups.iter().enumerate() {
        if pos == 0 {
            if hi - lo == 1 {
                continue;
            }
            out.push((
                year,
                NavSeries::new(
                    series.dates[lo..hi].to_vec(),
                    series.values[lo..hi].to_vec(),
                ),
            ));
        } else {
            let mut dates = Vec::with_capacity(hi - lo + 1);
            let mut values = Vec::with_capacity(hi - lo + 1);
            dates.push(series.dates[lo - 1]);
            values.push(series.values[lo - 1]);
            dates.extend_from_slice(&series.dates[lo..hi]);
            values.extend_from_slice(&series.values[lo..hi]);
            out.push((year, NavSeries::new(dates, values)));
        }
    }
    out
}

/// Reporting-row label: the whole horizon or one calendar year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodLabel {
    FullPeriod,
    Year(i32),
}

impl std::fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PeriodLabel::FullPeriod => write!(f, "overall"),
            PeriodLabel::Year(year) => write!(f, "{year}"),
        }
    }
}

/// One labelled slice of results.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRow {
    pub label: PeriodLabel,
    pub stats: PerfStats,
    pub recovery: Option<NaiveDate>,
}

/// Full-period statistics followed by one row per reported calendar year.
///
/// Recovery dates for every row are resolved against the full series, so a
/// drawdown formed late in one year may recover in a later one.
pub fn period_stats(
    series: &NavSeries,
    annualization_factor: u32,
    risk_free_rate: f64,
) -> Result<Vec<PeriodRow>, NavsimError> {
    let mut rows = Vec::new();

    let full = compute(
        series,
        ReportPeriod::FullPeriod,
        annualization_factor,
        risk_free_rate,
    )?;
    rows.push(PeriodRow {
        recovery: recovery_after(series, full.drawdown.start, full.drawdown.formation),
        label: PeriodLabel::FullPeriod,
        stats: full,
    });

    for (year, slice) in split_by_year(series) {
        let stats = compute(
            &slice,
            ReportPeriod::CalendarYear,
            annualization_factor,
            risk_free_rate,
        )?;
        rows.push(PeriodRow {
            recovery: recovery_after(series, stats.drawdown.start, stats.drawdown.formation),
            label: PeriodLabel::Year(year),
            stats,
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn series(points: &[(NaiveDate, f64)]) -> NavSeries {
        NavSeries::new(
            points.iter().map(|&(d, _)| d).collect(),
            points.iter().map(|&(_, v)| v).collect(),
        )
    }

    fn daily(values: &[f64]) -> NavSeries {
        series(
            &values
                .iter()
                .enumerate()
                .map(|(i, &v)| (date(2024, 1, 1) + chrono::Duration::days(i as i64), v))
                .collect::<Vec<_>>(),
        )
    }

    #[test]
    fn holding_period_and_annualized_return() {
        let nav = daily(&[1.0, 1.01, 1.02, 1.05]);
        let stats = compute(&nav, ReportPeriod::FullPeriod, 250, 0.0).unwrap();
        assert_relative_eq!(stats.holding_period_return, 0.05, max_relative = 1e-12);
        // (1.05)^(250/3) - 1
        assert_relative_eq!(
            stats.annualized_return,
            1.05f64.powf(250.0 / 3.0) - 1.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn calendar_year_return_is_not_annualized() {
        let nav = daily(&[1.0, 1.01, 1.02, 1.05]);
        let stats = compute(&nav, ReportPeriod::CalendarYear, 250, 0.0).unwrap();
        assert_relative_eq!(
            stats.annualized_return,
            stats.holding_period_return,
            max_relative = 1e-12
        );
    }

    #[test]
    fn volatility_is_bessel_corrected_and_scaled() {
        let nav = daily(&[1.0, 1.1, 1.0]);
        let stats = compute(&nav, ReportPeriod::FullPeriod, 250, 0.0).unwrap();
        let r1 = 0.1f64;
        let r2 = 1.0 / 1.1 - 1.0;
        let mean = (r1 + r2) / 2.0;
        let sd = (((r1 - mean).powi(2) + (r2 - mean).powi(2)) / 1.0).sqrt();
        assert_relative_eq!(
            stats.annualized_volatility,
            sd * 250f64.sqrt(),
            max_relative = 1e-12
        );
    }

    #[test]
    fn volatility_nan_with_single_return() {
        let nav = daily(&[1.0, 1.1]);
        let stats = compute(&nav, ReportPeriod::FullPeriod, 250, 0.0).unwrap();
        assert!(stats.annualized_volatility.is_nan());
        assert!(stats.sharpe.is_nan());
    }

    #[test]
    fn too_few_observations_is_an_error() {
        let nav = daily(&[1.0]);
        let err = compute(&nav, ReportPeriod::FullPeriod, 250, 0.0).unwrap_err();
        assert!(matches!(
            err,
            NavsimError::InsufficientObservations { points: 1 }
        ));
    }

    #[test]
    fn drawdown_peak_trough_and_bound() {
        let nav = daily(&[1.0, 1.1, 0.9, 0.95, 0.8, 1.0]);
        let dd = max_drawdown(&nav);
        assert_relative_eq!(dd.mdd, (1.1 - 0.8) / 1.1, max_relative = 1e-12);
        assert_eq!(dd.start, date(2024, 1, 2));
        assert_eq!(dd.formation, date(2024, 1, 5));
        assert!(dd.mdd >= 0.0 && dd.mdd <= 1.0);
        // NAV at formation equals (1 - mdd) * NAV at start.
        assert_relative_eq!(0.8, (1.0 - dd.mdd) * 1.1, max_relative = 1e-12);
    }

    #[test]
    fn drawdown_of_monotone_series_is_zero() {
        let nav = daily(&[1.0, 1.0, 2.0]);
        let dd = max_drawdown(&nav);
        assert_eq!(dd.mdd, 0.0);
        let stats = compute(&nav, ReportPeriod::FullPeriod, 250, 0.0).unwrap();
        assert!(stats.calmar.is_nan());
    }

    #[test]
    fn drawdown_formed_at_the_end_never_recovers() {
        let nav = daily(&[1.0, 2.0, 1.0]);
        let dd = max_drawdown(&nav);
        assert_relative_eq!(dd.mdd, 0.5, max_relative = 1e-12);
        assert_eq!(dd.start, date(2024, 1, 2));
        assert_eq!(dd.formation, date(2024, 1, 3));
        assert_eq!(recovery_after(&nav, dd.start, dd.formation), None);
    }

    #[test]
    fn recovery_is_first_date_back_at_the_peak() {
        let nav = daily(&[1.0, 2.0, 1.0, 1.5, 2.0, 2.5]);
        let dd = max_drawdown(&nav);
        let recovery = recovery_after(&nav, dd.start, dd.formation).unwrap();
        assert_eq!(recovery, date(2024, 1, 5));
        // No earlier post-formation date reaches the start NAV.
        let earlier: Vec<_> = nav
            .dates
            .iter()
            .zip(&nav.values)
            .filter(|&(&d, &v)| d > dd.formation && d < recovery && v >= 2.0)
            .collect();
        assert!(earlier.is_empty());
    }

    #[test]
    fn split_by_year_prepends_prior_close() {
        let nav = series(&[
            (date(2023, 12, 29), 1.0),
            (date(2023, 12, 30), 1.1),
            (date(2024, 1, 2), 1.2),
            (date(2024, 1, 3), 1.3),
        ]);
        let groups = split_by_year(&nav);
        assert_eq!(groups.len(), 2);

        let (year, first) = &groups[0];
        assert_eq!(*year, 2023);
        assert_eq!(first.len(), 2);

        let (year, second) = &groups[1];
        assert_eq!(*year, 2024);
        // Anchored at the 2023 close, not at an artificial 1.0.
        assert_eq!(second.dates[0], date(2023, 12, 30));
        assert_eq!(second.values[0], 1.1);
    }

    #[test]
    fn single_point_first_year_only_seeds_the_anchor() {
        let nav = series(&[
            (date(2023, 12, 29), 1.0),
            (date(2024, 1, 2), 1.2),
            (date(2024, 1, 3), 1.3),
        ]);
        let groups = split_by_year(&nav);
        assert_eq!(groups.len(), 1);
        let (year, slice) = &groups[0];
        assert_eq!(*year, 2024);
        assert_eq!(slice.dates[0], date(2023, 12, 29));
        assert_eq!(slice.len(), 3);
    }

    #[test]
    fn period_stats_rows_and_labels() {
        let nav = series(&[
            (date(2023, 12, 28), 1.0),
            (date(2023, 12, 29), 1.1),
            (date(2024, 1, 2), 1.0),
            (date(2024, 1, 3), 1.2),
        ]);
        let rows = period_stats(&nav, 250, 0.0).unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].label, PeriodLabel::FullPeriod);
        assert_eq!(rows[1].label, PeriodLabel::Year(2023));
        assert_eq!(rows[2].label, PeriodLabel::Year(2024));

        // The 2024 slice starts at the 2023 close of 1.1.
        assert_relative_eq!(
            rows[2].stats.holding_period_return,
            1.2 / 1.1 - 1.0,
            max_relative = 1e-12
        );
    }

    #[test]
    fn per_year_recovery_resolves_across_years() {
        let nav = series(&[
            (date(2023, 6, 1), 1.0),
            (date(2023, 6, 2), 2.0),
            (date(2023, 6, 3), 1.0),
            (date(2024, 1, 2), 2.1),
        ]);
        let rows = period_stats(&nav, 250, 0.0).unwrap();
        let year_2023 = rows
            .iter()
            .find(|r| r.label == PeriodLabel::Year(2023))
            .unwrap();
        // The drawdown forms in 2023 but recovers in 2024.
        assert_eq!(year_2023.recovery, Some(date(2024, 1, 2)));
    }

    #[test]
    fn panel_column_drops_nan_cells() {
        let panel = PricePanel::from_rows(
            vec!["A".into(), "B".into()],
            vec![
                (date(2024, 1, 1), vec![1.0, f64::NAN]),
                (date(2024, 1, 2), vec![1.1, 2.0]),
                (date(2024, 1, 3), vec![1.2, 2.1]),
            ],
        )
        .unwrap();
        let nav = NavSeries::from_panel_column(&panel, "B").unwrap();
        assert_eq!(nav.len(), 2);
        assert_eq!(nav.dates[0], date(2024, 1, 2));

        assert!(matches!(
            NavSeries::from_panel_column(&panel, "C"),
            Err(NavsimError::UnknownAsset { .. })
        ));
    }
}
