//! Calendar/weight alignment.
//!
//! Maps a sparse weight schedule onto the trading-date index of a price
//! panel, resolving off-calendar dates to the preceding trading date. This
//! handles the common case of a monthly schedule indexed by calendar
//! month-end rather than the last trading date of the month.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::error::NavsimError;
use super::panel::{PricePanel, WeightSchedule};

/// A weight schedule whose every date exists in the price index, strictly
/// ordered with no duplicates. Produced by [`align`]; column order matches
/// the panel it was aligned against.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSchedule {
    pub assets: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
}

impl AlignedSchedule {
    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }
}

/// Align `schedule` onto `panel`'s date index, optionally pre-slicing the
/// panel to `[start, end]` first.
///
/// Per schedule date `w`: an exact match on the price index is kept; an
/// off-calendar `w` moves to the nearest preceding trading date unless the
/// schedule already carries an explicit row there, in which case the
/// off-calendar row is discarded. The returned panel starts at the aligned
/// schedule's first date (a backtest cannot begin before its first known
/// target weight) but keeps every later price row.
pub fn align(
    panel: &PricePanel,
    schedule: &WeightSchedule,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<(PricePanel, AlignedSchedule), NavsimError> {
    let order = column_order(panel, schedule)?;

    let panel = panel.sliced(start, end);
    if panel.is_empty() {
        return Err(NavsimError::EmptySchedule);
    }
    // Weight rows outside the panel's span are useless.
    let schedule = schedule.sliced(Some(panel.dates[0]), Some(*panel.dates.last().unwrap()));

    let mut aligned: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
    for (&w, row) in schedule.dates.iter().zip(&schedule.rows) {
        let row = reorder(row, &order);
        if panel.contains_date(w) {
            aligned.insert(w, row);
            continue;
        }
        let Some(idx) = panel.index_at_or_before(w) else {
            continue;
        };
        let d = panel.dates[idx];
        if schedule.contains_date(d) {
            // The explicit entry at d takes precedence.
            continue;
        }
        aligned.insert(d, row);
    }

    if aligned.is_empty() {
        return Err(NavsimError::EmptySchedule);
    }

    let (dates, rows): (Vec<_>, Vec<_>) = aligned.into_iter().unzip();
    let panel = panel.sliced_from(dates[0]);
    let assets = panel.assets.clone();
    Ok((panel, AlignedSchedule { assets, dates, rows }))
}

/// Permutation taking a schedule row into the panel's column order.
/// The two tables must cover the identical asset set.
fn column_order(panel: &PricePanel, schedule: &WeightSchedule) -> Result<Vec<usize>, NavsimError> {
    let missing: Vec<&String> = panel
        .assets
        .iter()
        .filter(|a| !schedule.assets.contains(a))
        .collect();
    let extra: Vec<&String> = schedule
        .assets
        .iter()
        .filter(|a| !panel.assets.contains(a))
        .collect();
    if !missing.is_empty() || !extra.is_empty() {
        let mut parts = Vec::new();
        if !missing.is_empty() {
            parts.push(format!(
                "missing from weights: {}",
                missing
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        if !extra.is_empty() {
            parts.push(format!(
                "missing from prices: {}",
                extra
                    .iter()
                    .map(|s| s.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ));
        }
        return Err(NavsimError::ColumnMismatch {
            reason: parts.join("; "),
        });
    }
    Ok(panel
        .assets
        .iter()
        .map(|a| schedule.assets.iter().position(|s| s == a).unwrap())
        .collect())
}

fn reorder(row: &[f64], order: &[usize]) -> Vec<f64> {
    order.iter().map(|&i| row[i]).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn panel(dates: &[NaiveDate]) -> PricePanel {
        PricePanel::from_rows(
            vec!["EQ".into()],
            dates.iter().map(|&d| (d, vec![1.0])).collect(),
        )
        .unwrap()
    }

    fn schedule(rows: &[(NaiveDate, f64)]) -> WeightSchedule {
        WeightSchedule::from_rows(
            vec!["EQ".into()],
            rows.iter().map(|&(d, w)| (d, vec![w])).collect(),
        )
        .unwrap()
    }

    #[test]
    fn exact_dates_kept_unchanged() {
        let p = panel(&[date(2024, 1, 1), date(2024, 1, 2), date(2024, 1, 3)]);
        let s = schedule(&[(date(2024, 1, 1), 0.5), (date(2024, 1, 3), 0.7)]);
        let (_, aligned) = align(&p, &s, None, None).unwrap();
        assert_eq!(aligned.dates, vec![date(2024, 1, 1), date(2024, 1, 3)]);
        assert_eq!(aligned.rows, vec![vec![0.5], vec![0.7]]);
    }

    #[test]
    fn off_calendar_date_moves_to_preceding_trading_date() {
        // Jan 31 is a calendar month-end with no price row; Jan 30 trades.
        let p = panel(&[date(2024, 1, 2), date(2024, 1, 30), date(2024, 2, 1)]);
        let s = schedule(&[(date(2024, 1, 2), 0.5), (date(2024, 1, 31), 0.8)]);
        let (_, aligned) = align(&p, &s, None, None).unwrap();
        assert_eq!(aligned.dates, vec![date(2024, 1, 2), date(2024, 1, 30)]);
        assert_eq!(aligned.rows[1], vec![0.8]);
    }

    #[test]
    fn explicit_entry_takes_precedence_over_moved_row() {
        let p = panel(&[date(2024, 1, 2), date(2024, 1, 30), date(2024, 2, 1)]);
        let s = schedule(&[
            (date(2024, 1, 2), 0.5),
            (date(2024, 1, 30), 0.6),
            (date(2024, 1, 31), 0.9),
        ]);
        let (_, aligned) = align(&p, &s, None, None).unwrap();
        // The Jan 31 row is discarded, not moved onto Jan 30.
        assert_eq!(aligned.dates, vec![date(2024, 1, 2), date(2024, 1, 30)]);
        assert_eq!(aligned.rows[1], vec![0.6]);
    }

    #[test]
    fn panel_resliced_to_first_aligned_date() {
        let p = panel(&[
            date(2024, 1, 1),
            date(2024, 1, 2),
            date(2024, 1, 3),
            date(2024, 1, 4),
        ]);
        let s = schedule(&[(date(2024, 1, 2), 1.0)]);
        let (sliced, aligned) = align(&p, &s, None, None).unwrap();
        assert_eq!(sliced.dates[0], aligned.dates[0]);
        assert_eq!(sliced.dates[0], date(2024, 1, 2));
        // The end stays as far as price data permits.
        assert_eq!(*sliced.dates.last().unwrap(), date(2024, 1, 4));
    }

    #[test]
    fn alignment_is_idempotent() {
        let p = panel(&[date(2024, 1, 2), date(2024, 1, 30), date(2024, 2, 1)]);
        let s = schedule(&[(date(2024, 1, 2), 0.5), (date(2024, 1, 31), 0.8)]);
        let (sliced, first) = align(&p, &s, None, None).unwrap();

        let as_schedule = WeightSchedule {
            assets: first.assets.clone(),
            dates: first.dates.clone(),
            rows: first.rows.clone(),
        };
        let (_, second) = align(&sliced, &as_schedule, None, None).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn empty_after_alignment_is_fatal() {
        let p = panel(&[date(2024, 1, 1), date(2024, 1, 2)]);
        let s = schedule(&[(date(2024, 1, 1), 1.0)]);
        // Bounds exclude every schedule date.
        let result = align(&p, &s, Some(date(2024, 1, 2)), None);
        assert!(matches!(result, Err(NavsimError::EmptySchedule)));
    }

    #[test]
    fn column_set_mismatch_is_fatal() {
        let p = panel(&[date(2024, 1, 1)]);
        let s = WeightSchedule::from_rows(
            vec!["EQ".into(), "BOND".into()],
            vec![(date(2024, 1, 1), vec![0.5, 0.5])],
        )
        .unwrap();
        let result = align(&p, &s, None, None);
        assert!(matches!(result, Err(NavsimError::ColumnMismatch { .. })));
    }

    #[test]
    fn columns_reordered_to_panel_order() {
        let p = PricePanel::from_rows(
            vec!["EQ".into(), "BOND".into()],
            vec![(date(2024, 1, 1), vec![1.0, 1.0])],
        )
        .unwrap();
        let s = WeightSchedule::from_rows(
            vec!["BOND".into(), "EQ".into()],
            vec![(date(2024, 1, 1), vec![0.4, 0.6])],
        )
        .unwrap();
        let (_, aligned) = align(&p, &s, None, None).unwrap();
        assert_eq!(aligned.assets, vec!["EQ", "BOND"]);
        assert_eq!(aligned.rows[0], vec![0.6, 0.4]);
    }
}
