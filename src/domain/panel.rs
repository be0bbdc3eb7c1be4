//! Price and target-weight tables, indexed by date.

use chrono::NaiveDate;

use super::error::NavsimError;

/// Closing prices, one column per asset, rows ascending by date.
///
/// Immutable after construction. Prices may contain NaN only in columns
/// that are never actively weighted (single-asset statistics drop them).
#[derive(Debug, Clone, PartialEq)]
pub struct PricePanel {
    pub assets: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
}

impl PricePanel {
    /// Build a panel from unordered (date, prices) rows. Rows are sorted by
    /// date; duplicate dates and ragged rows are rejected.
    pub fn from_rows(
        assets: Vec<String>,
        rows: Vec<(NaiveDate, Vec<f64>)>,
    ) -> Result<Self, NavsimError> {
        let (dates, rows) = sort_rows(&assets, rows, "price")?;
        Ok(PricePanel {
            assets,
            dates,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    /// Index of the nearest date at or before `date`, if any.
    pub fn index_at_or_before(&self, date: NaiveDate) -> Option<usize> {
        match self.dates.binary_search(&date) {
            Ok(idx) => Some(idx),
            Err(0) => None,
            Err(idx) => Some(idx - 1),
        }
    }

    pub fn column_index(&self, name: &str) -> Result<usize, NavsimError> {
        self.assets
            .iter()
            .position(|a| a == name)
            .ok_or_else(|| NavsimError::UnknownAsset {
                name: name.to_string(),
            })
    }

    /// Sub-panel restricted to dates within `[start, end]` inclusive.
    /// `None` bounds leave that side open.
    pub fn sliced(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> PricePanel {
        let lo = match start {
            Some(s) => self.dates.partition_point(|&d| d < s),
            None => 0,
        };
        let hi = match end {
            Some(e) => self.dates.partition_point(|&d| d <= e),
            None => self.dates.len(),
        };
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (lo, lo) };
        PricePanel {
            assets: self.assets.clone(),
            dates: self.dates[lo..hi].to_vec(),
            rows: self.rows[lo..hi].to_vec(),
        }
    }

    /// Sub-panel from `start` (inclusive) to the end of the data.
    pub fn sliced_from(&self, start: NaiveDate) -> PricePanel {
        self.sliced(Some(start), None)
    }

    /// Prices rescaled so the first row equals 1 per asset. Numerical
    /// conditioning only; relative moves are unchanged.
    pub fn normalized(&self) -> PricePanel {
        if self.rows.is_empty() {
            return self.clone();
        }
        let base = self.rows[0].clone();
        let rows = self
            .rows
            .iter()
            .map(|row| row.iter().zip(&base).map(|(p, b)| p / b).collect())
            .collect();
        PricePanel {
            assets: self.assets.clone(),
            dates: self.dates.clone(),
            rows,
        }
    }
}

/// Sparse target weights indexed by *intended* rebalance dates.
///
/// Weights are unconstrained: negative entries short, and rows need not
/// sum to 1 (leverage).
#[derive(Debug, Clone, PartialEq)]
pub struct WeightSchedule {
    pub assets: Vec<String>,
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<Vec<f64>>,
}

impl WeightSchedule {
    /// Build a schedule from unordered (date, weights) rows; same rules as
    /// [`PricePanel::from_rows`].
    pub fn from_rows(
        assets: Vec<String>,
        rows: Vec<(NaiveDate, Vec<f64>)>,
    ) -> Result<Self, NavsimError> {
        let (dates, rows) = sort_rows(&assets, rows, "weight")?;
        Ok(WeightSchedule {
            assets,
            dates,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.dates.binary_search(&date).is_ok()
    }

    /// Schedule restricted to dates within `[start, end]` inclusive.
    pub fn sliced(&self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> WeightSchedule {
        let lo = match start {
            Some(s) => self.dates.partition_point(|&d| d < s),
            None => 0,
        };
        let hi = match end {
            Some(e) => self.dates.partition_point(|&d| d <= e),
            None => self.dates.len(),
        };
        let (lo, hi) = if lo <= hi { (lo, hi) } else { (lo, lo) };
        WeightSchedule {
            assets: self.assets.clone(),
            dates: self.dates[lo..hi].to_vec(),
            rows: self.rows[lo..hi].to_vec(),
        }
    }
}

fn sort_rows(
    assets: &[String],
    mut rows: Vec<(NaiveDate, Vec<f64>)>,
    what: &str,
) -> Result<(Vec<NaiveDate>, Vec<Vec<f64>>), NavsimError> {
    for (date, row) in &rows {
        if row.len() != assets.len() {
            return Err(NavsimError::Data {
                reason: format!(
                    "{} row at {} has {} values, expected {}",
                    what,
                    date,
                    row.len(),
                    assets.len()
                ),
            });
        }
    }
    rows.sort_by_key(|(date, _)| *date);
    for pair in rows.windows(2) {
        if pair[0].0 == pair[1].0 {
            return Err(NavsimError::Data {
                reason: format!("duplicate {} row at {}", what, pair[0].0),
            });
        }
    }
    Ok(rows.into_iter().unzip())
}
