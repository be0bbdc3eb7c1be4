#![allow(dead_code)]

use chrono::NaiveDate;
use navsim::domain::error::NavsimError;
use navsim::domain::panel::{PricePanel, WeightSchedule};
use navsim::ports::data_port::DataPort;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn make_panel(assets: &[&str], rows: &[(NaiveDate, &[f64])]) -> PricePanel {
    PricePanel::from_rows(
        assets.iter().map(|s| s.to_string()).collect(),
        rows.iter().map(|&(d, v)| (d, v.to_vec())).collect(),
    )
    .unwrap()
}

pub fn make_schedule(assets: &[&str], rows: &[(NaiveDate, &[f64])]) -> WeightSchedule {
    WeightSchedule::from_rows(
        assets.iter().map(|s| s.to_string()).collect(),
        rows.iter().map(|&(d, v)| (d, v.to_vec())).collect(),
    )
    .unwrap()
}

/// Panel on consecutive calendar days starting at `start`.
pub fn daily_panel(assets: &[&str], start: NaiveDate, rows: &[Vec<f64>]) -> PricePanel {
    let dated: Vec<(NaiveDate, &[f64])> = rows
        .iter()
        .enumerate()
        .map(|(i, row)| (start + chrono::Duration::days(i as i64), row.as_slice()))
        .collect();
    make_panel(assets, &dated)
}

pub fn uniform_rates(n: usize, rate: f64) -> Vec<f64> {
    vec![rate; n]
}

/// In-memory data port: a fixed price panel and weight schedule, or a
/// configured load error.
pub struct MockDataPort {
    pub prices: PricePanel,
    pub weights: WeightSchedule,
    pub fail_with: Option<String>,
}

impl MockDataPort {
    pub fn new(prices: PricePanel, weights: WeightSchedule) -> Self {
        Self {
            prices,
            weights,
            fail_with: None,
        }
    }

    pub fn with_error(mut self, reason: &str) -> Self {
        self.fail_with = Some(reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn load_prices(&self) -> Result<PricePanel, NavsimError> {
        if let Some(reason) = &self.fail_with {
            return Err(NavsimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.prices.clone())
    }

    fn load_weights(&self) -> Result<WeightSchedule, NavsimError> {
        if let Some(reason) = &self.fail_with {
            return Err(NavsimError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self.weights.clone())
    }
}
