//! CSV file data adapter.
//!
//! Both input tables are wide CSVs: a `date` column in `YYYY-MM-DD` format
//! followed by one column per asset. The weight table is sparse by row
//! (only intended rebalance dates appear), never by cell.

use crate::domain::error::NavsimError;
use crate::domain::panel::{PricePanel, WeightSchedule};
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub struct CsvDataAdapter {
    prices_path: PathBuf,
    weights_path: PathBuf,
}

impl CsvDataAdapter {
    pub fn new(prices_path: PathBuf, weights_path: PathBuf) -> Self {
        Self {
            prices_path,
            weights_path,
        }
    }
}

impl DataPort for CsvDataAdapter {
    fn load_prices(&self) -> Result<PricePanel, NavsimError> {
        // Empty price cells become NaN; they are legal only for columns
        // examined via single-asset statistics.
        let (assets, rows) = read_wide_csv(&self.prices_path, true)?;
        PricePanel::from_rows(assets, rows)
    }

    fn load_weights(&self) -> Result<WeightSchedule, NavsimError> {
        let (assets, rows) = read_wide_csv(&self.weights_path, false)?;
        WeightSchedule::from_rows(assets, rows)
    }
}

fn read_wide_csv(
    path: &Path,
    allow_blank: bool,
) -> Result<(Vec<String>, Vec<(NaiveDate, Vec<f64>)>), NavsimError> {
    let content = fs::read_to_string(path).map_err(|e| NavsimError::Data {
        reason: format!("failed to read {}: {}", path.display(), e),
    })?;

    let mut rdr = csv::Reader::from_reader(content.as_bytes());
    let headers = rdr.headers().map_err(|e| NavsimError::Data {
        reason: format!("{}: {}", path.display(), e),
    })?;
    if headers.len() < 2 {
        return Err(NavsimError::Data {
            reason: format!("{}: expected a date column plus asset columns", path.display()),
        });
    }
    let assets: Vec<String> = headers.iter().skip(1).map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result.map_err(|e| NavsimError::Data {
            reason: format!("{}: {}", path.display(), e),
        })?;

        let date_str = record.get(0).ok_or_else(|| NavsimError::Data {
            reason: format!("{}: missing date column", path.display()),
        })?;
        let date =
            NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                NavsimError::Data {
                    reason: format!("{}: invalid date {}: {}", path.display(), date_str, e),
                }
            })?;

        let mut values = Vec::with_capacity(assets.len());
        for (asset, field) in assets.iter().zip(record.iter().skip(1)) {
            let field = field.trim();
            if field.is_empty() {
                if allow_blank {
                    values.push(f64::NAN);
                    continue;
                }
                return Err(NavsimError::Data {
                    reason: format!("{}: blank {} cell at {}", path.display(), asset, date),
                });
            }
            let value: f64 = field.parse().map_err(|e| NavsimError::Data {
                reason: format!(
                    "{}: invalid {} value at {}: {}",
                    path.display(),
                    asset,
                    date,
                    e
                ),
            })?;
            values.push(value);
        }
        if values.len() != assets.len() {
            return Err(NavsimError::Data {
                reason: format!("{}: short row at {}", path.display(), date),
            });
        }
        rows.push((date, values));
    }

    Ok((assets, rows))
}
