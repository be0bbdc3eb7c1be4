//! CSV report adapter.

use crate::domain::error::NavsimError;
use crate::domain::report::BacktestReport;
use crate::domain::simulation::PortfolioState;
use crate::domain::stats::PeriodRow;
use crate::ports::report_port::ReportPort;
use std::path::Path;

/// Sentinel written when a drawdown has not recovered within the data.
const NOT_RECOVERED: &str = "not yet recovered";

pub struct CsvReportAdapter;

impl CsvReportAdapter {
    pub fn new() -> Self {
        CsvReportAdapter
    }
}

impl Default for CsvReportAdapter {
    fn default() -> Self {
        Self::new()
    }
}

fn open_writer(path: &Path) -> Result<csv::Writer<std::fs::File>, NavsimError> {
    csv::Writer::from_path(path).map_err(|e| NavsimError::Data {
        reason: format!("failed to open {}: {}", path.display(), e),
    })
}

fn write_record<W: std::io::Write>(
    wtr: &mut csv::Writer<W>,
    path: &Path,
    fields: &[String],
) -> Result<(), NavsimError> {
    wtr.write_record(fields).map_err(|e| NavsimError::Data {
        reason: format!("failed to write {}: {}", path.display(), e),
    })
}

impl ReportPort for CsvReportAdapter {
    fn write_summary(&self, report: &BacktestReport, path: &Path) -> Result<(), NavsimError> {
        let mut wtr = open_writer(path)?;

        let mut header: Vec<String> = [
            "period",
            "holding_period_return",
            "annualized_return",
            "annualized_volatility",
            "max_drawdown",
            "drawdown_start",
            "drawdown_formation",
            "drawdown_recovery",
            "sharpe",
            "calmar",
            "portfolio_turnover",
            "total_fee",
        ]
        .map(String::from)
        .to_vec();
        for asset in &report.assets {
            header.push(format!("{}_turnover", asset));
        }
        write_record(&mut wtr, path, &header)?;

        for record in &report.records {
            let mut fields = vec![
                record.label.to_string(),
                record.holding_period_return.to_string(),
                record.annualized_return.to_string(),
                record.annualized_volatility.to_string(),
                record.max_drawdown.to_string(),
                record.drawdown_start.to_string(),
                record.drawdown_formation.to_string(),
                record
                    .recovery
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| NOT_RECOVERED.to_string()),
                record.sharpe.to_string(),
                record.calmar.to_string(),
                record.portfolio_turnover.to_string(),
                record.total_fee.to_string(),
            ];
            for turnover in &record.asset_turnover {
                fields.push(turnover.to_string());
            }
            write_record(&mut wtr, path, &fields)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_states(
        &self,
        states: &[PortfolioState],
        assets: &[String],
        path: &Path,
    ) -> Result<(), NavsimError> {
        let mut wtr = open_writer(path)?;

        let mut header = vec!["date".to_string(), "nav".to_string(), "fee".to_string()];
        for asset in assets {
            header.push(format!("{}_shares", asset));
        }
        for asset in assets {
            header.push(format!("{}_weight", asset));
        }
        for asset in assets {
            header.push(format!("{}_turnover", asset));
        }
        write_record(&mut wtr, path, &header)?;

        for state in states {
            let mut fields = vec![
                state.date.to_string(),
                state.nav.to_string(),
                state.fee.to_string(),
            ];
            fields.extend(state.shares.iter().map(|v| v.to_string()));
            fields.extend(state.weights.iter().map(|v| v.to_string()));
            fields.extend(state.turnover.iter().map(|v| v.to_string()));
            write_record(&mut wtr, path, &fields)?;
        }
        wtr.flush()?;
        Ok(())
    }

    fn write_asset_stats(
        &self,
        asset: &str,
        rows: &[PeriodRow],
        path: &Path,
    ) -> Result<(), NavsimError> {
        let mut wtr = open_writer(path)?;

        let header: Vec<String> = [
            "asset",
            "period",
            "holding_period_return",
            "annualized_return",
            "annualized_volatility",
            "max_drawdown",
            "drawdown_start",
            "drawdown_formation",
            "drawdown_recovery",
            "sharpe",
            "calmar",
        ]
        .map(String::from)
        .to_vec();
        write_record(&mut wtr, path, &header)?;

        for row in rows {
            let fields = vec![
                asset.to_string(),
                row.label.to_string(),
                row.stats.holding_period_return.to_string(),
                row.stats.annualized_return.to_string(),
                row.stats.annualized_volatility.to_string(),
                row.stats.drawdown.mdd.to_string(),
                row.stats.drawdown.start.to_string(),
                row.stats.drawdown.formation.to_string(),
                row.recovery
                    .map(|d| d.to_string())
                    .unwrap_or_else(|| NOT_RECOVERED.to_string()),
                row.stats.sharpe.to_string(),
                row.stats.calmar.to_string(),
            ];
            write_record(&mut wtr, path, &fields)?;
        }
        wtr.flush()?;
        Ok(())
    }
}
