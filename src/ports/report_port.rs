//! Report output port trait.

use std::path::Path;

use crate::domain::error::NavsimError;
use crate::domain::report::BacktestReport;
use crate::domain::simulation::PortfolioState;
use crate::domain::stats::PeriodRow;

/// Port for serializing backtest results. The core produces tables; how
/// they land on disk is an adapter concern.
pub trait ReportPort {
    /// Write the per-period summary table.
    fn write_summary(&self, report: &BacktestReport, path: &Path) -> Result<(), NavsimError>;

    /// Write the per-date portfolio state series.
    fn write_states(
        &self,
        states: &[PortfolioState],
        assets: &[String],
        path: &Path,
    ) -> Result<(), NavsimError>;

    /// Write single-asset statistics rows.
    fn write_asset_stats(
        &self,
        asset: &str,
        rows: &[PeriodRow],
        path: &Path,
    ) -> Result<(), NavsimError>;
}
