//! Domain error types.

use chrono::NaiveDate;

/// Top-level error type for navsim.
#[derive(Debug, thiserror::Error)]
pub enum NavsimError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("assets assigned to both risk buckets: {assets}")]
    DuplicateRiskAssignment { assets: String },

    #[error("risk bucket unspecified for assets: {assets}")]
    UnassignedRisk { assets: String },

    #[error("asset columns differ between prices and weights: {reason}")]
    ColumnMismatch { reason: String },

    #[error("no usable rebalancing dates after alignment")]
    EmptySchedule,

    #[error("rebalance date {date} not present in the price index")]
    UnalignedSchedule { date: NaiveDate },

    #[error(
        "NAV solver failed to converge at {date}: residual {residual:e} after {iterations} iterations"
    )]
    SolverDiverged {
        date: NaiveDate,
        residual: f64,
        iterations: usize,
    },

    #[error("invalid NAV {value} at {date}")]
    InvalidNav { date: NaiveDate, value: f64 },

    #[error("no column named {name} in the price table")]
    UnknownAsset { name: String },

    #[error("insufficient observations: have {points}, need at least 2")]
    InsufficientObservations { points: usize },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&NavsimError> for std::process::ExitCode {
    fn from(err: &NavsimError) -> Self {
        let code: u8 = match err {
            NavsimError::Io(_) => 1,
            NavsimError::ConfigParse { .. }
            | NavsimError::ConfigMissing { .. }
            | NavsimError::ConfigInvalid { .. }
            | NavsimError::DuplicateRiskAssignment { .. }
            | NavsimError::UnassignedRisk { .. }
            | NavsimError::ColumnMismatch { .. }
            | NavsimError::EmptySchedule => 2,
            NavsimError::SolverDiverged { .. }
            | NavsimError::InvalidNav { .. }
            | NavsimError::UnalignedSchedule { .. } => 3,
            NavsimError::UnknownAsset { .. }
            | NavsimError::InsufficientObservations { .. }
            | NavsimError::Data { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
