//! Configuration validation.
//!
//! Checks every config field before any simulation work begins, so a bad
//! run fails fast with a configuration error rather than mid-backtest.

use crate::domain::error::NavsimError;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), NavsimError> {
    validate_data_paths(config)?;
    validate_annualization_factor(config)?;
    validate_risk_free_rate(config)?;
    validate_dates(config)?;
    validate_fee_rates(config)?;
    validate_risk_buckets(config)?;
    validate_solver(config)?;
    Ok(())
}

fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, NavsimError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(NavsimError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn validate_data_paths(config: &dyn ConfigPort) -> Result<(), NavsimError> {
    require_string(config, "data", "prices")?;
    require_string(config, "data", "weights")?;
    Ok(())
}

fn validate_annualization_factor(config: &dyn ConfigPort) -> Result<(), NavsimError> {
    let value = config.get_int("backtest", "annualization_factor", 250);
    if value < 1 {
        return Err(NavsimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "annualization_factor".to_string(),
            reason: "annualization_factor must be at least 1".to_string(),
        });
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), NavsimError> {
    let value = config.get_double("backtest", "risk_free_rate", 0.0);
    if value < 0.0 || value >= 1.0 {
        return Err(NavsimError::ConfigInvalid {
            section: "backtest".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), NavsimError> {
    let start = parse_optional_date(config, "start_date")?;
    let end = parse_optional_date(config, "end_date")?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(NavsimError::ConfigInvalid {
                section: "backtest".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must be before end_date".to_string(),
            });
        }
    }
    Ok(())
}

pub fn parse_optional_date(
    config: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, NavsimError> {
    match config.get_string("backtest", key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| NavsimError::ConfigInvalid {
                section: "backtest".to_string(),
                key: key.to_string(),
                reason: "invalid date format (expected YYYY-MM-DD)".to_string(),
            }),
    }
}

fn validate_fee_rates(config: &dyn ConfigPort) -> Result<(), NavsimError> {
    for key in ["high_risk_fee_rate", "low_risk_fee_rate"] {
        let value = config.get_double("fees", key, 0.0);
        if value < 0.0 || !value.is_finite() {
            return Err(NavsimError::ConfigInvalid {
                section: "fees".to_string(),
                key: key.to_string(),
                reason: format!("{} must be non-negative", key),
            });
        }
    }
    Ok(())
}

fn validate_risk_buckets(config: &dyn ConfigPort) -> Result<(), NavsimError> {
    let high = config.get_list("fees", "high_risk_assets");
    let low = config.get_list("fees", "low_risk_assets");
    if high.is_empty() && low.is_empty() {
        return Err(NavsimError::ConfigMissing {
            section: "fees".to_string(),
            key: "high_risk_assets".to_string(),
        });
    }
    // Cross-bucket duplicates are caught against the actual panel columns
    // when the fee schedule is resolved.
    Ok(())
}

fn validate_solver(config: &dyn ConfigPort) -> Result<(), NavsimError> {
    let iterations = config.get_int("solver", "max_iterations", 50);
    if iterations < 1 {
        return Err(NavsimError::ConfigInvalid {
            section: "solver".to_string(),
            key: "max_iterations".to_string(),
            reason: "max_iterations must be at least 1".to_string(),
        });
    }
    let tolerance = config.get_double("solver", "tolerance", 1e-12);
    if !(tolerance > 0.0) || !tolerance.is_finite() {
        return Err(NavsimError::ConfigInvalid {
            section: "solver".to_string(),
            key: "tolerance".to_string(),
            reason: "tolerance must be a positive number".to_string(),
        });
    }
    Ok(())
}
