//! Configuration validation.
//!
//! Checks every config value before any price data is loaded. The engine
//! re-validates strategy parameters on its own; this catches them earlier
//! and names the offending INI key.

use crate::domain::error::DcaError;
use crate::domain::strategy::{
    DEFAULT_DRAWDOWN_THRESHOLD, DEFAULT_MONTHLY_CONTRIB, DEFAULT_MONTHLY_GROWTH,
    DEFAULT_SMA_WINDOW, ROLLING_HIGH_DAYS, parse_strategy_list,
};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), DcaError> {
    validate_dates(config)?;
    validate_monthly_contrib(config)?;
    validate_strategies(config)?;
    validate_double_down(config)?;
    validate_sma(config)?;
    validate_value_averaging(config)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> DcaError {
    DcaError::config(format!("[{}] {}", section, key), reason)
}

/// Parse an optional `YYYY-MM-DD` value.
pub fn parse_date(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<NaiveDate>, DcaError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|_| invalid(section, key, "invalid date format, expected YYYY-MM-DD")),
    }
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let start = parse_date(config, "data", "start_date")?;
    let end = parse_date(config, "data", "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid("data", "start_date", "start_date must be before end_date"));
        }
    }
    Ok(())
}

fn validate_monthly_contrib(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let value = config
        .get_double("simulation", "monthly_contrib")?
        .unwrap_or(DEFAULT_MONTHLY_CONTRIB);
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            "simulation",
            "monthly_contrib",
            "monthly_contrib must be non-negative",
        ));
    }
    Ok(())
}

fn validate_strategies(config: &dyn ConfigPort) -> Result<(), DcaError> {
    if let Some(list) = config.get_string("simulation", "strategies") {
        parse_strategy_list(&list)
            .map_err(|e| invalid("simulation", "strategies", e.to_string()))?;
    }
    Ok(())
}

fn validate_double_down(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let threshold = config
        .get_double("double_down", "threshold")?
        .unwrap_or(DEFAULT_DRAWDOWN_THRESHOLD);
    if !(threshold > 0.0 && threshold < 1.0) {
        return Err(invalid(
            "double_down",
            "threshold",
            "threshold must be between 0 and 1 (exclusive)",
        ));
    }
    let lookback = config
        .get_int("double_down", "lookback")?
        .unwrap_or(ROLLING_HIGH_DAYS as i64);
    if lookback <= 0 {
        return Err(invalid("double_down", "lookback", "lookback must be positive"));
    }
    Ok(())
}

fn validate_sma(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let window = config
        .get_int("sma", "window")?
        .unwrap_or(DEFAULT_SMA_WINDOW as i64);
    if window <= 0 {
        return Err(invalid("sma", "window", "window must be positive"));
    }
    Ok(())
}

fn validate_value_averaging(config: &dyn ConfigPort) -> Result<(), DcaError> {
    let growth = config
        .get_double("value_averaging", "monthly_growth")?
        .unwrap_or(DEFAULT_MONTHLY_GROWTH);
    if !growth.is_finite() || growth <= -1.0 {
        return Err(invalid(
            "value_averaging",
            "monthly_growth",
            "monthly_growth must be greater than -1",
        ));
    }
    Ok(())
}
