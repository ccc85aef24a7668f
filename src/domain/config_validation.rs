//! Configuration validation.
//!
//! Every key is optional except `[data] dir`; present keys must parse and lie
//! in range. The typed readers here are also what the CLI uses to build its
//! settings, so validation and loading cannot disagree.

use std::str::FromStr;

use crate::domain::error::SignalError;
use crate::domain::indicator::frame::{MAX_VOLUME_WINDOW, MIN_VOLUME_WINDOW};
use crate::domain::ohlcv::Lookback;
use crate::domain::opportunity::MAX_WORKERS;
use crate::ports::config_port::ConfigPort;

pub fn validate_config(config: &dyn ConfigPort) -> Result<(), SignalError> {
    validate_data(config)?;
    validate_analysis(config)?;
    validate_scan(config)?;
    Ok(())
}

fn validate_data(config: &dyn ConfigPort) -> Result<(), SignalError> {
    require_string(config, "data", "dir")?;
    if config
        .get_string("data", "universe")
        .is_some_and(|u| u.trim().is_empty())
    {
        return Err(invalid("data", "universe", "must not be empty"));
    }
    read_int(config, "data", "cache_ttl_secs", 0, 0..=i64::MAX)?;
    Ok(())
}

fn validate_analysis(config: &dyn ConfigPort) -> Result<(), SignalError> {
    read_lookback(config, "analysis", Lookback::TwoYears)?;
    read_int(
        config,
        "analysis",
        "volume_window",
        MIN_VOLUME_WINDOW as i64,
        MIN_VOLUME_WINDOW as i64..=MAX_VOLUME_WINDOW as i64,
    )?;
    read_risk_pct(config, 0.05)?;
    Ok(())
}

fn validate_scan(config: &dyn ConfigPort) -> Result<(), SignalError> {
    read_lookback(config, "scan", Lookback::SixMonths)?;
    read_int(config, "scan", "top_n", 1, 1..=i64::MAX)?;
    read_int(config, "scan", "workers", 1, 1..=MAX_WORKERS as i64)?;
    read_int(config, "scan", "timeout_ms", 1, 1..=i64::MAX)?;
    Ok(())
}

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SignalError {
    SignalError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

pub fn require_string(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, SignalError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        _ => Err(SignalError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

fn parse_value<T: FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<T>, SignalError> {
    match config.get_string(section, key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| invalid(section, key, format!("cannot parse '{}'", raw.trim()))),
    }
}

/// Integer key, `default` when absent, error when present but out of `range`.
pub fn read_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    range: std::ops::RangeInclusive<i64>,
) -> Result<i64, SignalError> {
    let value = parse_value::<i64>(config, section, key)?.unwrap_or(default);
    if !range.contains(&value) {
        return Err(invalid(
            section,
            key,
            format!("{value} outside {}..={}", range.start(), range.end()),
        ));
    }
    Ok(value)
}

pub fn read_lookback(
    config: &dyn ConfigPort,
    section: &str,
    default: Lookback,
) -> Result<Lookback, SignalError> {
    match config.get_string(section, "lookback") {
        None => Ok(default),
        Some(raw) => raw
            .parse::<Lookback>()
            .map_err(|e| invalid(section, "lookback", e.to_string())),
    }
}

pub fn read_risk_pct(config: &dyn ConfigPort, default: f64) -> Result<f64, SignalError> {
    let value = parse_value::<f64>(config, "analysis", "risk_pct")?.unwrap_or(default);
    if !(value > 0.0 && value <= 1.0) {
        return Err(invalid("analysis", "risk_pct", format!("{value} must be in (0, 1]")));
    }
    Ok(value)
}
