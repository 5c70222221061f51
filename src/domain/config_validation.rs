//! Configuration validation.
//!
//! Validates all config fields before an optimisation runs.

use crate::domain::error::MarkowitzError;
use crate::domain::universe::parse_tickers;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub fn validate_portfolio_config(config: &dyn ConfigPort) -> Result<(), MarkowitzError> {
    validate_tickers(config)?;
    validate_dates(config)?;
    validate_target_return(config)?;
    validate_risk_free_rate(config)?;
    validate_capital(config)?;
    validate_retries(config)?;
    Ok(())
}

fn validate_tickers(config: &dyn ConfigPort) -> Result<(), MarkowitzError> {
    let value = config
        .get_string("portfolio", "tickers")
        .ok_or_else(|| MarkowitzError::ConfigMissing {
            section: "portfolio".to_string(),
            key: "tickers".to_string(),
        })?;
    parse_tickers(&value).map_err(|e| MarkowitzError::ConfigInvalid {
        section: "portfolio".to_string(),
        key: "tickers".to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), MarkowitzError> {
    let start_str = config.get_string("portfolio", "start_date");
    let end_str = config.get_string("portfolio", "end_date");

    let start_date = parse_date(start_str.as_deref(), "start_date")?;
    let end_date = parse_date(end_str.as_deref(), "end_date")?;

    if start_date >= end_date {
        return Err(MarkowitzError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "start_date".to_string(),
            reason: "start_date must be before end_date".to_string(),
        });
    }
    Ok(())
}

pub fn parse_date(value: Option<&str>, field: &str) -> Result<NaiveDate, MarkowitzError> {
    match value {
        None => Err(MarkowitzError::ConfigMissing {
            section: "portfolio".to_string(),
            key: field.to_string(),
        }),
        Some(s) => NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            MarkowitzError::ConfigInvalid {
                section: "portfolio".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }
        }),
    }
}

/// Reads a numeric key, falling back to `default` only when the key is
/// absent. A present value that does not parse is `ConfigInvalid`.
pub fn read_number<T: std::str::FromStr>(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, MarkowitzError> {
    match config.get_string(section, key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| MarkowitzError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: format!("'{}' is not a number", raw.trim()),
        }),
    }
}

/// Rejects a capital that is non-finite or not positive.
pub fn check_capital(value: f64) -> Result<f64, MarkowitzError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(MarkowitzError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "capital".to_string(),
            reason: "capital must be positive".to_string(),
        });
    }
    Ok(value)
}

fn validate_target_return(config: &dyn ConfigPort) -> Result<(), MarkowitzError> {
    // Annual percent, e.g. 7.0 for 7%.
    let value: f64 = read_number(config, "portfolio", "target_return", 0.0)?;
    if !value.is_finite() || value < 0.0 {
        return Err(MarkowitzError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "target_return".to_string(),
            reason: "target_return must be a non-negative annual percentage".to_string(),
        });
    }
    Ok(())
}

fn validate_risk_free_rate(config: &dyn ConfigPort) -> Result<(), MarkowitzError> {
    let value: f64 = read_number(config, "portfolio", "risk_free_rate", 0.0)?;
    if !(0.0..1.0).contains(&value) {
        return Err(MarkowitzError::ConfigInvalid {
            section: "portfolio".to_string(),
            key: "risk_free_rate".to_string(),
            reason: "risk_free_rate must be between 0 and 1".to_string(),
        });
    }
    Ok(())
}

fn validate_capital(config: &dyn ConfigPort) -> Result<(), MarkowitzError> {
    check_capital(read_number(config, "portfolio", "capital", 1.0)?)?;
    Ok(())
}

fn validate_retries(config: &dyn ConfigPort) -> Result<(), MarkowitzError> {
    if read_number::<i64>(config, "data", "retries", 1)? < 1 {
        return Err(MarkowitzError::ConfigInvalid {
            section: "data".to_string(),
            key: "retries".to_string(),
            reason: "retries must be at least 1".to_string(),
        });
    }
    if read_number::<i64>(config, "data", "retry_delay_secs", 0)? < 0 {
        return Err(MarkowitzError::ConfigInvalid {
            section: "data".to_string(),
            key: "retry_delay_secs".to_string(),
            reason: "retry_delay_secs must be non-negative".to_string(),
        });
    }
    Ok(())
}
