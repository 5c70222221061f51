//! Bounded retry of the primary price source with a file fallback.

use crate::domain::error::MarkowitzError;
use crate::domain::price_series::PriceSeries;
use crate::ports::price_port::{BackupLoader, PriceRetriever};
use chrono::NaiveDate;
use log::{info, warn};
use std::path::Path;
use std::time::Duration;

pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// Waits between retry attempts. Tests substitute a recorder.
pub trait Sleeper {
    fn sleep(&self, duration: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Where a price matrix came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceSource {
    Retriever { attempt: u32 },
    Backup,
}

/// Inputs for [`acquire_prices`].
pub struct PriceRequest<'a> {
    pub tickers: &'a [String],
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub backup_path: &'a Path,
}

/// Tries `retriever` up to `policy.max_attempts` times, sleeping
/// `policy.delay` between attempts, then falls back to `backup`.
///
/// An empty matrix counts as a failed attempt. Always resolves to a
/// non-empty matrix or an error; a missing backup file surfaces as
/// `BackupNotFound`, any other exhaustion as `DataUnavailable`.
pub fn acquire_prices(
    request: &PriceRequest<'_>,
    retriever: &dyn PriceRetriever,
    backup: &dyn BackupLoader,
    policy: &RetryPolicy,
    sleeper: &dyn Sleeper,
) -> Result<(PriceSeries, PriceSource), MarkowitzError> {
    for attempt in 1..=policy.max_attempts {
        match retriever.fetch_prices(request.tickers, request.start_date, request.end_date) {
            Ok(prices) if !prices.is_empty() => {
                info!("fetched {} rows from price retriever", prices.row_count());
                return Ok((prices, PriceSource::Retriever { attempt }));
            }
            Ok(_) => warn!(
                "attempt {}/{}: price retriever returned no rows",
                attempt, policy.max_attempts
            ),
            Err(e) => warn!(
                "attempt {}/{}: price retrieval failed: {}",
                attempt, policy.max_attempts, e
            ),
        }

        if attempt < policy.max_attempts {
            sleeper.sleep(policy.delay);
        }
    }

    warn!(
        "price retriever exhausted, loading backup {}",
        request.backup_path.display()
    );

    let prices = match backup.load(request.backup_path, request.tickers) {
        Ok(p) => p,
        Err(e @ MarkowitzError::BackupNotFound { .. }) => return Err(e),
        Err(e) => {
            return Err(MarkowitzError::DataUnavailable {
                reason: format!("backup {} unusable: {}", request.backup_path.display(), e),
            });
        }
    };

    if prices.is_empty() {
        return Err(MarkowitzError::DataUnavailable {
            reason: format!("backup {} has no usable rows", request.backup_path.display()),
        });
    }

    info!("loaded {} rows from backup", prices.row_count());
    Ok((prices, PriceSource::Backup))
}
