//! Wide backup price sheet: a date column followed by one column per ticker.

use crate::domain::error::MarkowitzError;
use crate::domain::price_series::PriceSeries;
use crate::ports::price_port::BackupLoader;
use chrono::NaiveDate;
use log::{debug, warn};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

/// Accepted date formats for the index column.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y-%m-%d %H:%M:%S", "%m/%d/%Y"];

#[derive(Debug, Default)]
pub struct CsvBackupSheet;

impl CsvBackupSheet {
    pub fn new() -> Self {
        Self
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(value, fmt)
            .ok()
            .or_else(|| {
                chrono::NaiveDateTime::parse_from_str(value, fmt)
                    .ok()
                    .map(|dt| dt.date())
            })
    })
}

fn parse_price(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|p| p.is_finite() && *p > 0.0)
}

impl BackupLoader for CsvBackupSheet {
    fn load(&self, path: &Path, tickers: &[String]) -> Result<PriceSeries, MarkowitzError> {
        let content = fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => MarkowitzError::BackupNotFound {
                path: path.display().to_string(),
            },
            _ => MarkowitzError::Io(e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr
            .headers()
            .map_err(|e| MarkowitzError::DataUnavailable {
                reason: format!("CSV header error in {}: {}", path.display(), e),
            })?
            .clone();

        let columns = tickers
            .iter()
            .map(|t| {
                headers
                    .iter()
                    .skip(1)
                    .position(|h| h.trim().eq_ignore_ascii_case(t))
                    .map(|i| i + 1)
                    .ok_or_else(|| MarkowitzError::DataUnavailable {
                        reason: format!("{} has no column for {}", path.display(), t),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut by_date: BTreeMap<NaiveDate, Vec<f64>> = BTreeMap::new();
        let mut dropped = 0usize;
        for result in rdr.records() {
            let record = result.map_err(|e| MarkowitzError::DataUnavailable {
                reason: format!("CSV parse error: {}", e),
            })?;

            let Some(date) = record.get(0).and_then(parse_date) else {
                dropped += 1;
                continue;
            };

            let row: Option<Vec<f64>> = columns
                .iter()
                .map(|&i| record.get(i).and_then(parse_price))
                .collect();

            match row {
                Some(values) => {
                    if by_date.insert(date, values).is_some() {
                        warn!("duplicate date {} in {}, keeping last", date, path.display());
                    }
                }
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            debug!("dropped {} incomplete rows from {}", dropped, path.display());
        }

        let (dates, rows) = by_date.into_iter().unzip();
        PriceSeries::new(tickers.to_vec(), dates, rows)
    }
}
