#![allow(dead_code)]

use chrono::NaiveDate;
use markowitz::domain::error::MarkowitzError;
use markowitz::domain::model::ModelRequest;
use markowitz::domain::price_series::PriceSeries;
use markowitz::domain::retry::Sleeper;
use markowitz::ports::price_port::{BackupLoader, PriceRetriever};
use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Retriever that fails a fixed number of times before answering.
pub struct MockPriceRetriever {
    pub prices: Option<PriceSeries>,
    pub failures_before_success: u32,
    pub calls: Cell<u32>,
}

impl MockPriceRetriever {
    pub fn returning(prices: PriceSeries) -> Self {
        Self {
            prices: Some(prices),
            failures_before_success: 0,
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            prices: None,
            failures_before_success: u32::MAX,
            calls: Cell::new(0),
        }
    }

    pub fn with_failures(mut self, n: u32) -> Self {
        self.failures_before_success = n;
        self
    }
}

impl PriceRetriever for MockPriceRetriever {
    fn fetch_prices(
        &self,
        _tickers: &[String],
        _start_date: NaiveDate,
        _end_date: NaiveDate,
    ) -> Result<PriceSeries, MarkowitzError> {
        let call = self.calls.get();
        self.calls.set(call + 1);
        match &self.prices {
            Some(p) if call >= self.failures_before_success => Ok(p.clone()),
            _ => Err(MarkowitzError::PriceSource {
                reason: "connection reset".into(),
            }),
        }
    }
}

pub struct MockBackup {
    pub prices: Option<PriceSeries>,
    pub calls: Cell<u32>,
}

impl MockBackup {
    pub fn with(prices: PriceSeries) -> Self {
        Self {
            prices: Some(prices),
            calls: Cell::new(0),
        }
    }

    pub fn missing() -> Self {
        Self {
            prices: None,
            calls: Cell::new(0),
        }
    }
}

impl BackupLoader for MockBackup {
    fn load(&self, path: &Path, _tickers: &[String]) -> Result<PriceSeries, MarkowitzError> {
        self.calls.set(self.calls.get() + 1);
        self.prices
            .clone()
            .ok_or_else(|| MarkowitzError::BackupNotFound {
                path: path.display().to_string(),
            })
    }
}

#[derive(Default)]
pub struct NoSleep {
    pub requested: RefCell<Vec<Duration>>,
}

impl Sleeper for NoSleep {
    fn sleep(&self, duration: Duration) {
        self.requested.borrow_mut().push(duration);
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Deterministic, non-collinear price paths for `tickers`.
pub fn generate_prices(tickers: &[&str], days: usize) -> PriceSeries {
    let start = date(2023, 1, 2);
    let dates = (0..days)
        .map(|i| start + chrono::Duration::days(i as i64))
        .collect();
    let rows = (0..days)
        .map(|t| {
            tickers
                .iter()
                .enumerate()
                .map(|(j, _)| {
                    let k = j as f64 + 1.0;
                    let drift = 0.0004 * k * t as f64;
                    let wave = 0.03 * ((t as f64) * (0.7 + 0.37 * k)).sin()
                        + 0.02 * ((t as f64) * (1.3 / k)).cos();
                    100.0 * k * (drift + wave).exp()
                })
                .collect()
        })
        .collect();
    PriceSeries::new(
        tickers.iter().map(|t| t.to_string()).collect(),
        dates,
        rows,
    )
    .unwrap()
}

pub fn sample_request(tickers: &[&str]) -> ModelRequest {
    ModelRequest {
        tickers: tickers.iter().map(|t| t.to_string()).collect(),
        start_date: date(2023, 1, 1),
        end_date: date(2023, 12, 31),
        backup_path: PathBuf::from("stock_data.csv"),
        target_return: 0.0003,
        risk_free_rate: 0.044,
    }
}
