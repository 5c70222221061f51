//! Aligned price matrix (one row per date, one column per ticker).
//!
//! Sources deliver prices per ticker; [`align_closes`] intersects their dates
//! so every row of a [`PriceSeries`] carries one price for every ticker.

use crate::domain::error::MarkowitzError;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};

/// Closing prices for a single ticker, in any date order.
#[derive(Debug, Clone)]
pub struct TickerCloses {
    pub ticker: String,
    pub closes: Vec<(NaiveDate, f64)>,
}

impl TickerCloses {
    pub fn new(ticker: impl Into<String>, closes: Vec<(NaiveDate, f64)>) -> Self {
        Self {
            ticker: ticker.into(),
            closes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    tickers: Vec<String>,
    dates: Vec<NaiveDate>,
    rows: Vec<Vec<f64>>,
}

impl PriceSeries {
    /// Builds a price matrix from row-major data.
    ///
    /// Dates must be strictly increasing, tickers unique, and every row must
    /// hold one finite positive price per ticker.
    pub fn new(
        tickers: Vec<String>,
        dates: Vec<NaiveDate>,
        rows: Vec<Vec<f64>>,
    ) -> Result<Self, MarkowitzError> {
        let mut seen = HashSet::new();
        for ticker in &tickers {
            if !seen.insert(ticker.as_str()) {
                return Err(MarkowitzError::DataUnavailable {
                    reason: format!("duplicate ticker {}", ticker),
                });
            }
        }

        if dates.len() != rows.len() {
            return Err(MarkowitzError::DimensionMismatch {
                expected: dates.len(),
                actual: rows.len(),
            });
        }

        if let Some(w) = dates.windows(2).find(|w| w[0] >= w[1]) {
            return Err(MarkowitzError::DataUnavailable {
                reason: format!("dates not strictly increasing at {}", w[1]),
            });
        }

        for (date, row) in dates.iter().zip(&rows) {
            if row.len() != tickers.len() {
                return Err(MarkowitzError::DimensionMismatch {
                    expected: tickers.len(),
                    actual: row.len(),
                });
            }
            if let Some(p) = row.iter().find(|p| !p.is_finite() || **p <= 0.0) {
                return Err(MarkowitzError::DataUnavailable {
                    reason: format!("invalid price {} on {}", p, date),
                });
            }
        }

        Ok(Self {
            tickers,
            dates,
            rows,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> &[Vec<f64>] {
        &self.rows
    }

    pub fn asset_count(&self) -> usize {
        self.tickers.len()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty() || self.rows.is_empty()
    }

    /// Returns the prices of one ticker in date order.
    pub fn column(&self, ticker: &str) -> Option<Vec<f64>> {
        let idx = self.tickers.iter().position(|t| t == ticker)?;
        Some(self.rows.iter().map(|row| row[idx]).collect())
    }
}

/// Aligns per-ticker closes on the dates every ticker shares.
///
/// Dates missing from any ticker are dropped, as are non-positive or
/// non-finite closes. Column order follows `series`.
pub fn align_closes(series: &[TickerCloses]) -> Result<PriceSeries, MarkowitzError> {
    let mut by_ticker: Vec<BTreeMap<NaiveDate, f64>> = Vec::with_capacity(series.len());
    for s in series {
        let map = s
            .closes
            .iter()
            .filter(|(_, p)| p.is_finite() && *p > 0.0)
            .copied()
            .collect();
        by_ticker.push(map);
    }

    let dates: Vec<NaiveDate> = match by_ticker.split_first() {
        Some((first, rest)) => first
            .keys()
            .filter(|d| rest.iter().all(|m| m.contains_key(d)))
            .copied()
            .collect(),
        None => Vec::new(),
    };

    let rows = dates
        .iter()
        .map(|d| by_ticker.iter().map(|m| m[d]).collect())
        .collect();

    let tickers = series.iter().map(|s| s.ticker.clone()).collect();
    PriceSeries::new(tickers, dates, rows)
}
