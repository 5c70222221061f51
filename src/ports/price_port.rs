//! Price source port traits.

use crate::domain::error::MarkowitzError;
use crate::domain::price_series::PriceSeries;
use chrono::NaiveDate;
use std::path::Path;

/// Primary price source, e.g. a market-data provider.
pub trait PriceRetriever {
    /// Aligned adjusted closes for `tickers` between `start_date` and
    /// `end_date` inclusive, columns in `tickers` order.
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarkowitzError>;
}

/// File-based fallback used once the retriever is exhausted.
pub trait BackupLoader {
    /// Loads the requested tickers from a date-indexed backup sheet.
    /// A missing file is reported as [`MarkowitzError::BackupNotFound`].
    fn load(&self, path: &Path, tickers: &[String]) -> Result<PriceSeries, MarkowitzError>;
}
