//! Per-ticker CSV price directory.
//!
//! Reads `<base_path>/<TICKER>.csv` files with a `date` column and a close
//! column (`adj_close` when present, otherwise `close`), then aligns all
//! requested tickers on their shared dates.

use crate::domain::error::MarkowitzError;
use crate::domain::price_series::{PriceSeries, TickerCloses, align_closes};
use crate::ports::price_port::PriceRetriever;
use chrono::NaiveDate;
use log::debug;
use std::fs;
use std::path::PathBuf;

pub struct CsvPriceDirectory {
    base_path: PathBuf,
}

impl CsvPriceDirectory {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, ticker: &str) -> PathBuf {
        self.base_path.join(format!("{}.csv", ticker))
    }

    fn read_closes(
        &self,
        ticker: &str,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<TickerCloses, MarkowitzError> {
        let path = self.csv_path(ticker);
        let content = fs::read_to_string(&path).map_err(|e| MarkowitzError::PriceSource {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let headers = rdr.headers().map_err(|e| MarkowitzError::PriceSource {
            reason: format!("CSV header error in {}: {}", path.display(), e),
        })?;
        let close_idx = find_column(headers, "adj_close")
            .or_else(|| find_column(headers, "close"))
            .ok_or_else(|| MarkowitzError::PriceSource {
                reason: format!("{} has no close column", path.display()),
            })?;

        let mut closes = Vec::new();
        let mut skipped = 0usize;
        for result in rdr.records() {
            let record = result.map_err(|e| MarkowitzError::PriceSource {
                reason: format!("CSV parse error: {}", e),
            })?;

            let date_str = record.get(0).ok_or_else(|| MarkowitzError::PriceSource {
                reason: "missing date column".into(),
            })?;
            let date = NaiveDate::parse_from_str(date_str.trim(), "%Y-%m-%d").map_err(|e| {
                MarkowitzError::PriceSource {
                    reason: format!("invalid date format: {}", e),
                }
            })?;

            if date < start_date || date > end_date {
                continue;
            }

            // Blank or unparsable cells drop the date during alignment.
            match record
                .get(close_idx)
                .and_then(|v| v.trim().parse::<f64>().ok())
            {
                Some(close) => closes.push((date, close)),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            debug!("{}: skipped {} missing closes", ticker, skipped);
        }
        debug!("{}: {} closes from {}", ticker, closes.len(), path.display());
        Ok(TickerCloses::new(ticker, closes))
    }
}

fn find_column(headers: &csv::StringRecord, name: &str) -> Option<usize> {
    headers
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case(name))
}

impl PriceRetriever for CsvPriceDirectory {
    fn fetch_prices(
        &self,
        tickers: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<PriceSeries, MarkowitzError> {
        let series = tickers
            .iter()
            .map(|t| self.read_closes(t, start_date, end_date))
            .collect::<Result<Vec<_>, _>>()?;
        align_closes(&series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup_test_data() -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_path_buf();

        fs::write(
            path.join("AAPL.csv"),
            "date,open,high,low,close,adj_close,volume\n\
            2024-01-15,100.0,110.0,90.0,105.0,104.0,50000\n\
            2024-01-16,105.0,115.0,100.0,110.0,109.0,60000\n\
            2024-01-17,110.0,120.0,105.0,115.0,114.0,55000\n",
        )
        .unwrap();
        fs::write(
            path.join("KO.csv"),
            "date,close\n\
            2024-01-17,61.0\n\
            2024-01-15,60.0\n",
        )
        .unwrap();
        fs::write(path.join("BAD.csv"), "date,close\n2024-01-15,abc\n").unwrap();

        (dir, path)
    }

    fn d(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[test]
    fn fetch_prefers_adjusted_close() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceDirectory::new(path);

        let prices = adapter
            .fetch_prices(&["AAPL".to_string()], d(15), d(17))
            .unwrap();

        assert_eq!(prices.row_count(), 3);
        assert_eq!(prices.column("AAPL"), Some(vec![104.0, 109.0, 114.0]));
    }

    #[test]
    fn fetch_aligns_tickers_on_shared_dates() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceDirectory::new(path);

        let prices = adapter
            .fetch_prices(&["KO".to_string(), "AAPL".to_string()], d(1), d(31))
            .unwrap();

        assert_eq!(prices.tickers(), &["KO".to_string(), "AAPL".to_string()]);
        assert_eq!(prices.dates(), &[d(15), d(17)]);
        assert_eq!(prices.rows(), &[vec![60.0, 104.0], vec![61.0, 114.0]]);
    }

    #[test]
    fn fetch_filters_by_date() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceDirectory::new(path);

        let prices = adapter
            .fetch_prices(&["AAPL".to_string()], d(16), d(16))
            .unwrap();

        assert_eq!(prices.dates(), &[d(16)]);
    }

    #[test]
    fn fetch_errors_for_missing_file() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceDirectory::new(path);

        let result = adapter.fetch_prices(&["XYZ".to_string()], d(1), d(31));
        assert!(matches!(result, Err(MarkowitzError::PriceSource { .. })));
    }

    #[test]
    fn fetch_skips_unparsable_close() {
        let (_dir, path) = setup_test_data();
        let adapter = CsvPriceDirectory::new(path);

        let prices = adapter
            .fetch_prices(&["BAD".to_string()], d(1), d(31))
            .unwrap();
        assert!(prices.is_empty());
    }

    #[test]
    fn fetch_drops_dates_with_blank_close() {
        let (_dir, path) = setup_test_data();
        fs::write(
            path.join("GAP.csv"),
            "date,close\n2024-01-15,100.0\n2024-01-16,\n2024-01-17,102.0\n",
        )
        .unwrap();
        let adapter = CsvPriceDirectory::new(path);

        let prices = adapter
            .fetch_prices(&["GAP".to_string(), "AAPL".to_string()], d(1), d(31))
            .unwrap();

        assert_eq!(prices.dates(), &[d(15), d(17)]);
        assert_eq!(prices.rows(), &[vec![100.0, 104.0], vec![102.0, 114.0]]);
    }

    #[test]
    fn fetch_errors_without_close_column() {
        let (_dir, path) = setup_test_data();
        fs::write(path.join("NOCLOSE.csv"), "date,open\n2024-01-15,1.0\n").unwrap();
        let adapter = CsvPriceDirectory::new(path);

        let result = adapter.fetch_prices(&["NOCLOSE".to_string()], d(1), d(31));
        assert!(matches!(result, Err(MarkowitzError::PriceSource { .. })));
    }
}
