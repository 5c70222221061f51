//! Ticker-labelled allocation table.

use crate::domain::error::MarkowitzError;
use nalgebra::DVector;

#[derive(Debug, Clone, PartialEq)]
pub struct AllocationRow {
    pub ticker: String,
    pub weight: f64,
}

impl AllocationRow {
    /// Weight as a percentage rounded to 2 decimal places.
    pub fn percentage(&self) -> f64 {
        round_to(self.weight * 100.0, 2)
    }
}

/// Weights paired with their tickers, in asset order.
#[derive(Debug, Clone, PartialEq)]
pub struct AllocationTable {
    rows: Vec<AllocationRow>,
}

impl AllocationTable {
    pub fn from_weights(
        tickers: &[String],
        weights: &DVector<f64>,
    ) -> Result<Self, MarkowitzError> {
        if tickers.len() != weights.len() {
            return Err(MarkowitzError::DimensionMismatch {
                expected: tickers.len(),
                actual: weights.len(),
            });
        }

        let rows = tickers
            .iter()
            .zip(weights.iter())
            .map(|(ticker, &weight)| AllocationRow {
                ticker: ticker.clone(),
                weight,
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[AllocationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn weight(&self, ticker: &str) -> Option<f64> {
        self.rows
            .iter()
            .find(|r| r.ticker == ticker)
            .map(|r| r.weight)
    }

    pub fn weights(&self) -> DVector<f64> {
        DVector::from_iterator(self.rows.len(), self.rows.iter().map(|r| r.weight))
    }

    /// `(ticker, percentage)` pairs with percentages rounded to 2 decimals.
    pub fn percentages(&self) -> Vec<(String, f64)> {
        self.rows
            .iter()
            .map(|r| (r.ticker.clone(), r.percentage()))
            .collect()
    }

    pub fn weight_sum(&self) -> f64 {
        self.rows.iter().map(|r| r.weight).sum()
    }

    /// Capital needed to hold this allocation when `capital` funds a
    /// fully-invested portfolio. Equals `capital` for weights summing to 1.
    pub fn required_capital(&self, capital: f64) -> f64 {
        self.weight_sum() * capital
    }
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tickers() -> Vec<String> {
        vec!["AAPL".into(), "JNJ".into(), "KO".into()]
    }

    #[test]
    fn from_weights_pairs_in_order() {
        let w = DVector::from_vec(vec![0.5, 0.3, 0.2]);
        let table = AllocationTable::from_weights(&tickers(), &w).unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[0].ticker, "AAPL");
        assert_eq!(table.rows()[2].ticker, "KO");
        assert_eq!(table.weight("JNJ"), Some(0.3));
        assert_eq!(table.weight("XOM"), None);
        assert_eq!(table.weights(), w);
    }

    #[test]
    fn from_weights_rejects_length_mismatch() {
        let w = DVector::from_vec(vec![0.5, 0.5]);
        let result = AllocationTable::from_weights(&tickers(), &w);
        assert!(matches!(
            result,
            Err(MarkowitzError::DimensionMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn percentages_round_to_two_decimals() {
        let w = DVector::from_vec(vec![8.0 / 11.0, 3.0 / 11.0, 0.0]);
        let table = AllocationTable::from_weights(&tickers(), &w).unwrap();
        let pct = table.percentages();

        assert_eq!(pct[0], ("AAPL".to_string(), 72.73));
        assert_eq!(pct[1], ("JNJ".to_string(), 27.27));
        assert_eq!(pct[2], ("KO".to_string(), 0.0));
    }

    #[test]
    fn required_capital_scales_with_weight_sum() {
        let w = DVector::from_vec(vec![0.9, 0.6, 0.0]);
        let table = AllocationTable::from_weights(&tickers(), &w).unwrap();

        assert!((table.weight_sum() - 1.5).abs() < 1e-12);
        assert!((table.required_capital(10_000.0) - 15_000.0).abs() < 1e-9);
    }
}
