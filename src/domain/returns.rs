//! Log returns and their first two moments.

use crate::domain::error::MarkowitzError;
use crate::domain::price_series::PriceSeries;
use nalgebra::{DMatrix, DVector};

/// `ln(P_t / P_{t-1})` for every asset; one row fewer than the prices.
#[derive(Debug, Clone, PartialEq)]
pub struct ReturnSeries {
    values: DMatrix<f64>,
}

impl ReturnSeries {
    pub fn from_prices(prices: &PriceSeries) -> Self {
        let rows = prices.rows();
        let n_obs = rows.len().saturating_sub(1);
        let n_assets = prices.asset_count();

        let values = DMatrix::from_fn(n_obs, n_assets, |t, j| {
            (rows[t + 1][j] / rows[t][j]).ln()
        });
        Self { values }
    }

    pub fn observations(&self) -> usize {
        self.values.nrows()
    }

    pub fn asset_count(&self) -> usize {
        self.values.ncols()
    }

    /// Observations × assets.
    pub fn values(&self) -> &DMatrix<f64> {
        &self.values
    }

    /// Arithmetic mean of each asset's returns (pBar).
    pub fn mean(&self) -> DVector<f64> {
        let n = self.observations() as f64;
        DVector::from_iterator(
            self.asset_count(),
            self.values.column_iter().map(|c| c.sum() / n),
        )
    }

    /// Sample covariance of the returns, normalised by `T - 1`.
    pub fn covariance(&self) -> Result<DMatrix<f64>, MarkowitzError> {
        let t = self.observations();
        if t < 2 {
            return Err(MarkowitzError::InsufficientData {
                observations: t,
                assets: self.asset_count(),
            });
        }

        let mean = self.mean();
        let mut centered = self.values.clone();
        for (j, mut col) in centered.column_iter_mut().enumerate() {
            col.add_scalar_mut(-mean[j]);
        }

        let cov = centered.transpose() * &centered / (t as f64 - 1.0);
        // Symmetrise away rounding noise from the product.
        Ok((&cov + cov.transpose()) * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    fn prices(rows: Vec<Vec<f64>>) -> PriceSeries {
        let n = rows[0].len();
        let tickers = (0..n).map(|i| format!("T{}", i)).collect();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let dates = (0..rows.len())
            .map(|i| start + chrono::Duration::days(i as i64))
            .collect();
        PriceSeries::new(tickers, dates, rows).unwrap()
    }

    #[test]
    fn log_returns_drop_first_row() {
        let p = prices(vec![vec![100.0], vec![110.0], vec![99.0]]);
        let r = ReturnSeries::from_prices(&p);

        assert_eq!(r.observations(), 2);
        assert_relative_eq!(r.values()[(0, 0)], (1.1f64).ln(), epsilon = 1e-15);
        assert_relative_eq!(r.values()[(1, 0)], (0.9f64).ln(), epsilon = 1e-15);
    }

    #[test]
    fn mean_is_per_asset() {
        let p = prices(vec![
            vec![100.0, 50.0],
            vec![110.0, 50.0],
            vec![121.0, 55.0],
        ]);
        let r = ReturnSeries::from_prices(&p);
        let mean = r.mean();

        assert_relative_eq!(mean[0], (1.1f64).ln(), epsilon = 1e-12);
        assert_relative_eq!(mean[1], (1.1f64).ln() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn covariance_matches_sample_estimator() {
        // returns: a = [ln 2, 0, ln 2], b = [0, ln 2, ln 2]
        let p = prices(vec![
            vec![1.0, 1.0],
            vec![2.0, 1.0],
            vec![2.0, 2.0],
            vec![4.0, 4.0],
        ]);
        let r = ReturnSeries::from_prices(&p);
        let cov = r.covariance().unwrap();
        let l = (2.0f64).ln();

        // mean = 2l/3 for both; deviations a = [l/3, -2l/3, l/3], b = [-2l/3, l/3, l/3]
        let var = (l * l / 9.0 + 4.0 * l * l / 9.0 + l * l / 9.0) / 2.0;
        let cv = (-2.0 * l * l / 9.0 - 2.0 * l * l / 9.0 + l * l / 9.0) / 2.0;
        assert_relative_eq!(cov[(0, 0)], var, epsilon = 1e-12);
        assert_relative_eq!(cov[(1, 1)], var, epsilon = 1e-12);
        assert_relative_eq!(cov[(0, 1)], cv, epsilon = 1e-12);
        assert_eq!(cov[(0, 1)], cov[(1, 0)]);
    }

    #[test]
    fn covariance_needs_two_observations() {
        let p = prices(vec![vec![100.0], vec![101.0]]);
        let r = ReturnSeries::from_prices(&p);
        assert!(matches!(
            r.covariance(),
            Err(MarkowitzError::InsufficientData {
                observations: 1,
                assets: 1
            })
        ));
    }
}
