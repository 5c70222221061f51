//! Portfolio model: price history in, immutable return moments, solvers and
//! risk/return evaluators out.

use crate::domain::allocation::AllocationTable;
use crate::domain::error::MarkowitzError;
use crate::domain::optimizer::{self, SolveMethod};
use crate::domain::price_series::PriceSeries;
use crate::domain::retry::{PriceRequest, PriceSource, RetryPolicy, Sleeper, acquire_prices};
use crate::domain::returns::ReturnSeries;
use crate::ports::price_port::{BackupLoader, PriceRetriever};
use chrono::NaiveDate;
use log::debug;
use nalgebra::{DMatrix, DVector};
use std::path::PathBuf;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;

/// What to load and how to evaluate it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub tickers: Vec<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub backup_path: PathBuf,
    /// Per-period target return used by [`PortfolioModel::target_return_weights`].
    pub target_return: f64,
    /// Annual risk-free rate, used only for the Sharpe ratio.
    pub risk_free_rate: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PortfolioMetrics {
    pub annual_return: f64,
    pub volatility: f64,
    pub variance: f64,
    pub sharpe_ratio: f64,
}

/// Moments are computed once at construction and never change, so every
/// solver call on the same model returns the same weights.
#[derive(Debug, Clone)]
pub struct PortfolioModel {
    tickers: Vec<String>,
    prices: Option<PriceSeries>,
    returns: Option<ReturnSeries>,
    mean_returns: DVector<f64>,
    covariance: DMatrix<f64>,
    default_weights: DVector<f64>,
    target_return: f64,
    risk_free_rate: f64,
}

impl PortfolioModel {
    /// Acquires prices (retriever with retries, then backup) and builds the
    /// model from them.
    pub fn load(
        request: &ModelRequest,
        retriever: &dyn PriceRetriever,
        backup: &dyn BackupLoader,
        policy: &RetryPolicy,
        sleeper: &dyn Sleeper,
    ) -> Result<(Self, PriceSource), MarkowitzError> {
        if request.tickers.is_empty() {
            return Err(MarkowitzError::DataUnavailable {
                reason: "no tickers requested".into(),
            });
        }

        let price_request = PriceRequest {
            tickers: &request.tickers,
            start_date: request.start_date,
            end_date: request.end_date,
            backup_path: &request.backup_path,
        };
        let (prices, source) = acquire_prices(&price_request, retriever, backup, policy, sleeper)?;
        let model = Self::from_prices(prices, request.target_return, request.risk_free_rate)?;
        Ok((model, source))
    }

    /// Builds moments from aligned prices. Requires at least as many return
    /// observations as assets (and at least 2). With exactly as many, the
    /// sample covariance has rank at most `n - 1`, so construction succeeds
    /// but the solvers report `SingularCovariance`.
    pub fn from_prices(
        prices: PriceSeries,
        target_return: f64,
        risk_free_rate: f64,
    ) -> Result<Self, MarkowitzError> {
        if prices.asset_count() == 0 {
            return Err(MarkowitzError::DataUnavailable {
                reason: "price matrix has no assets".into(),
            });
        }
        if prices.row_count() == 0 {
            return Err(MarkowitzError::DataUnavailable {
                reason: "price matrix has no rows after alignment".into(),
            });
        }

        let returns = ReturnSeries::from_prices(&prices);
        let n = returns.asset_count();
        let t = returns.observations();
        if t < n || t < 2 {
            return Err(MarkowitzError::InsufficientData {
                observations: t,
                assets: n,
            });
        }

        let mean_returns = returns.mean();
        let covariance = returns.covariance()?;
        debug!(
            "model built: {} assets, {} return observations, mean {:?}",
            n,
            t,
            mean_returns.as_slice()
        );

        Ok(Self {
            tickers: prices.tickers().to_vec(),
            default_weights: DVector::from_element(n, 1.0 / n as f64),
            prices: Some(prices),
            returns: Some(returns),
            mean_returns,
            covariance,
            target_return,
            risk_free_rate,
        })
    }

    /// Builds a model from already-estimated moments (no price history).
    pub fn from_moments(
        tickers: Vec<String>,
        mean_returns: DVector<f64>,
        covariance: DMatrix<f64>,
        target_return: f64,
        risk_free_rate: f64,
    ) -> Result<Self, MarkowitzError> {
        let n = tickers.len();
        if n == 0 {
            return Err(MarkowitzError::DataUnavailable {
                reason: "no tickers".into(),
            });
        }
        if mean_returns.len() != n {
            return Err(MarkowitzError::DimensionMismatch {
                expected: n,
                actual: mean_returns.len(),
            });
        }
        if covariance.nrows() != n || covariance.ncols() != n {
            return Err(MarkowitzError::DimensionMismatch {
                expected: n,
                actual: if covariance.nrows() != n {
                    covariance.nrows()
                } else {
                    covariance.ncols()
                },
            });
        }

        Ok(Self {
            tickers,
            prices: None,
            returns: None,
            default_weights: DVector::from_element(n, 1.0 / n as f64),
            mean_returns,
            covariance,
            target_return,
            risk_free_rate,
        })
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn asset_count(&self) -> usize {
        self.tickers.len()
    }

    pub fn prices(&self) -> Option<&PriceSeries> {
        self.prices.as_ref()
    }

    pub fn returns(&self) -> Option<&ReturnSeries> {
        self.returns.as_ref()
    }

    /// pBar, per period.
    pub fn mean_returns(&self) -> &DVector<f64> {
        &self.mean_returns
    }

    /// Sigma, per period.
    pub fn covariance(&self) -> &DMatrix<f64> {
        &self.covariance
    }

    pub fn default_weights(&self) -> &DVector<f64> {
        &self.default_weights
    }

    pub fn target_return(&self) -> f64 {
        self.target_return
    }

    pub fn risk_free_rate(&self) -> f64 {
        self.risk_free_rate
    }

    /// Long-only global minimum-variance weights, summing to 1.
    pub fn min_risk_weights(&self) -> Result<DVector<f64>, MarkowitzError> {
        optimizer::min_risk_weights(&self.covariance)
    }

    /// Long-only weights reaching per-period return `target`; the sum is a
    /// capital multiplier and is not normalised.
    pub fn target_return_weights(&self, target: f64) -> Result<DVector<f64>, MarkowitzError> {
        optimizer::target_return_weights(&self.mean_returns, &self.covariance, target)
    }

    pub fn solve(&self, method: SolveMethod) -> Result<DVector<f64>, MarkowitzError> {
        match method {
            SolveMethod::MinRisk => self.min_risk_weights(),
            SolveMethod::TargetReturn(u) => self.target_return_weights(u),
        }
    }

    /// Runs `method` and labels the weights. Every call builds a new table.
    pub fn allocation(&self, method: SolveMethod) -> Result<AllocationTable, MarkowitzError> {
        let weights = self.solve(method)?;
        AllocationTable::from_weights(&self.tickers, &weights)
    }

    /// `252 · Σ pBar_i w_i`
    pub fn portfolio_return(&self, weights: &DVector<f64>) -> Result<f64, MarkowitzError> {
        self.check_len(weights)?;
        Ok(self.mean_returns.dot(weights) * TRADING_DAYS_PER_YEAR)
    }

    /// Annualised variance `252 · wᵗΣw`. Take the square root for volatility.
    pub fn risk(&self, weights: &DVector<f64>) -> Result<f64, MarkowitzError> {
        self.check_len(weights)?;
        Ok(weights.dot(&(&self.covariance * weights)) * TRADING_DAYS_PER_YEAR)
    }

    /// Annual return and volatility.
    pub fn performance(&self, weights: &DVector<f64>) -> Result<(f64, f64), MarkowitzError> {
        let ret = self.portfolio_return(weights)?;
        let vol = self.risk(weights)?.max(0.0).sqrt();
        Ok((ret, vol))
    }

    /// Metrics of the uniform `1/n` portfolio.
    pub fn calculate_metrics(&self) -> Result<PortfolioMetrics, MarkowitzError> {
        self.metrics_for(&self.default_weights)
    }

    pub fn metrics_for(&self, weights: &DVector<f64>) -> Result<PortfolioMetrics, MarkowitzError> {
        let variance = self.risk(weights)?;
        let annual_return = self.portfolio_return(weights)?;
        let volatility = variance.max(0.0).sqrt();
        if volatility == 0.0 {
            return Err(MarkowitzError::ZeroVolatility);
        }

        Ok(PortfolioMetrics {
            annual_return,
            volatility,
            variance,
            sharpe_ratio: (annual_return - self.risk_free_rate) / volatility,
        })
    }

    fn check_len(&self, weights: &DVector<f64>) -> Result<(), MarkowitzError> {
        if weights.len() != self.asset_count() {
            return Err(MarkowitzError::DimensionMismatch {
                expected: self.asset_count(),
                actual: weights.len(),
            });
        }
        Ok(())
    }
}
