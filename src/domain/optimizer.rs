//! Closed-form Markowitz solvers.
//!
//! Two allocations are supported:
//!
//! - [`min_risk_weights`]: the global minimum-variance portfolio
//!   `Σ⁻¹·1 / (1ᵗ·Σ⁻¹·1)`, projected to long-only and renormalised so the
//!   weights sum to 1.
//! - [`target_return_weights`]: `Σ⁻¹·pBar · U / (pBarᵗ·Σ⁻¹·pBar)`, clamped
//!   to long-only but *not* renormalised. The weight sum is the capital
//!   multiplier needed to reach `U`; no upper bound on it is enforced.

use crate::domain::error::MarkowitzError;
use crate::domain::linalg::checked_inverse;
use nalgebra::{DMatrix, DVector};

/// Below this magnitude `pBarᵗ·Σ⁻¹·pBar` is treated as zero.
pub const DEGENERATE_SCALE_TOLERANCE: f64 = 1e-18;

/// Which closed-form solver to run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SolveMethod {
    MinRisk,
    /// Per-period target return, in the same granularity as pBar.
    TargetReturn(f64),
}

/// Unconstrained minimum-variance weights (may contain negatives).
pub fn min_risk_raw_weights(covariance: &DMatrix<f64>) -> Result<DVector<f64>, MarkowitzError> {
    let inverse = checked_inverse(covariance)?;
    let total = inverse.sum();
    if !total.is_finite() || total == 0.0 {
        return Err(MarkowitzError::SingularCovariance {
            reason: format!("sum of inverse entries is {}", total),
        });
    }

    let row_sums = DVector::from_iterator(
        inverse.nrows(),
        inverse.row_iter().map(|row| row.sum()),
    );
    Ok(row_sums / total)
}

/// Long-only minimum-variance weights summing to 1.
pub fn min_risk_weights(covariance: &DMatrix<f64>) -> Result<DVector<f64>, MarkowitzError> {
    let clamped = clamp_negative(&min_risk_raw_weights(covariance)?);
    let sum = clamped.sum();
    if sum <= 0.0 {
        return Err(MarkowitzError::AllocationInfeasible);
    }
    Ok(clamped / sum)
}

/// Target-return weights before the long-only clamp.
///
/// Linear in `target`: doubling it doubles every entry.
pub fn target_return_raw_weights(
    mean_returns: &DVector<f64>,
    covariance: &DMatrix<f64>,
    target: f64,
) -> Result<DVector<f64>, MarkowitzError> {
    if mean_returns.len() != covariance.nrows() {
        return Err(MarkowitzError::DimensionMismatch {
            expected: covariance.nrows(),
            actual: mean_returns.len(),
        });
    }

    let inverse = checked_inverse(covariance)?;
    let direction = &inverse * mean_returns;
    let scale = mean_returns.dot(&direction);
    if !scale.is_finite() || scale.abs() <= DEGENERATE_SCALE_TOLERANCE {
        return Err(MarkowitzError::DegenerateReturnModel { scale });
    }

    Ok(direction * (target / scale))
}

/// Long-only target-return weights. The sum is not normalised.
pub fn target_return_weights(
    mean_returns: &DVector<f64>,
    covariance: &DMatrix<f64>,
    target: f64,
) -> Result<DVector<f64>, MarkowitzError> {
    let raw = target_return_raw_weights(mean_returns, covariance, target)?;
    Ok(clamp_negative(&raw))
}

/// Converts an annual return (fraction) to the compounded per-period rate.
pub fn annual_to_period_return(annual: f64, periods_per_year: f64) -> f64 {
    (1.0 + annual).powf(1.0 / periods_per_year) - 1.0
}

fn clamp_negative(weights: &DVector<f64>) -> DVector<f64> {
    weights.map(|w| w.max(0.0))
}
