//! Covariance inversion with an explicit conditioning check.

use crate::domain::error::MarkowitzError;
use nalgebra::DMatrix;

/// Largest condition number (ratio of extreme singular values) accepted
/// before a covariance matrix is treated as singular.
pub const MAX_CONDITION_NUMBER: f64 = 1e12;

/// Ratio of largest to smallest singular value. `f64::INFINITY` when the
/// smallest singular value is zero.
pub fn condition_number(matrix: &DMatrix<f64>) -> f64 {
    let sv = matrix.clone().singular_values();
    let max = sv.max();
    let min = sv.min();
    if min <= 0.0 {
        f64::INFINITY
    } else {
        max / min
    }
}

/// Inverts a square covariance matrix, refusing ill-conditioned input
/// instead of letting NaN or huge entries leak into weights.
pub fn checked_inverse(matrix: &DMatrix<f64>) -> Result<DMatrix<f64>, MarkowitzError> {
    if !matrix.is_square() {
        return Err(MarkowitzError::DimensionMismatch {
            expected: matrix.nrows(),
            actual: matrix.ncols(),
        });
    }
    if matrix.is_empty() {
        return Err(MarkowitzError::SingularCovariance {
            reason: "matrix is empty".into(),
        });
    }
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(MarkowitzError::SingularCovariance {
            reason: "matrix has non-finite entries".into(),
        });
    }

    let cond = condition_number(matrix);
    if !cond.is_finite() || cond > MAX_CONDITION_NUMBER {
        return Err(MarkowitzError::SingularCovariance {
            reason: format!("condition number {:e} exceeds {:e}", cond, MAX_CONDITION_NUMBER),
        });
    }

    let inverse = matrix
        .clone()
        .try_inverse()
        .ok_or_else(|| MarkowitzError::SingularCovariance {
            reason: "LU decomposition failed".into(),
        })?;

    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(MarkowitzError::SingularCovariance {
            reason: "inverse has non-finite entries".into(),
        });
    }
    Ok(inverse)
}
