//! Domain error types.

/// Top-level error type for markowitz.
#[derive(Debug, thiserror::Error)]
pub enum MarkowitzError {
    #[error("price data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("backup price file not found: {path}")]
    BackupNotFound { path: String },

    #[error("price source error: {reason}")]
    PriceSource { reason: String },

    #[error("insufficient data: have {observations} return observations for {assets} assets")]
    InsufficientData { observations: usize, assets: usize },

    #[error("covariance matrix is singular: {reason}")]
    SingularCovariance { reason: String },

    #[error("degenerate return model: pBar' * inv(Sigma) * pBar = {scale:e}")]
    DegenerateReturnModel { scale: f64 },

    #[error("no valid long-only allocation: every minimum-variance weight is non-positive")]
    AllocationInfeasible,

    #[error("portfolio volatility is zero, Sharpe ratio is undefined")]
    ZeroVolatility,

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&MarkowitzError> for std::process::ExitCode {
    fn from(err: &MarkowitzError) -> Self {
        let code: u8 = match err {
            MarkowitzError::Io(_) => 1,
            MarkowitzError::ConfigParse { .. }
            | MarkowitzError::ConfigMissing { .. }
            | MarkowitzError::ConfigInvalid { .. } => 2,
            MarkowitzError::DataUnavailable { .. }
            | MarkowitzError::BackupNotFound { .. }
            | MarkowitzError::PriceSource { .. } => 3,
            MarkowitzError::InsufficientData { .. } => 4,
            MarkowitzError::SingularCovariance { .. } => 5,
            MarkowitzError::DegenerateReturnModel { .. } => 6,
            MarkowitzError::AllocationInfeasible => 7,
            MarkowitzError::ZeroVolatility => 8,
            MarkowitzError::DimensionMismatch { .. } => 9,
        };
        std::process::ExitCode::from(code)
    }
}
