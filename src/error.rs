use thiserror::Error;

/// Convenience alias for results produced by this crate
pub type Result<T, E = PairError> = core::result::Result<T, E>;

/// Top level error of the pair statistics engine
///
/// Errors are split by origin so that callers can tell degenerate input apart from a
/// numerically failed statistic or a bad run configuration. All variants are cheap to
/// clone, which lets a memoized statistic hand out its failure on every access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PairError {
    /// Misaligned, too short or degenerate input series
    #[error(transparent)]
    Data(#[from] DataError),
    /// Singular regression, zero variance or a non-finite test statistic
    #[error(transparent)]
    Numerical(#[from] NumericalError),
    /// Invalid thresholds or window lengths
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Problems with the shape or content of the input series
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    /// The two series (or the timestamps) do not have the same length
    #[error("series lengths differ: {left} vs {right}")]
    LengthMismatch {
        /// Length of the first sequence
        left: usize,
        /// Length of the second sequence
        right: usize,
    },
    /// Fewer observations than the computation needs
    #[error("need at least {required} observations, got {actual}")]
    TooShort {
        /// Minimum number of observations
        required: usize,
        /// Number of observations supplied
        actual: usize,
    },
    /// Timestamps are not strictly increasing
    #[error("timestamps must be strictly increasing, violated at position {index}")]
    UnorderedTimestamps {
        /// Position of the first out of order timestamp
        index: usize,
    },
    /// A series contains NaN or an infinity
    #[error("non-finite value at position {index}")]
    NonFinite {
        /// Position of the first non-finite value
        index: usize,
    },
    /// Every observation has the same value
    #[error("series is constant")]
    Constant,
    /// The regressor is the zero vector
    #[error("regressor is identically zero")]
    ZeroRegressor,
}

/// Failures of an individual numerical routine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NumericalError {
    /// The regression design matrix is rank deficient
    #[error("regression design matrix is singular")]
    SingularDesign,
    /// Not enough observations for the number of regression parameters
    #[error("{observations} observations cannot identify {parameters} parameters")]
    Underdetermined {
        /// Number of observations
        observations: usize,
        /// Number of parameters
        parameters: usize,
    },
    /// A standard deviation is zero so the statistic is undefined
    #[error("zero variance")]
    ZeroVariance,
    /// The two series are (almost) perfectly collinear
    #[error("series are collinear (r-squared {r_squared})")]
    Collinear {
        /// Coefficient of determination of the cointegrating regression
        r_squared: f64,
    },
    /// A computation produced NaN or an infinity
    #[error("computation produced a non-finite value")]
    NonFinite,
}

/// Invalid configuration, raised when a component is constructed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Window length below the two observations a regression needs
    #[error("window length must be at least 2, got {0}")]
    WindowLength(usize),
    /// Rolling z-score window that is zero or larger than the evaluated window
    #[error("rolling window {window} is invalid for {len} observations")]
    RollingWindow {
        /// Requested rolling window
        window: usize,
        /// Observations available
        len: usize,
    },
    /// Significance level outside (0, 1)
    #[error("significance level must lie in (0, 1), got {0}")]
    Significance(f64),
    /// A screening threshold is out of range
    #[error("invalid threshold `{name}`: {value}")]
    Threshold {
        /// Name of the threshold
        name: &'static str,
        /// Offending value
        value: f64,
    },
    /// A configuration document could not be parsed
    #[error("failed to parse configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}
