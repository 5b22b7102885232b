use core::fmt;

use num_traits::Float;

use crate::PairError;

/// A statistic together with the failure that forced it onto its fallback value
///
/// Every output of [`PairStatistics`](crate::PairStatistics) is an `Estimate`. When the
/// computation succeeds the error slot is empty. When it fails the value holds the
/// documented fallback for that statistic and the error explains why, so a batch keeps
/// running while the failed unit stays distinguishable from a healthy one.
#[derive(Debug, Clone, PartialEq)]
pub struct Estimate<V> {
    value: V,
    error: Option<PairError>,
}

impl<V> Estimate<V> {
    pub(crate) fn ok(value: V) -> Self {
        Self { value, error: None }
    }

    pub(crate) fn fallback(value: V, error: impl Into<PairError>) -> Self {
        Self {
            value,
            error: Some(error.into()),
        }
    }

    pub(crate) fn from_result(result: Result<V, PairError>, fallback: impl FnOnce() -> V) -> Self {
        match result {
            Ok(value) => Self::ok(value),
            Err(err) => Self::fallback(fallback(), err),
        }
    }

    /// Returns the value by copy, which is the fallback when the computation failed
    #[inline]
    pub fn value(&self) -> V
    where
        V: Copy,
    {
        self.value
    }

    /// Returns a reference to the value
    #[inline]
    pub const fn as_value(&self) -> &V {
        &self.value
    }

    /// Consumes the estimate and returns the value
    #[inline]
    pub fn into_value(self) -> V {
        self.value
    }

    /// Returns the failure, if any
    #[inline]
    pub const fn error(&self) -> Option<&PairError> {
        self.error.as_ref()
    }

    /// Returns `true` if the value was computed without falling back
    #[inline]
    pub const fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Returns `true` if the value is a fallback
    #[inline]
    pub const fn is_fallback(&self) -> bool {
        self.error.is_some()
    }

    /// Returns the value only if it was computed successfully
    #[inline]
    pub fn ok_value(&self) -> Option<&V> {
        self.is_ok().then_some(&self.value)
    }

    /// Converts into a `Result`, discarding the fallback value on failure
    pub fn into_result(self) -> Result<V, PairError> {
        match self.error {
            None => Ok(self.value),
            Some(err) => Err(err),
        }
    }
}

/// Identifies one output of the pair statistics engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statistic {
    /// Pearson correlation of the two series
    Correlation,
    /// No-intercept OLS slope of the first series on the second
    HedgeRatio,
    /// Engle-Granger cointegration test
    Cointegration,
    /// ADF test on the spread
    Stationarity,
    /// Mean reversion half-life of the spread
    HalfLife,
    /// Full-window z-score of the spread
    ZScore,
    /// Rolling z-score of the spread
    RollingZScore,
}

impl fmt::Display for Statistic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Statistic::Correlation => "correlation",
            Statistic::HedgeRatio => "hedge ratio",
            Statistic::Cointegration => "cointegration",
            Statistic::Stationarity => "stationarity",
            Statistic::HalfLife => "half-life",
            Statistic::ZScore => "z-score",
            Statistic::RollingZScore => "rolling z-score",
        };
        f.write_str(name)
    }
}

/// A statistic that fell back, with the reason
#[derive(Debug, Clone, PartialEq)]
pub struct StatFailure {
    /// Which statistic failed
    pub statistic: Statistic,
    /// Why it failed
    pub error: PairError,
}

impl fmt::Display for StatFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.statistic, self.error)
    }
}

/// Outcome of a unit root test (ADF or Engle-Granger)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestResult<T> {
    /// Test statistic, the t-value of the lagged level coefficient
    pub statistic: T,
    /// MacKinnon approximate p-value
    pub p_value: T,
    /// Number of lagged differences in the final regression
    pub used_lag: usize,
    /// Observations in the final regression
    pub nobs: usize,
}

impl<T: Float> TestResult<T> {
    /// The fallback of a failed test: never significant
    pub fn inconclusive() -> Self {
        Self {
            statistic: T::nan(),
            p_value: T::one(),
            used_lag: 0,
            nobs: 0,
        }
    }

    /// Returns `true` if the unit root hypothesis is rejected at `threshold`
    #[inline]
    pub fn rejects(&self, threshold: T) -> bool {
        self.p_value < threshold
    }
}

/// Mean reversion half-life of a spread
///
/// The value is the raw `-ln(2) / slope` of the lag regression. A non-negative slope
/// means the spread does not decay, in which case the raw value is negative or
/// infinite and [`HalfLife::is_mean_reverting`] returns `false`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HalfLife<T> {
    /// Raw half-life in observations
    pub value: T,
    /// Coefficient on the lagged spread level
    pub slope: T,
}

impl<T: Float> HalfLife<T> {
    /// The fallback of a failed estimation: no decay
    pub fn non_reverting() -> Self {
        Self {
            value: T::infinity(),
            slope: T::zero(),
        }
    }

    /// Returns `true` if the spread decays towards its mean
    #[inline]
    pub fn is_mean_reverting(&self) -> bool {
        self.slope < T::zero() && self.value.is_finite()
    }

    /// Returns the half-life in observations, only for mean reverting spreads
    #[inline]
    pub fn periods(&self) -> Option<T> {
        self.is_mean_reverting().then_some(self.value)
    }
}
