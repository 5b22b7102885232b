use num_traits::Float;
use ordered_float::OrderedFloat;

use crate::{
    AdfConfig, DataError, InfoCriterion, NumericalError, PairError, TestResult, Trend,
    helper::{cast, first_non_finite},
    hypothesis::mackinnon_p,
    utils::Ols,
};

/// Augmented Dickey-Fuller unit root test
///
/// Regresses the first difference of `x` on its lagged level, optional deterministic
/// terms and lagged differences:
///
/// `Δx[t] = γ x[t-1] (+ c) + Σ δ_j Δx[t-j] + ε`
///
/// The statistic is the t-value of `γ`; the null hypothesis is a unit root, so a small
/// p-value indicates a stationary, mean reverting series.
///
/// # Arguments
///
/// * `x` - The series to test
/// * `trend` - Deterministic terms of the regression
/// * `config` - Lag selection
///
/// # Returns
///
/// * `Result<TestResult<T>, PairError>` - The statistic with its MacKinnon p-value
///
/// # Examples
///
/// ```
/// use ta_pairs::{AdfConfig, Trend, hypothesis::adfuller};
///
/// // AR(1) with coefficient 0.3 driven by a linear congruential generator
/// let mut state: u64 = 7;
/// let mut level = 0.0;
/// let mut x = Vec::new();
/// for _ in 0..200 {
///     state = state
///         .wrapping_mul(6364136223846793005)
///         .wrapping_add(1442695040888963407);
///     let shock = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
///     level = 0.3 * level + shock;
///     x.push(level);
/// }
///
/// let res = adfuller(&x, Trend::Constant, &AdfConfig::default()).unwrap();
/// assert!(res.statistic < -3.5);
/// assert!(res.p_value < 0.05);
/// ```
pub fn adfuller<T: Float + Default>(
    x: &[T],
    trend: Trend,
    config: &AdfConfig,
) -> Result<TestResult<T>, PairError> {
    let fit = adf_regression(x, trend, config)?;
    let p_value = mackinnon_p(fit.statistic.to_f64().unwrap_or(f64::NAN), trend, 1);
    Ok(TestResult {
        statistic: fit.statistic,
        p_value: cast(p_value),
        used_lag: fit.used_lag,
        nobs: fit.nobs,
    })
}

/// Statistic of an ADF regression before it is mapped to a p-value
pub(crate) struct AdfFit<T> {
    pub statistic: T,
    pub used_lag: usize,
    pub nobs: usize,
}

pub(crate) fn adf_regression<T: Float + Default>(
    x: &[T],
    trend: Trend,
    config: &AdfConfig,
) -> Result<AdfFit<T>, PairError> {
    if let Some(index) = first_non_finite(x) {
        return Err(DataError::NonFinite { index }.into());
    }
    let nobs = x.len();
    let ntrend = trend.regressors();
    let required = 2 * (ntrend + 1) + usize::from(ntrend == 0);
    if nobs < required {
        return Err(DataError::TooShort {
            required,
            actual: nobs,
        }
        .into());
    }
    let (lo, hi) = x
        .iter()
        .fold((T::infinity(), T::neg_infinity()), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    if lo == hi {
        return Err(DataError::Constant.into());
    }

    // nobs / 2 - ntrend - 1 >= 0 by the length check above
    let cap = nobs / 2 - ntrend - 1;
    let max_lag = match config.max_lag {
        Some(lag) if lag > cap => {
            return Err(DataError::TooShort {
                required: 2 * (lag + ntrend + 1),
                actual: nobs,
            }
            .into());
        }
        Some(lag) => lag,
        None => default_max_lag(nobs).min(cap),
    };

    let diffs: Vec<T> = x.windows(2).map(|w| w[1] - w[0]).collect();

    let used_lag = match config.autolag {
        Some(criterion) => {
            let design = AdfDesign::new(x, &diffs, max_lag, trend);
            (0..=max_lag)
                .filter_map(|lag| {
                    design.fit(lag).ok().map(|fit| {
                        let ic = match criterion {
                            InfoCriterion::Aic => fit.aic(),
                            InfoCriterion::Bic => fit.bic(),
                        };
                        (OrderedFloat(ic.to_f64().unwrap_or(f64::NAN)), lag)
                    })
                })
                .min()
                .map(|(_, lag)| lag)
                .ok_or(NumericalError::SingularDesign)?
        }
        None => max_lag,
    };

    let design = AdfDesign::new(x, &diffs, used_lag, trend);
    let fit = design.fit(used_lag)?;
    let statistic = fit.tvalue(0);
    if !statistic.is_finite() {
        return Err(NumericalError::NonFinite.into());
    }

    Ok(AdfFit {
        statistic,
        used_lag,
        nobs: fit.nobs,
    })
}

/// `ceil(12 * (n / 100)^(1/4))`, the Schwert rule
fn default_max_lag(nobs: usize) -> usize {
    (12.0 * (nobs as f64 / 100.0).powf(0.25)).ceil() as usize
}

/// Regressors of an ADF regression sharing one sample, trimmed for `lags` lagged differences
struct AdfDesign<T> {
    y: Vec<T>,
    level: Vec<T>,
    lagged: Vec<Vec<T>>,
    ones: Option<Vec<T>>,
}

impl<T: Float + Default> AdfDesign<T> {
    fn new(x: &[T], diffs: &[T], lags: usize, trend: Trend) -> Self {
        let rows = diffs.len().saturating_sub(lags);
        let mut y = Vec::with_capacity(rows);
        let mut level = Vec::with_capacity(rows);
        let mut lagged = vec![Vec::with_capacity(rows); lags];
        for t in lags..diffs.len() {
            y.push(diffs[t]);
            level.push(x[t]);
            for (j, col) in lagged.iter_mut().enumerate() {
                col.push(diffs[t - j - 1]);
            }
        }
        let ones = match trend {
            Trend::None => None,
            Trend::Constant => Some(vec![T::one(); rows]),
        };
        Self {
            y,
            level,
            lagged,
            ones,
        }
    }

    /// Fits with the first `lag` lagged differences, the level is always column 0
    fn fit(&self, lag: usize) -> Result<Ols<T>, NumericalError> {
        let mut columns: Vec<&[T]> = Vec::with_capacity(lag + 2);
        columns.push(&self.level);
        columns.extend(self.lagged.iter().take(lag).map(Vec::as_slice));
        if let Some(ones) = &self.ones {
            columns.push(ones);
        }
        Ols::fit(&self.y, &columns)
    }
}
