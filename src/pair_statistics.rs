use std::cell::OnceCell;

use num_traits::Float;

use crate::{
    ConfigError, DataError, EngineConfig, Estimate, HalfLife, LagConvention, NumericalError,
    PairError, RollingZScore, StatFailure, Statistic, TestResult, Trend,
    helper::{cast, dot, first_non_finite, is_negligible, max_abs, mean, stddev, sum_sq_dev},
    hypothesis::{adfuller, engle_granger},
    utils::Ols,
};

/// Statistical relationship between two aligned series over one fixed window.
///
/// The hedge ratio and the spread are computed once at construction; every other
/// statistic is computed on first access and memoized, so all of them derive from the
/// same hedge ratio. A statistic that cannot be computed yields its documented
/// fallback value together with the error, it never aborts the instance:
///
/// | statistic       | fallback                               |
/// |-----------------|----------------------------------------|
/// | correlation     | `0`                                    |
/// | hedge ratio     | `0`                                    |
/// | cointegration   | p-value `1`, statistic NaN             |
/// | stationarity    | p-value `1`, statistic NaN             |
/// | half-life       | `+inf` with a zero slope               |
/// | z-score         | all zeros                              |
/// | rolling z-score | all `None`                             |
///
/// # Examples
///
/// ```
/// use ta_pairs::PairStatistics;
///
/// let a = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let b = [1.0, 2.0, 3.0, 4.0, 5.0];
/// let stats = PairStatistics::new(&a, &b).unwrap();
///
/// assert_eq!(stats.correlation().value(), 1.0);
/// assert_eq!(stats.hedge_ratio().value(), 1.0);
/// assert_eq!(stats.spread(), &[0.0; 5]);
/// // identical series leave no residual to test
/// assert!(!stats.is_cointegrated());
/// assert!(stats.cointegration().is_fallback());
/// ```
#[derive(Debug)]
pub struct PairStatistics<'a, T> {
    a: &'a [T],
    b: &'a [T],
    config: EngineConfig,
    hedge_ratio: Estimate<T>,
    spread: Vec<T>,
    correlation: OnceCell<Estimate<T>>,
    cointegration: OnceCell<Estimate<TestResult<T>>>,
    stationarity: OnceCell<Estimate<TestResult<T>>>,
    half_life: OnceCell<Estimate<HalfLife<T>>>,
    zscore: OnceCell<Estimate<Vec<T>>>,
    zscore_rolling: OnceCell<Estimate<Vec<Option<T>>>>,
}

impl<'a, T: Float + Default> PairStatistics<'a, T> {
    /// Creates the statistics of `a` against `b` with the default configuration
    ///
    /// # Arguments
    ///
    /// * `a` - The dependent series
    /// * `b` - The regressor series
    ///
    /// # Returns
    ///
    /// * `Result<Self, PairError>` - The statistics, or why the window is unusable
    pub fn new(a: &'a [T], b: &'a [T]) -> Result<Self, PairError> {
        Self::with_config(a, b, EngineConfig::default())
    }

    /// Creates the statistics of `a` against `b`
    ///
    /// # Arguments
    ///
    /// * `a` - The dependent series
    /// * `b` - The regressor series, as long as `a`
    /// * `config` - Significance, rolling window and test settings
    ///
    /// # Returns
    ///
    /// * `Result<Self, PairError>` - `ConfigError` for invalid settings, `DataError` for
    ///   mismatched lengths, fewer than two observations or non-finite values
    pub fn with_config(a: &'a [T], b: &'a [T], config: EngineConfig) -> Result<Self, PairError> {
        config.validate()?;
        if a.len() != b.len() {
            return Err(DataError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            }
            .into());
        }
        if a.len() < 2 {
            return Err(DataError::TooShort {
                required: 2,
                actual: a.len(),
            }
            .into());
        }
        if let Some(index) = first_non_finite(a).or_else(|| first_non_finite(b)) {
            return Err(DataError::NonFinite { index }.into());
        }

        let hedge_ratio = Estimate::from_result(hedge_ratio(a, b), T::zero);
        let ratio = hedge_ratio.value();
        let spread = a.iter().zip(b).map(|(&x, &y)| x - ratio * y).collect();

        Ok(Self {
            a,
            b,
            config,
            hedge_ratio,
            spread,
            correlation: OnceCell::new(),
            cointegration: OnceCell::new(),
            stationarity: OnceCell::new(),
            half_life: OnceCell::new(),
            zscore: OnceCell::new(),
            zscore_rolling: OnceCell::new(),
        })
    }

    /// Number of observations in the window
    #[inline]
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// The dependent series
    #[inline]
    pub fn series_a(&self) -> &[T] {
        self.a
    }

    /// The regressor series
    #[inline]
    pub fn series_b(&self) -> &[T] {
        self.b
    }

    /// The settings of this instance
    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Slope of the regression of `a` on `b` without an intercept, `Σab / Σb²`
    ///
    /// # Returns
    ///
    /// * `&Estimate<T>` - The hedge ratio, `0` flagged `DataError::ZeroRegressor` when
    ///   `b` is the zero vector
    #[inline]
    pub fn hedge_ratio(&self) -> &Estimate<T> {
        &self.hedge_ratio
    }

    /// `a[i] - hedge_ratio * b[i]` for every observation
    #[inline]
    pub fn spread(&self) -> &[T] {
        &self.spread
    }

    /// Pearson correlation coefficient of `a` and `b`
    ///
    /// # Returns
    ///
    /// * `&Estimate<T>` - The coefficient in `[-1, 1]`, `0` flagged
    ///   `NumericalError::ZeroVariance` when either series is flat
    pub fn correlation(&self) -> &Estimate<T> {
        self.correlation
            .get_or_init(|| Estimate::from_result(correlation(self.a, self.b), T::zero))
    }

    /// Engle-Granger cointegration test of `a` on `b`
    pub fn cointegration(&self) -> &Estimate<TestResult<T>> {
        self.cointegration.get_or_init(|| {
            Estimate::from_result(
                engle_granger(self.a, self.b, &self.config.adf),
                TestResult::inconclusive,
            )
        })
    }

    /// Returns `true` if the cointegration p-value is below `threshold`
    ///
    /// A failed test never reports cointegration.
    #[inline]
    pub fn cointegrated(&self, threshold: T) -> bool {
        self.cointegration().as_value().rejects(threshold)
    }

    /// [`cointegrated`](Self::cointegrated) at the configured significance
    #[inline]
    pub fn is_cointegrated(&self) -> bool {
        self.cointegrated(cast(self.config.significance))
    }

    /// Augmented Dickey-Fuller test of the spread, with a constant
    pub fn stationarity(&self) -> &Estimate<TestResult<T>> {
        self.stationarity.get_or_init(|| {
            Estimate::from_result(
                adfuller(&self.spread, Trend::Constant, &self.config.adf),
                TestResult::inconclusive,
            )
        })
    }

    /// Returns `true` if the spread's unit root p-value is below `threshold`
    #[inline]
    pub fn stationary(&self, threshold: T) -> bool {
        self.stationarity().as_value().rejects(threshold)
    }

    /// [`stationary`](Self::stationary) at the configured significance
    #[inline]
    pub fn is_stationary(&self) -> bool {
        self.stationary(cast(self.config.significance))
    }

    /// Half-life of mean reversion of the spread
    ///
    /// Regresses the first difference of the spread on its lagged level with an
    /// intercept; the half-life is `-ln 2 / slope`. The raw value is kept for any slope,
    /// use [`HalfLife::is_mean_reverting`] to tell a decaying spread from a drifting one.
    ///
    /// # Returns
    ///
    /// * `&Estimate<HalfLife<T>>` - The half-life, `+inf` with a zero slope when the
    ///   regression cannot be fitted
    pub fn half_life(&self) -> &Estimate<HalfLife<T>> {
        self.half_life.get_or_init(|| {
            Estimate::from_result(
                half_life(&self.spread, self.config.half_life_lag),
                HalfLife::non_reverting,
            )
        })
    }

    /// Standardized spread over the whole window
    ///
    /// # Returns
    ///
    /// * `&Estimate<Vec<T>>` - `(spread[i] - mean) / stddev` for every `i`, all zeros
    ///   flagged `NumericalError::ZeroVariance` for a flat spread
    pub fn zscore(&self) -> &Estimate<Vec<T>> {
        self.zscore.get_or_init(|| {
            let n = self.spread.len();
            let m = mean(&self.spread);
            match stddev(&self.spread, m, self.config.ddof) {
                Some(s) if !is_negligible(s, max_abs(&self.spread), n) => {
                    Estimate::ok(self.spread.iter().map(|&x| (x - m) / s).collect())
                }
                _ => Estimate::fallback(vec![T::zero(); n], NumericalError::ZeroVariance),
            }
        })
    }

    /// Rolling z-score of the spread over the configured window
    pub fn zscore_rolling(&self) -> &Estimate<Vec<Option<T>>> {
        self.zscore_rolling
            .get_or_init(|| self.zscore_rolling_with(self.config.rolling_window))
    }

    /// Rolling z-score of the spread over `window` observations
    ///
    /// # Arguments
    ///
    /// * `window` - Observations per rolling window
    ///
    /// # Returns
    ///
    /// * `Estimate<Vec<Option<T>>>` - One entry per observation, the first `window - 1`
    ///   are `None`. Flat windows are `None` too and flag `NumericalError::ZeroVariance`;
    ///   a window of zero or longer than the spread gives all `None` flagged
    ///   `ConfigError::RollingWindow`.
    pub fn zscore_rolling_with(&self, window: usize) -> Estimate<Vec<Option<T>>> {
        let n = self.spread.len();
        if window == 0 || window > n {
            return Estimate::fallback(
                vec![None; n],
                ConfigError::RollingWindow { window, len: n },
            );
        }

        let mut rolling = RollingZScore::new(window);
        rolling.set_ddof(self.config.rolling_ddof);
        let values: Vec<Option<T>> = self.spread.iter().map(|&x| rolling.next(x)).collect();

        if values[window - 1..].iter().any(Option::is_none) {
            Estimate::fallback(values, NumericalError::ZeroVariance)
        } else {
            Estimate::ok(values)
        }
    }

    /// Every statistic that fell back, computing the ones not yet evaluated
    pub fn failures(&self) -> Vec<StatFailure> {
        [
            (Statistic::Correlation, self.correlation().error()),
            (Statistic::HedgeRatio, self.hedge_ratio().error()),
            (Statistic::Cointegration, self.cointegration().error()),
            (Statistic::Stationarity, self.stationarity().error()),
            (Statistic::HalfLife, self.half_life().error()),
            (Statistic::ZScore, self.zscore().error()),
            (Statistic::RollingZScore, self.zscore_rolling().error()),
        ]
        .into_iter()
        .filter_map(|(statistic, error)| {
            error.map(|error| StatFailure {
                statistic,
                error: error.clone(),
            })
        })
        .collect()
    }
}

fn hedge_ratio<T: Float + Default>(a: &[T], b: &[T]) -> Result<T, PairError> {
    let sbb = dot(b, b);
    if sbb.is_zero() || !sbb.is_finite() {
        return Err(DataError::ZeroRegressor.into());
    }
    let ratio = dot(a, b) / sbb;
    if !ratio.is_finite() {
        return Err(NumericalError::NonFinite.into());
    }
    Ok(ratio)
}

fn correlation<T: Float + Default>(a: &[T], b: &[T]) -> Result<T, PairError> {
    let n = a.len();
    let (ma, mb) = (mean(a), mean(b));
    let va = sum_sq_dev(a, ma);
    let vb = sum_sq_dev(b, mb);
    let scale: T = cast(n);
    if is_negligible((va / scale).sqrt(), max_abs(a), n)
        || is_negligible((vb / scale).sqrt(), max_abs(b), n)
    {
        return Err(NumericalError::ZeroVariance.into());
    }

    let da: Vec<T> = a.iter().map(|&x| x - ma).collect();
    let db: Vec<T> = b.iter().map(|&y| y - mb).collect();
    // va * vb can leave the floating point range even when r is well defined
    let r = dot(&da, &db) / va * (va.sqrt() / vb.sqrt());
    if r.is_nan() {
        return Err(NumericalError::NonFinite.into());
    }
    Ok(r.max(-T::one()).min(T::one()))
}

fn half_life<T: Float + Default>(
    spread: &[T],
    convention: LagConvention,
) -> Result<HalfLife<T>, PairError> {
    let (lag, delta): (Vec<T>, Vec<T>) = match convention {
        LagConvention::Shifted => spread.windows(2).map(|w| (w[0], w[1] - w[0])).unzip(),
        LagConvention::SelfReferential => spread
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let prev = spread[i.saturating_sub(1)];
                (prev, x - prev)
            })
            .unzip(),
    };
    let ones = vec![T::one(); lag.len()];
    let fit = Ols::fit(&delta, &[&lag, &ones])?;
    let slope = fit.params[0];
    let ln2: T = cast(core::f64::consts::LN_2);
    Ok(HalfLife {
        value: -ln2 / slope,
        slope,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::utils::testing::{ar1, random_walk};
    use assert_approx_eq::assert_approx_eq;

    fn cointegrated_pair() -> (Vec<f64>, Vec<f64>) {
        let b = random_walk(300, 11);
        let noise = ar1(0.3, 300, 12);
        let a = b.iter().zip(&noise).map(|(x, e)| 1.5 * x + 2.0 + e).collect();
        (a, b)
    }

    #[test]
    fn test_identical_series() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = PairStatistics::new(&a, &a).unwrap();
        assert_eq!(stats.correlation().value(), 1.0);
        assert_eq!(stats.hedge_ratio().value(), 1.0);
        assert_eq!(stats.spread(), &[0.0; 5]);

        assert!(!stats.is_cointegrated());
        assert!(matches!(
            stats.cointegration().error(),
            Some(PairError::Numerical(NumericalError::Collinear { .. }))
        ));
        assert_eq!(stats.cointegration().as_value().p_value, 1.0);

        assert!(!stats.is_stationary());
        assert_eq!(
            stats.stationarity().error(),
            Some(&PairError::Data(DataError::Constant))
        );

        let hl = stats.half_life();
        assert!(hl.is_fallback());
        assert!(!hl.as_value().is_mean_reverting());
        assert_eq!(hl.as_value().value, f64::INFINITY);

        assert_eq!(stats.zscore().as_value(), &vec![0.0; 5]);
        assert!(stats.zscore().is_fallback());
    }

    #[test]
    fn test_zero_regressor() {
        let a = [1.0, 2.0, 3.0];
        let b = [0.0; 3];
        let stats = PairStatistics::new(&a, &b).unwrap();
        assert_eq!(stats.hedge_ratio().value(), 0.0);
        assert_eq!(
            stats.hedge_ratio().error(),
            Some(&PairError::Data(DataError::ZeroRegressor))
        );
        assert_eq!(stats.spread(), &a);
        assert_eq!(stats.correlation().value(), 0.0);
        assert!(stats.correlation().is_fallback());
    }

    #[test]
    fn test_constant_regressor_hedge_ratio() {
        let a = [3.0, 5.0, 4.0, 8.0];
        let b = [2.0; 4];
        let stats = PairStatistics::new(&a, &b).unwrap();
        assert_approx_eq!(stats.hedge_ratio().value(), 5.0 / 2.0, 1e-12);
    }

    #[test]
    fn test_spread_is_orthogonal_to_regressor() {
        let (a, b) = cointegrated_pair();
        let stats = PairStatistics::new(&a, &b).unwrap();
        let cross: f64 = stats.spread().iter().zip(&b).map(|(s, y)| s * y).sum();
        let scale: f64 = b.iter().map(|y| y * y).sum();
        assert!(cross.abs() / scale < 1e-12);
    }

    #[test]
    fn test_cointegrated_pair() {
        let (a, b) = cointegrated_pair();
        let stats = PairStatistics::new(&a, &b).unwrap();
        assert!(stats.correlation().value() > 0.9);
        assert!(stats.is_cointegrated());
        assert!(stats.cointegration().is_ok());
        assert!(stats.cointegrated(0.01));
    }

    #[test]
    fn test_half_life_of_known_ar1() {
        let spread = ar1(0.8, 400, 41);
        let hl = half_life(&spread, LagConvention::Shifted).unwrap();
        // slope estimates phi - 1 = -0.2, half-life -ln2 / -0.2 ~ 3.47
        assert!(hl.is_mean_reverting());
        assert!((hl.slope + 0.2).abs() < 0.06, "slope {}", hl.slope);
        assert_approx_eq!(hl.value, -core::f64::consts::LN_2 / hl.slope, 1e-12);
    }

    #[test]
    fn test_half_life_lag_conventions_differ_on_first_row() {
        let spread = [0.0, 1.0, 0.4, 0.9, 0.2, 0.7, 0.1];
        let shifted = half_life(&spread, LagConvention::Shifted).unwrap();
        let self_ref = half_life(&spread, LagConvention::SelfReferential).unwrap();
        assert!(shifted.slope < 0.0);
        assert!(self_ref.slope < 0.0);
        assert!((shifted.slope - self_ref.slope).abs() > 1e-6);
    }

    #[test]
    fn test_trending_spread_is_not_mean_reverting() {
        let spread: Vec<f64> = (0..20).map(|i| (1.1f64).powi(i)).collect();
        let hl = half_life(&spread, LagConvention::Shifted).unwrap();
        assert!(hl.slope > 0.0);
        assert!(hl.value < 0.0);
        assert!(!hl.is_mean_reverting());
        assert_eq!(hl.periods(), None);
    }

    #[test]
    fn test_zscore_moments() {
        let (a, b) = cointegrated_pair();
        let stats = PairStatistics::new(&a, &b).unwrap();
        let z = stats.zscore().as_value();
        let n = z.len() as f64;
        let m = z.iter().sum::<f64>() / n;
        let var = z.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / n;
        assert_approx_eq!(m, 0.0, 1e-9);
        assert_approx_eq!(var.sqrt(), 1.0, 1e-9);
    }

    #[test]
    fn test_zscore_rolling_warm_up() {
        let (a, b) = cointegrated_pair();
        let stats = PairStatistics::new(&a, &b).unwrap();
        let rolling = stats.zscore_rolling();
        assert!(rolling.is_ok());
        let values = rolling.as_value();
        assert_eq!(values.len(), 300);
        assert!(values[..20].iter().all(Option::is_none));
        assert!(values[20..].iter().all(Option::is_some));

        let w5 = stats.zscore_rolling_with(5);
        assert_eq!(w5.as_value().iter().filter(|v| v.is_none()).count(), 4);
    }

    #[test]
    fn test_cointegrated_spread_is_stationary() {
        let (a, b) = cointegrated_pair();
        let stats = PairStatistics::new(&a, &b).unwrap();
        assert!(stats.stationarity().is_ok());
        assert!(stats.stationarity().as_value().p_value < 0.01);
        assert!(stats.is_stationary());
        assert!(stats.stationary(0.01));
    }

    #[test]
    fn test_zscore_rolling_matches_sample_stddev() {
        let (a, b) = cointegrated_pair();
        let stats = PairStatistics::new(&a, &b).unwrap();
        let spread = stats.spread();
        let rolling = stats.zscore_rolling().as_value();

        for end in [21, 150, 300] {
            let window = &spread[end - 21..end];
            let m = window.iter().sum::<f64>() / 21.0;
            let var = window.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / 20.0;
            let expected = (spread[end - 1] - m) / var.sqrt();
            assert_approx_eq!(rolling[end - 1].unwrap(), expected, 1e-9);
        }
    }

    #[test]
    fn test_correlation_is_scale_invariant() {
        let tiny = [1e-16, 2e-16, 4e-16, 3e-16, 5e-16];
        let stats = PairStatistics::new(&tiny, &tiny).unwrap();
        assert!(stats.correlation().is_ok());
        assert_eq!(stats.correlation().value(), 1.0);

        let x = random_walk(50, 3);
        for scale in [1e-15, 1e150] {
            let scaled: Vec<f64> = x.iter().map(|v| v * scale).collect();
            let stats = PairStatistics::new(&scaled, &x).unwrap();
            assert!(stats.correlation().is_ok());
            assert_approx_eq!(stats.correlation().value(), 1.0, 1e-12);
        }
    }

    #[test]
    fn test_zscore_rolling_window_longer_than_data() {
        let a = [1.0, 2.0, 4.0, 3.0];
        let b = [1.0, 1.5, 1.2, 1.1];
        let stats = PairStatistics::new(&a, &b).unwrap();
        let rolling = stats.zscore_rolling();
        assert_eq!(rolling.as_value(), &vec![None; 4]);
        assert_eq!(
            rolling.error(),
            Some(&PairError::Config(ConfigError::RollingWindow {
                window: 21,
                len: 4
            }))
        );
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            PairStatistics::new(&[1.0, 2.0], &[1.0]),
            Err(PairError::Data(DataError::LengthMismatch { .. }))
        ));
        assert!(matches!(
            PairStatistics::new(&[1.0], &[1.0]),
            Err(PairError::Data(DataError::TooShort { .. }))
        ));
        assert!(matches!(
            PairStatistics::new(&[1.0, f64::NAN], &[1.0, 2.0]),
            Err(PairError::Data(DataError::NonFinite { index: 1 }))
        ));
        let cfg = EngineConfig {
            significance: 0.0,
            ..Default::default()
        };
        assert!(matches!(
            PairStatistics::with_config(&[1.0, 2.0], &[1.0, 2.0], cfg),
            Err(PairError::Config(ConfigError::Significance(_)))
        ));
    }

    #[test]
    fn test_failures_lists_fallbacks() {
        let a = [1.0, 2.0, 3.0, 4.0, 5.0];
        let stats = PairStatistics::new(&a, &a).unwrap();
        let failed: Vec<Statistic> = stats.failures().into_iter().map(|f| f.statistic).collect();
        assert_eq!(
            failed,
            vec![
                Statistic::Cointegration,
                Statistic::Stationarity,
                Statistic::HalfLife,
                Statistic::ZScore,
                Statistic::RollingZScore,
            ]
        );
    }
}
