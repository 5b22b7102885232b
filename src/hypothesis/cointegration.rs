use num_traits::Float;

use crate::{
    AdfConfig, DataError, NumericalError, PairError, TestResult, Trend,
    helper::{cast, mean, sum_sq_dev},
    hypothesis::{adf::adf_regression, mackinnon_p},
    utils::Ols,
};

/// Engle-Granger two-step cointegration test of `a` on `b`
///
/// The cointegrating regression `a = β b + c + u` is fitted first, then the residuals
/// `u` are tested for a unit root without deterministic terms. The p-value comes from
/// the two-series MacKinnon surface with a constant, which accounts for `β` and `c`
/// being estimated.
///
/// # Arguments
///
/// * `a` - The dependent series
/// * `b` - The regressor series, as long as `a`
/// * `config` - Lag selection of the residual unit root test
///
/// # Returns
///
/// * `Result<TestResult<T>, PairError>` - The residual ADF statistic and its p-value
///
/// # Errors
///
/// * `NumericalError::Collinear` - when `b` explains `a` perfectly, which leaves no
///   residual to test
/// * `DataError` - when `a` is constant, too short, or the lengths differ
pub fn engle_granger<T: Float + Default>(
    a: &[T],
    b: &[T],
    config: &AdfConfig,
) -> Result<TestResult<T>, PairError> {
    if a.len() != b.len() {
        return Err(DataError::LengthMismatch {
            left: a.len(),
            right: b.len(),
        }
        .into());
    }

    let ones = vec![T::one(); a.len()];
    let fit = Ols::fit(a, &[b, &ones])?;

    let tss = sum_sq_dev(a, mean(a));
    if tss.is_zero() {
        return Err(DataError::Constant.into());
    }
    let r_squared = T::one() - fit.ssr / tss;
    let limit = T::one() - cast::<T, _>(100.0) * T::epsilon().sqrt();
    if r_squared >= limit {
        return Err(NumericalError::Collinear {
            r_squared: r_squared.to_f64().unwrap_or(1.0),
        }
        .into());
    }

    let adf = adf_regression(&fit.resid, Trend::None, config)?;
    let p_value = mackinnon_p(
        adf.statistic.to_f64().unwrap_or(f64::NAN),
        Trend::Constant,
        2,
    );

    Ok(TestResult {
        statistic: adf.statistic,
        p_value: cast(p_value),
        used_lag: adf.used_lag,
        nobs: adf.nobs,
    })
}
