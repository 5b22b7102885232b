//! MacKinnon approximate asymptotic p-values for unit root and cointegration tests
//!
//! MacKinnon, J.G. 1994 "Approximate Asymptotic Distribution Functions for Unit-Root and
//! Cointegration Tests." Journal of Business & Economic Statistics 12, 167-76.
//!
//! Rows are indexed by the number of series in the test (`N = 1` for ADF, `N = 2` for a
//! two-series Engle-Granger test). The response surfaces are already scaled.

use crate::{
    Trend,
    helper::{normal_cdf, polyval},
};

const MAX_SERIES: usize = 6;

const TAU_STAR_N: [f64; MAX_SERIES] = [-1.04, -1.53, -2.68, -3.09, -3.07, -3.77];
const TAU_MIN_N: [f64; MAX_SERIES] = [-19.04, -19.62, -21.21, -23.25, -21.63, -25.74];
const TAU_MAX_N: [f64; MAX_SERIES] = [f64::INFINITY, 1.51, 0.86, 0.88, 1.05, 1.24];

const TAU_STAR_C: [f64; MAX_SERIES] = [-1.61, -2.62, -3.13, -3.47, -3.78, -3.93];
const TAU_MIN_C: [f64; MAX_SERIES] = [-18.83, -18.86, -23.48, -28.07, -25.96, -23.27];
const TAU_MAX_C: [f64; MAX_SERIES] = [2.74, 0.92, 0.55, 0.61, 0.79, 1.0];

const TAU_N_SMALLP: [[f64; 3]; MAX_SERIES] = [
    [0.6344, 1.2378, 3.2496e-2],
    [1.9129, 1.3857, 3.5322e-2],
    [2.7648, 1.4502, 3.4186e-2],
    [3.4336, 1.4835, 3.1900e-2],
    [4.0999, 1.5533, 3.5900e-2],
    [4.5388, 1.5344, 2.9807e-2],
];

const TAU_C_SMALLP: [[f64; 3]; MAX_SERIES] = [
    [2.1659, 1.4412, 3.8269e-2],
    [2.9200, 1.5012, 3.9796e-2],
    [3.4699, 1.4856, 3.1640e-2],
    [3.9673, 1.4777, 2.6315e-2],
    [4.5509, 1.5338, 2.9545e-2],
    [5.1399, 1.6036, 3.4445e-2],
];

const TAU_N_LARGEP: [[f64; 4]; MAX_SERIES] = [
    [0.4797, 9.3557e-1, -6.999e-2, 3.3066e-2],
    [1.5578, 8.5580e-1, -2.083e-1, -3.3549e-2],
    [2.2268, 6.8093e-1, -3.2362e-1, -5.4448e-2],
    [2.7654, 6.4502e-1, -3.0811e-1, -4.4946e-2],
    [3.2684, 6.8051e-1, -2.6778e-1, -3.4972e-2],
    [3.7268, 7.1670e-1, -2.3648e-1, -2.8288e-2],
];

const TAU_C_LARGEP: [[f64; 4]; MAX_SERIES] = [
    [1.7339, 9.3202e-1, -1.2745e-1, -1.0368e-2],
    [2.1945, 6.4695e-1, -2.9198e-1, -4.2377e-2],
    [2.5893, 4.5168e-1, -3.6529e-1, -5.0074e-2],
    [3.0387, 4.5452e-1, -3.3666e-1, -4.1921e-2],
    [3.5049, 5.2098e-1, -2.9158e-1, -3.3468e-2],
    [3.9489, 5.8933e-1, -2.5359e-1, -2.7210e-2],
];

/// Returns the MacKinnon approximate p-value of a unit root test statistic
///
/// # Arguments
///
/// * `statistic` - The t-value of the lagged level coefficient
/// * `trend` - Deterministic terms of the test (of the cointegrating regression for `n_series > 1`)
/// * `n_series` - Number of series in the test, clamped to `1..=6`
///
/// # Returns
///
/// * `f64` - The p-value in `[0, 1]`, NaN for a NaN statistic
pub fn mackinnon_p(statistic: f64, trend: Trend, n_series: usize) -> f64 {
    let row = n_series.clamp(1, MAX_SERIES) - 1;
    let (star, min, max, small, large) = match trend {
        Trend::None => (
            TAU_STAR_N[row],
            TAU_MIN_N[row],
            TAU_MAX_N[row],
            &TAU_N_SMALLP[row][..],
            &TAU_N_LARGEP[row][..],
        ),
        Trend::Constant => (
            TAU_STAR_C[row],
            TAU_MIN_C[row],
            TAU_MAX_C[row],
            &TAU_C_SMALLP[row][..],
            &TAU_C_LARGEP[row][..],
        ),
    };

    if statistic.is_nan() {
        return f64::NAN;
    }
    if statistic > max {
        return 1.0;
    }
    if statistic < min {
        return 0.0;
    }
    let coefs = if statistic <= star { small } else { large };
    normal_cdf(polyval(coefs, statistic))
}
