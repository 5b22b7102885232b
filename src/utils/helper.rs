use num_traits::{Float, ToPrimitive};

use crate::Kbn;

/// Converts a primitive number into `T`, yielding NaN if it is not representable
///
/// # Arguments
///
/// * `n` - The number to convert
///
/// # Returns
///
/// * `T` - The converted number
#[inline]
pub fn cast<T: Float, N: ToPrimitive>(n: N) -> T {
    T::from(n).unwrap_or_else(T::nan)
}

/// Returns the compensated sum of a slice
#[inline]
pub fn sum<T: Float + Default>(xs: &[T]) -> T {
    let mut acc = Kbn::<T>::default();
    for &x in xs {
        acc += x;
    }
    acc.total()
}

/// Returns the arithmetic mean of a slice, NaN for an empty slice
#[inline]
pub fn mean<T: Float + Default>(xs: &[T]) -> T {
    sum(xs) / cast(xs.len())
}

/// Returns the compensated dot product of two equally long slices
#[inline]
pub fn dot<T: Float + Default>(xs: &[T], ys: &[T]) -> T {
    let mut acc = Kbn::<T>::default();
    for (&x, &y) in xs.iter().zip(ys) {
        acc += x * y;
    }
    acc.total()
}

/// Returns the sum of squared deviations from `center`
#[inline]
pub fn sum_sq_dev<T: Float + Default>(xs: &[T], center: T) -> T {
    let mut acc = Kbn::<T>::default();
    for &x in xs {
        let d = x - center;
        acc += d * d;
    }
    acc.total()
}

/// Returns the standard deviation of a slice around `mean`
///
/// # Arguments
///
/// * `xs` - The values
/// * `mean` - Their mean
/// * `ddof` - Use `n - 1` in the denominator when true
///
/// # Returns
///
/// * `Option<T>` - The standard deviation, or `None` when the denominator is not positive
pub fn stddev<T: Float + Default>(xs: &[T], mean: T, ddof: bool) -> Option<T> {
    let n = xs.len() - usize::from(ddof && !xs.is_empty());
    if n == 0 {
        return None;
    }
    Some((sum_sq_dev(xs, mean) / cast(n)).sqrt())
}

/// Returns the largest absolute value of a slice, zero when empty
#[inline]
pub fn max_abs<T: Float>(xs: &[T]) -> T {
    xs.iter().fold(T::zero(), |acc, &x| acc.max(x.abs()))
}

/// Returns `true` if a dispersion measure is zero at the precision of the data
///
/// `magnitude` is the largest absolute value of the data. Rounding in the mean of a
/// constant series leaves a residual spread of a few ulps of that magnitude, which
/// must not be mistaken for variance. The threshold is relative, so rescaling the
/// data never changes the verdict.
#[inline]
pub fn is_negligible<T: Float>(stddev: T, magnitude: T, n: usize) -> bool {
    stddev.is_nan() || stddev <= T::epsilon() * magnitude.abs() * cast(n.max(1))
}

/// Evaluates `c[0] + c[1] x + c[2] x^2 + ...` with Horner's scheme
#[inline]
pub fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, &c| acc * x + c)
}

/// Standard normal cumulative distribution function
///
/// Uses the relationship: Phi(x) = 0.5 * (1 + erf(x / sqrt(2)))
#[inline]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x / core::f64::consts::SQRT_2))
}

/// Returns the first position holding a non-finite value
#[inline]
pub fn first_non_finite<T: Float>(xs: &[T]) -> Option<usize> {
    xs.iter().position(|x| !x.is_finite())
}
