use num_traits::Float;

use crate::{
    NumericalError,
    helper::{cast, dot, first_non_finite, sum_sq_dev},
};

/// Ordinary least squares fit of `y` on a set of regressor columns
///
/// Solved with a Householder QR decomposition of the design matrix, which avoids
/// squaring its condition number the way the normal equations would. Rank deficiency
/// is reported instead of producing meaningless coefficients.
#[derive(Debug, Clone)]
pub struct Ols<T> {
    /// Coefficients, in the order of the regressor columns
    pub params: Vec<T>,
    /// Standard errors of the coefficients
    pub bse: Vec<T>,
    /// Residuals `y - X b`
    pub resid: Vec<T>,
    /// Sum of squared residuals
    pub ssr: T,
    /// Number of observations
    pub nobs: usize,
}

impl<T: Float + Default> Ols<T> {
    /// Fits `y = X b + e`
    ///
    /// # Arguments
    ///
    /// * `y` - The dependent variable
    /// * `columns` - The regressors, each as long as `y`
    ///
    /// # Returns
    ///
    /// * `Result<Self, NumericalError>` - The fit, or why it could not be computed
    pub fn fit(y: &[T], columns: &[&[T]]) -> Result<Self, NumericalError> {
        let n = y.len();
        let k = columns.len();
        if k == 0 || n <= k {
            return Err(NumericalError::Underdetermined {
                observations: n,
                parameters: k,
            });
        }
        if columns.iter().any(|c| c.len() != n) {
            return Err(NumericalError::SingularDesign);
        }
        if first_non_finite(y).is_some() || columns.iter().any(|c| first_non_finite(c).is_some())
        {
            return Err(NumericalError::NonFinite);
        }

        // Column-major working copy, reduced in place to R
        let mut a: Vec<Vec<T>> = columns.iter().map(|c| c.to_vec()).collect();
        let mut qty = y.to_vec();

        for j in 0..k {
            let norm = dot(&a[j][j..], &a[j][j..]).sqrt();
            if norm.is_zero() {
                continue;
            }
            let alpha = if a[j][j] > T::zero() { -norm } else { norm };
            let mut v = a[j][j..].to_vec();
            v[0] = v[0] - alpha;
            let vv = dot(&v, &v);
            if vv.is_zero() {
                continue;
            }
            for col in a.iter_mut().skip(j) {
                reflect(&mut col[j..], &v, vv);
            }
            reflect(&mut qty[j..], &v, vv);
        }

        let diag: Vec<T> = (0..k).map(|j| a[j][j].abs()).collect();
        let max_diag = diag.iter().copied().fold(T::zero(), T::max);
        let tol = max_diag * T::epsilon() * cast(n.max(k));
        if max_diag.is_zero() || diag.iter().any(|&d| d <= tol) {
            return Err(NumericalError::SingularDesign);
        }

        // Back substitution on R b = Q'y
        let mut params = vec![T::zero(); k];
        for j in (0..k).rev() {
            let mut acc = qty[j];
            for c in (j + 1)..k {
                acc = acc - a[c][j] * params[c];
            }
            params[j] = acc / a[j][j];
        }

        let mut resid = y.to_vec();
        for (col, &b) in columns.iter().zip(&params) {
            for (r, &x) in resid.iter_mut().zip(col.iter()) {
                *r = *r - b * x;
            }
        }
        let ssr = sum_sq_dev(&resid, T::zero());

        // diag((X'X)^-1) = row norms of R^-1
        let rinv = upper_inverse(&a, k);
        let sigma2 = ssr / cast(n - k);
        let bse = (0..k)
            .map(|j| (sigma2 * dot(&rinv[j][j..], &rinv[j][j..])).sqrt())
            .collect();

        if first_non_finite(&params).is_some() {
            return Err(NumericalError::NonFinite);
        }

        Ok(Self {
            params,
            bse,
            resid,
            ssr,
            nobs: n,
        })
    }

    /// Number of estimated parameters
    #[inline]
    pub fn k(&self) -> usize {
        self.params.len()
    }

    /// Residual degrees of freedom
    #[inline]
    pub fn df_resid(&self) -> usize {
        self.nobs - self.k()
    }

    /// t-value of coefficient `j`
    #[inline]
    pub fn tvalue(&self, j: usize) -> T {
        self.params[j] / self.bse[j]
    }

    /// Gaussian log-likelihood of the fit
    pub fn llf(&self) -> T {
        let n: T = cast(self.nobs);
        let two_pi: T = cast(core::f64::consts::TAU);
        let half: T = cast(0.5);
        -half * n * (two_pi.ln() + (self.ssr / n).ln() + T::one())
    }

    /// Akaike information criterion
    pub fn aic(&self) -> T {
        let two: T = cast(2.0);
        -two * self.llf() + two * cast(self.k())
    }

    /// Bayesian information criterion
    pub fn bic(&self) -> T {
        let two: T = cast(2.0);
        let n: T = cast(self.nobs);
        -two * self.llf() + n.ln() * cast(self.k())
    }
}

/// Applies the Householder reflection `I - 2 v v' / (v'v)` to `x`
#[inline]
fn reflect<T: Float + Default>(x: &mut [T], v: &[T], vv: T) {
    let s = dot(x, v);
    let f = (s + s) / vv;
    for (xi, &vi) in x.iter_mut().zip(v) {
        *xi = *xi - f * vi;
    }
}

/// Inverts the upper triangle stored column-major in `r`, returning it row-major
fn upper_inverse<T: Float>(r: &[Vec<T>], k: usize) -> Vec<Vec<T>> {
    let mut inv = vec![vec![T::zero(); k]; k];
    for c in 0..k {
        inv[c][c] = T::one() / r[c][c];
        for row in (0..c).rev() {
            let mut acc = T::zero();
            for m in (row + 1)..=c {
                acc = acc + r[m][row] * inv[m][c];
            }
            inv[row][c] = -acc / r[row][row];
        }
    }
    inv
}
