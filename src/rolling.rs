use num_traits::Float;

use crate::{
    helper::{is_negligible, max_abs},
    utils::RingBuffer,
};

/// Streaming z-score of each value against the trailing window that ends with it.
///
/// Each call to [`next`](Self::next) pushes one observation; once `period` observations
/// have been seen the z-score `(x - mean) / stddev` of the newest value is returned,
/// where mean and standard deviation are taken over the window including `x`. The first
/// `period - 1` calls return `None`, as does a window whose dispersion is negligible.
///
/// # Examples
///
/// ```
/// use ta_pairs::RollingZScore;
///
/// let mut z = RollingZScore::new(3);
/// assert_eq!(z.next(1.0), None);
/// assert_eq!(z.next(2.0), None);
/// // window [1, 2, 3]: mean 2, sample stddev 1
/// assert_eq!(z.next(3.0), Some(1.0));
/// // window [2, 3, 1]: mean 2, sample stddev 1
/// assert_eq!(z.next(1.0), Some(-1.0));
/// ```
#[derive(Debug, Clone)]
pub struct RollingZScore<T> {
    /// Window length
    period: usize,
    /// Trailing observations
    buf: RingBuffer<T>,
    /// Delta Degrees of Freedom, sample estimator by default
    ddof: bool,
}

impl<T: Float + Default> RollingZScore<T> {
    /// Creates a rolling z-score over `period` observations
    ///
    /// # Arguments
    ///
    /// * `period` - The window length
    ///
    /// # Returns
    ///
    /// * `Self` - The rolling z-score
    pub fn new(period: usize) -> Self {
        Self {
            period,
            buf: RingBuffer::new(period),
            ddof: true,
        }
    }

    /// Returns the window length
    #[inline]
    pub const fn period(&self) -> usize {
        self.period
    }

    /// Returns the Delta Degrees of Freedom
    #[inline]
    pub const fn ddof(&self) -> bool {
        self.ddof
    }

    /// Sets the Delta Degrees of Freedom
    ///
    /// # Arguments
    ///
    /// * `ddof` - `true` for the sample estimator, `false` for the population one
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The rolling z-score
    #[inline]
    pub const fn set_ddof(&mut self, ddof: bool) -> &mut Self {
        self.ddof = ddof;
        self
    }

    /// Returns `true` once a full window has been observed
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.period > 0 && self.buf.is_full()
    }

    /// Clears the window
    ///
    /// # Returns
    ///
    /// * `&mut Self` - The rolling z-score
    #[inline]
    pub fn reset(&mut self) -> &mut Self {
        self.buf.reset();
        self
    }

    /// Pushes an observation and returns its z-score within the trailing window
    ///
    /// # Arguments
    ///
    /// * `value` - The newest observation
    ///
    /// # Returns
    ///
    /// * `Option<T>` - The z-score, or `None` during warm-up and on a flat window
    pub fn next(&mut self, value: T) -> Option<T> {
        self.buf.push(value);
        if !self.is_ready() {
            return None;
        }
        let (mean, std) = self.buf.mean_stddev(self.ddof)?;
        if is_negligible(std, max_abs(self.buf.make_contiguous()), self.period) {
            return None;
        }
        Some((value - mean) / std)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_warm_up_length() {
        let mut z = RollingZScore::new(4);
        let out: Vec<Option<f64>> = [1.0, 4.0, 2.0, 8.0, 5.0, 7.0]
            .into_iter()
            .map(|v| z.next(v))
            .collect();
        assert!(out[..3].iter().all(Option::is_none));
        assert!(out[3..].iter().all(Option::is_some));
    }

    #[test]
    fn test_matches_direct_computation() {
        let data = [1.0, 4.0, 2.0, 8.0, 5.0, 7.0];
        let mut z = RollingZScore::new(4);
        z.set_ddof(false);
        let last = data.iter().map(|&v| z.next(v)).last().flatten().unwrap();

        let window = &data[2..];
        let m = window.iter().sum::<f64>() / 4.0;
        let var = window.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / 4.0;
        assert_approx_eq!(last, (7.0 - m) / var.sqrt(), 1e-12);
    }

    #[test]
    fn test_flat_window_is_undefined() {
        let mut z = RollingZScore::new(3);
        for _ in 0..5 {
            assert_eq!(z.next(2.5), None);
        }
        assert!(z.is_ready());
        assert!(z.next(3.5).is_some());
    }

    #[test]
    fn test_small_magnitudes_are_not_flat() {
        let mut z = RollingZScore::new(3);
        let out: Vec<Option<f64>> = [1e-18, 3e-18, 2e-18, 5e-18]
            .into_iter()
            .map(|v| z.next(v))
            .collect();
        assert!(out[2].is_some());
        assert_approx_eq!(out[3].unwrap(), 1.091089451179962, 1e-9);
    }

    #[test]
    fn test_reset_restarts_warm_up() {
        let mut z = RollingZScore::new(2);
        z.next(1.0);
        assert!(z.next(2.0).is_some());
        z.reset();
        assert!(!z.is_ready());
        assert_eq!(z.next(3.0), None);
    }
}
