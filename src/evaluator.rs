use core::ops::Range;

use num_traits::Float;
use tracing::{debug, info};

use crate::{
    AlignedSeriesPair, ConfigError, DataError, EngineConfig, PairError, PairHistory, PairId,
    PairStatistics, StatisticsSnapshot, WindowSpec,
};

/// Slides a fixed-length window over an aligned pair, one observation at a time.
///
/// For a pair of `M` observations and a window of `L`, the window ending before index
/// `i` covers observations `i - L..i` for every `i` in `L..M`, giving `M - L` snapshots
/// keyed by the timestamp at `i - 1`. Each window gets a fresh [`PairStatistics`], so
/// windows are independent of each other and can be computed in any order.
///
/// # Examples
///
/// ```
/// use ta_pairs::{AlignedSeriesPair, EngineConfig, WindowSpec, WindowedEvaluator};
///
/// let pair = AlignedSeriesPair::from_rows(
///     (0..40).map(|i| (i, 10.0 + (i % 7) as f64, 5.0 + (i % 5) as f64)),
/// )
/// .unwrap();
/// let config = EngineConfig {
///     rolling_window: 5,
///     ..Default::default()
/// };
/// let evaluator = WindowedEvaluator::new(&pair, WindowSpec::new(30).unwrap(), config).unwrap();
///
/// let snapshots = evaluator.evaluate();
/// assert_eq!(snapshots.len(), 10);
/// assert_eq!(snapshots[0].timestamp, 29);
/// assert_eq!(snapshots[9].timestamp, 38);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct WindowedEvaluator<'a, K, T> {
    series: &'a AlignedSeriesPair<K, T>,
    spec: WindowSpec,
    config: EngineConfig,
}

impl<'a, K, T> WindowedEvaluator<'a, K, T>
where
    K: Clone + Send + Sync,
    T: Float + Default + Send + Sync,
{
    /// Creates an evaluator over `series`
    ///
    /// # Arguments
    ///
    /// * `series` - The full history of the pair
    /// * `spec` - The window length
    /// * `config` - Settings of every per-window engine
    ///
    /// # Returns
    ///
    /// * `Result<Self, PairError>` - `DataError::TooShort` when the window is longer than
    ///   the history, `ConfigError` for invalid settings or a rolling window longer than
    ///   the evaluation window
    pub fn new(
        series: &'a AlignedSeriesPair<K, T>,
        spec: WindowSpec,
        config: EngineConfig,
    ) -> Result<Self, PairError> {
        config.validate()?;
        if config.rolling_window > spec.length() {
            return Err(ConfigError::RollingWindow {
                window: config.rolling_window,
                len: spec.length(),
            }
            .into());
        }
        if spec.length() > series.len() {
            return Err(DataError::TooShort {
                required: spec.length(),
                actual: series.len(),
            }
            .into());
        }
        Ok(Self {
            series,
            spec,
            config,
        })
    }

    /// Number of snapshots the evaluator produces
    #[inline]
    pub fn len(&self) -> usize {
        self.series.len() - self.spec.length()
    }

    /// Returns `true` if the history holds exactly one window length
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The window length in use
    #[inline]
    pub fn spec(&self) -> WindowSpec {
        self.spec
    }

    /// Lazily evaluates the windows in timestamp order
    ///
    /// The iterator can be dropped early and recreated at will; nothing is cached between
    /// windows.
    pub fn windows(&self) -> Windows<'_, 'a, K, T> {
        Windows {
            evaluator: self,
            ends: self.ends(),
        }
    }

    /// Evaluates the window whose last observation is at `end - 1`
    ///
    /// # Returns
    ///
    /// * `Option<StatisticsSnapshot<K, T>>` - `None` unless `end` lies in `L..M`
    pub fn snapshot_at(&self, end: usize) -> Option<StatisticsSnapshot<K, T>> {
        self.ends().contains(&end).then(|| self.evaluate_window(end))
    }

    /// Evaluates every window and returns the snapshots in timestamp order
    ///
    /// With the `parallel` feature the windows are spread over the rayon pool; the
    /// collected output keeps timestamp order either way.
    pub fn evaluate(&self) -> Vec<StatisticsSnapshot<K, T>> {
        #[cfg(feature = "parallel")]
        let snapshots: Vec<_> = {
            use rayon::prelude::*;

            self.ends()
                .into_par_iter()
                .map(|end| self.evaluate_window(end))
                .collect()
        };
        #[cfg(not(feature = "parallel"))]
        let snapshots: Vec<_> = self.windows().collect();

        let failed = snapshots.iter().filter(|s| !s.is_clean()).count();
        info!(
            windows = snapshots.len(),
            failed,
            length = self.spec.length(),
            "Evaluated sliding windows"
        );
        snapshots
    }

    /// Evaluates every window into the result table of `pair`
    pub fn history(&self, pair: PairId) -> PairHistory<K, T> {
        PairHistory {
            pair,
            snapshots: self.evaluate(),
        }
    }

    #[inline]
    fn ends(&self) -> Range<usize> {
        self.spec.length()..self.series.len()
    }

    fn evaluate_window(&self, end: usize) -> StatisticsSnapshot<K, T> {
        let window = self.series.slice(end - self.spec.length(), end);
        let timestamp = self.series.timestamps()[end - 1].clone();
        match PairStatistics::with_config(window.a, window.b, self.config) {
            Ok(stats) => {
                let snapshot = StatisticsSnapshot::capture(timestamp, &stats);
                if !snapshot.is_clean() {
                    debug!(
                        end,
                        failures = snapshot.failures.len(),
                        "Window fell back on some statistics"
                    );
                }
                snapshot
            }
            Err(err) => {
                debug!(end, error = %err, "Window could not be evaluated");
                let last_a = self.series.series_a()[end - 1];
                let last_b = self.series.series_b()[end - 1];
                StatisticsSnapshot::failed(timestamp, last_a, last_b, err)
            }
        }
    }
}

/// Lazy iterator over the snapshots of a [`WindowedEvaluator`]
#[derive(Debug, Clone)]
pub struct Windows<'e, 'a, K, T> {
    evaluator: &'e WindowedEvaluator<'a, K, T>,
    ends: Range<usize>,
}

impl<K, T> Iterator for Windows<'_, '_, K, T>
where
    K: Clone + Send + Sync,
    T: Float + Default + Send + Sync,
{
    type Item = StatisticsSnapshot<K, T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.ends
            .next()
            .map(|end| self.evaluator.evaluate_window(end))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ends.size_hint()
    }
}

impl<K, T> ExactSizeIterator for Windows<'_, '_, K, T>
where
    K: Clone + Send + Sync,
    T: Float + Default + Send + Sync,
{
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::utils::testing::{ar1, random_walk};

    fn sample_pair(n: usize) -> AlignedSeriesPair<u64, f64> {
        let b = random_walk(n, 11);
        let noise = ar1(0.3, n, 12);
        let a = b.iter().zip(&noise).map(|(x, e)| 1.5 * x + 2.0 + e).collect();
        AlignedSeriesPair::new((1000..1000 + n as u64).collect(), a, b).unwrap()
    }

    fn small_config() -> EngineConfig {
        EngineConfig {
            rolling_window: 10,
            ..Default::default()
        }
    }

    #[test]
    fn test_window_count_and_alignment() {
        let pair = sample_pair(80);
        let evaluator =
            WindowedEvaluator::new(&pair, WindowSpec::new(60).unwrap(), small_config()).unwrap();
        assert_eq!(evaluator.len(), 20);

        let snapshots = evaluator.evaluate();
        assert_eq!(snapshots.len(), 20);
        for (k, snap) in snapshots.iter().enumerate() {
            let last = 60 + k - 1;
            assert_eq!(snap.timestamp, 1000 + last as u64);
            assert_eq!(snap.last_a, pair.series_a()[last]);
            assert_eq!(snap.last_b, pair.series_b()[last]);
        }
        assert!(snapshots.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn test_lazy_windows_match_batch() {
        let pair = sample_pair(70);
        let evaluator =
            WindowedEvaluator::new(&pair, WindowSpec::new(60).unwrap(), small_config()).unwrap();
        let windows = evaluator.windows();
        assert_eq!(windows.len(), 10);
        let lazy: Vec<_> = windows.collect();
        assert_eq!(lazy, evaluator.evaluate());

        let first = evaluator.windows().next().unwrap();
        assert_eq!(Some(first), evaluator.snapshot_at(60));
        assert_eq!(evaluator.snapshot_at(59), None);
        assert_eq!(evaluator.snapshot_at(70), None);
    }

    #[test]
    fn test_snapshot_matches_standalone_engine() {
        let pair = sample_pair(90);
        let evaluator =
            WindowedEvaluator::new(&pair, WindowSpec::new(60).unwrap(), small_config()).unwrap();
        let snap = evaluator.snapshot_at(75).unwrap();

        let stats = PairStatistics::with_config(
            &pair.series_a()[15..75],
            &pair.series_b()[15..75],
            small_config(),
        )
        .unwrap();
        assert_eq!(snap.hedge_ratio, stats.hedge_ratio().value());
        assert_eq!(snap.correlation, stats.correlation().value());
        assert_eq!(snap.spread, *stats.spread().last().unwrap());
    }

    #[test]
    fn test_window_equal_to_history_yields_nothing() {
        let pair = sample_pair(30);
        let evaluator =
            WindowedEvaluator::new(&pair, WindowSpec::new(30).unwrap(), small_config()).unwrap();
        assert!(evaluator.is_empty());
        assert!(evaluator.evaluate().is_empty());
    }

    #[test]
    fn test_rejects_bad_configuration() {
        let pair = sample_pair(30);
        assert!(matches!(
            WindowedEvaluator::new(&pair, WindowSpec::new(31).unwrap(), small_config()),
            Err(PairError::Data(DataError::TooShort {
                required: 31,
                actual: 30
            }))
        ));
        assert!(matches!(
            WindowedEvaluator::new(&pair, WindowSpec::new(8).unwrap(), small_config()),
            Err(PairError::Config(ConfigError::RollingWindow {
                window: 10,
                len: 8
            }))
        ));
    }

    #[test]
    fn test_history_of_flat_pair_keeps_every_window() {
        let pair = AlignedSeriesPair::from_rows((0..12u32).map(|i| (i, 3.0, 1.5))).unwrap();
        let config = EngineConfig {
            rolling_window: 3,
            ..Default::default()
        };
        let evaluator = WindowedEvaluator::new(&pair, WindowSpec::new(6).unwrap(), config).unwrap();
        let history = evaluator.history(PairId::new("A", "B"));
        assert_eq!(history.len(), 6);
        assert_eq!(history.failed_windows(), 6);
        assert!(history.snapshots.iter().all(|s| !s.cointegrated));
        assert!(history.snapshots.iter().all(|s| s.hedge_ratio == 2.0));
    }
}
