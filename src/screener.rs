use ahash::RandomState;
use hashbrown::HashSet;
use num_traits::Float;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    AlignedSeriesPair, ConfigError, DataError, PairError, PairId, PairStatistics,
    PriceSeriesProvider, ScreenerConfig, StatFailure, Statistic, helper::cast,
};

/// Statistics that drive the acceptance of a pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScreeningMetrics<T> {
    /// Pearson correlation over the lookback window
    pub correlation: T,
    /// Engle-Granger verdict at the configured significance
    pub cointegrated: bool,
    /// Engle-Granger p-value
    pub coint_p_value: T,
    /// Raw half-life of the spread
    pub half_life: T,
    /// Whether the spread decays towards its mean
    pub mean_reverting: bool,
    /// Hedge ratio of the spread
    pub hedge_ratio: T,
}

/// Why a candidate pair was not accepted
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Rejection {
    /// The provider could not serve the pair
    #[error("price history unavailable: {0}")]
    Provider(String),
    /// The lookback window could not be evaluated at all
    #[error("statistics unavailable: {0}")]
    Engine(PairError),
    /// A statistic the decision depends on fell back
    #[error("{0}")]
    Statistic(StatFailure),
    /// Correlation not above the minimum
    #[error("correlation not above the minimum")]
    WeakCorrelation,
    /// Cointegration p-value not below the significance
    #[error("not cointegrated")]
    NotCointegrated,
    /// Half-life not mean reverting or longer than the maximum
    #[error("half-life out of range")]
    HalfLifeOutOfRange,
    /// The pair already appeared earlier in the candidate list
    #[error("duplicate candidate")]
    Duplicate,
}

impl Rejection {
    /// Returns `true` if the pair was rejected because something failed, not because
    /// its statistics fell short of the thresholds
    #[inline]
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Rejection::Provider(_) | Rejection::Engine(_) | Rejection::Statistic(_)
        )
    }
}

/// Outcome of screening one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningResult<T> {
    /// Symbols of the candidate
    pub pair: PairId,
    /// Whether every predicate held
    pub passed: bool,
    /// The statistics, when the window could be evaluated
    pub metrics: Option<ScreeningMetrics<T>>,
    /// The first failed predicate of a rejected pair
    pub rejection: Option<Rejection>,
}

impl<T> ScreeningResult<T> {
    fn rejected(pair: PairId, metrics: Option<ScreeningMetrics<T>>, rejection: Rejection) -> Self {
        Self {
            pair,
            passed: false,
            metrics,
            rejection: Some(rejection),
        }
    }
}

/// Results of a screening run, one per candidate in candidate order
#[derive(Debug, Clone, PartialEq)]
pub struct ScreeningReport<T> {
    /// Per-candidate outcomes
    pub results: Vec<ScreeningResult<T>>,
}

impl<T> ScreeningReport<T> {
    /// Accepted pairs, in candidate order
    pub fn accepted(&self) -> Vec<PairId> {
        self.results
            .iter()
            .filter(|r| r.passed)
            .map(|r| r.pair.clone())
            .collect()
    }

    /// Accepted pairs as a JSON array of two-element symbol arrays
    ///
    /// # Examples
    ///
    /// ```
    /// use ta_pairs::ScreeningReport;
    ///
    /// let report = ScreeningReport::<f64> { results: vec![] };
    /// assert_eq!(report.to_json().unwrap(), "[]");
    /// ```
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.accepted())
    }

    /// Number of screened candidates
    #[inline]
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns `true` if no candidate was screened
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Number of candidates rejected because something failed
    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.rejection.as_ref().is_some_and(Rejection::is_failure))
            .count()
    }
}

/// Filters a universe of candidate pairs on a single lookback window each.
///
/// A pair is accepted iff its correlation is above the minimum, it is cointegrated at
/// the engine's significance, and its spread is mean reverting with a half-life in
/// `(0, max_half_life]`. Any statistic the decision needs that falls back rejects the
/// pair; a rejected pair never stops the screening of the others.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScreener {
    config: ScreenerConfig,
}

impl PairScreener {
    /// Creates a screener
    ///
    /// # Arguments
    ///
    /// * `config` - Thresholds, lookback and engine settings
    ///
    /// # Returns
    ///
    /// * `Result<Self, ConfigError>` - The screener, or the first invalid setting
    pub fn new(config: ScreenerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The settings of the screener
    #[inline]
    pub fn config(&self) -> &ScreenerConfig {
        &self.config
    }

    /// Applies the acceptance predicate to already computed metrics
    ///
    /// # Returns
    ///
    /// * `Option<Rejection>` - `None` when the pair is accepted, otherwise the first
    ///   failed predicate in the order correlation, cointegration, half-life
    pub fn judge<T: Float>(&self, metrics: &ScreeningMetrics<T>) -> Option<Rejection> {
        let min_correlation: T = cast(self.config.min_correlation);
        let max_half_life: T = cast(self.config.max_half_life);
        if metrics.correlation.is_nan() || metrics.correlation <= min_correlation {
            return Some(Rejection::WeakCorrelation);
        }
        if !metrics.cointegrated {
            return Some(Rejection::NotCointegrated);
        }
        let in_range = metrics.half_life > T::zero() && metrics.half_life <= max_half_life;
        if !(metrics.mean_reverting && in_range) {
            return Some(Rejection::HalfLifeOutOfRange);
        }
        None
    }

    /// Screens one pair on the trailing lookback window of `series`
    pub fn screen_pair<K, T>(
        &self,
        pair: PairId,
        series: &AlignedSeriesPair<K, T>,
    ) -> ScreeningResult<T>
    where
        T: Float + Default,
    {
        let lookback = self.config.lookback.length();
        let window = series.tail(lookback);
        if window.len() < lookback {
            let err = DataError::TooShort {
                required: lookback,
                actual: window.len(),
            };
            debug!(pair = %pair, error = %err, "Lookback window too short");
            return ScreeningResult::rejected(pair, None, Rejection::Engine(err.into()));
        }

        let stats = match PairStatistics::with_config(window.a, window.b, self.config.engine) {
            Ok(stats) => stats,
            Err(err) => {
                debug!(pair = %pair, error = %err, "Statistics unavailable");
                return ScreeningResult::rejected(pair, None, Rejection::Engine(err));
            }
        };

        let correlation = stats.correlation();
        let cointegration = stats.cointegration();
        let half_life = stats.half_life();
        let metrics = ScreeningMetrics {
            correlation: correlation.value(),
            cointegrated: stats.is_cointegrated(),
            coint_p_value: cointegration.as_value().p_value,
            half_life: half_life.as_value().value,
            mean_reverting: half_life.as_value().is_mean_reverting(),
            hedge_ratio: stats.hedge_ratio().value(),
        };

        let failure = [
            (Statistic::HedgeRatio, stats.hedge_ratio().error()),
            (Statistic::Correlation, correlation.error()),
            (Statistic::Cointegration, cointegration.error()),
            (Statistic::HalfLife, half_life.error()),
        ]
        .into_iter()
        .find_map(|(statistic, error)| {
            error.map(|error| StatFailure {
                statistic,
                error: error.clone(),
            })
        });

        let rejection = failure.map(Rejection::Statistic).or_else(|| self.judge(&metrics));
        match rejection {
            None => {
                debug!(pair = %pair, "Pair accepted");
                ScreeningResult {
                    pair,
                    passed: true,
                    metrics: Some(metrics),
                    rejection: None,
                }
            }
            Some(rejection) => {
                debug!(pair = %pair, reason = %rejection, "Pair rejected");
                ScreeningResult::rejected(pair, Some(metrics), rejection)
            }
        }
    }

    /// Screens every candidate, fetching its lookback window from `provider`
    ///
    /// Histories are fetched one candidate at a time; the statistics run in parallel
    /// with the `parallel` feature. Results keep candidate order, and a candidate that
    /// repeats an earlier one is rejected as [`Rejection::Duplicate`] without a fetch.
    pub fn screen<K, T, P>(&self, provider: &mut P, candidates: &[PairId]) -> ScreeningReport<T>
    where
        K: Send + Sync,
        T: Float + Default + Send + Sync,
        P: PriceSeriesProvider<K, T>,
    {
        let lookback = self.config.lookback.length();
        let mut seen: HashSet<PairId, RandomState> =
            HashSet::with_capacity_and_hasher(candidates.len(), RandomState::default());

        let fetched: Vec<(PairId, Result<AlignedSeriesPair<K, T>, Rejection>)> = candidates
            .iter()
            .map(|pair| {
                if !seen.insert(pair.clone()) {
                    return (pair.clone(), Err(Rejection::Duplicate));
                }
                let series = provider.fetch(pair, lookback).map_err(|err| {
                    warn!(pair = %pair, error = %err, "Provider failed");
                    Rejection::Provider(err.to_string())
                });
                (pair.clone(), series)
            })
            .collect();

        let evaluate = |(pair, series): (PairId, Result<AlignedSeriesPair<K, T>, Rejection>)| {
            match series {
                Ok(series) => self.screen_pair(pair, &series),
                Err(rejection) => ScreeningResult::rejected(pair, None, rejection),
            }
        };

        #[cfg(feature = "parallel")]
        let results: Vec<ScreeningResult<T>> = {
            use rayon::prelude::*;

            fetched.into_par_iter().map(evaluate).collect()
        };
        #[cfg(not(feature = "parallel"))]
        let results: Vec<ScreeningResult<T>> = fetched.into_iter().map(evaluate).collect();

        let report = ScreeningReport { results };
        info!(
            candidates = report.len(),
            accepted = report.accepted().len(),
            failures = report.failures(),
            "Screening complete"
        );
        report
    }
}
