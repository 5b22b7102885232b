use num_traits::Float;
use serde::Serialize;

use crate::{PairError, PairId, PairStatistics, StatFailure, Statistic};

/// Serialized keys of a snapshot, in table column order
const ROW_KEYS: [&str; 10] = [
    "Date",
    "Close A",
    "Close B",
    "Correlation",
    "Is Cointegrated",
    "Spread",
    "Z-Score",
    "Z-Score Rolling",
    "Half-Life",
    "Hedge Ratio",
];

/// Result of evaluating one window, keyed by the window's last timestamp.
///
/// Serializes with the column names of the per-pair result table. The p-value, the
/// mean reversion flag and the failures are carried alongside for callers but are not
/// part of the table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatisticsSnapshot<K, T> {
    /// Timestamp of the last bar in the window
    #[serde(rename = "Date")]
    pub timestamp: K,
    /// Last value of the first series
    #[serde(rename = "Close A")]
    pub last_a: T,
    /// Last value of the second series
    #[serde(rename = "Close B")]
    pub last_b: T,
    /// Pearson correlation over the window
    #[serde(rename = "Correlation")]
    pub correlation: T,
    /// Engle-Granger verdict at the configured significance
    #[serde(rename = "Is Cointegrated")]
    pub cointegrated: bool,
    /// Engle-Granger p-value
    #[serde(skip)]
    pub coint_p_value: T,
    /// Spread at the window end
    #[serde(rename = "Spread")]
    pub spread: T,
    /// Full-window z-score at the window end
    #[serde(rename = "Z-Score")]
    pub zscore: T,
    /// Rolling z-score at the window end
    #[serde(rename = "Z-Score Rolling")]
    pub zscore_rolling: Option<T>,
    /// Raw half-life, negative or infinite when the spread does not revert
    #[serde(rename = "Half-Life")]
    pub half_life: T,
    /// Whether the half-life regression found a decaying spread
    #[serde(skip)]
    pub mean_reverting: bool,
    /// Hedge ratio shared by the spread, z-scores and half-life
    #[serde(rename = "Hedge Ratio")]
    pub hedge_ratio: T,
    /// Statistics that fell back in this window
    #[serde(skip)]
    pub failures: Vec<StatFailure>,
}

impl<K, T: Float + Default> StatisticsSnapshot<K, T> {
    /// Captures the table row of one window
    ///
    /// Evaluates the correlation, cointegration, half-life and both z-scores; the
    /// stationarity test is not part of the row and is left unevaluated.
    pub fn capture(timestamp: K, stats: &PairStatistics<'_, T>) -> Self {
        let last = |xs: &[T]| xs.last().copied().unwrap_or_else(T::nan);

        let correlation = stats.correlation();
        let hedge_ratio = stats.hedge_ratio();
        let cointegration = stats.cointegration();
        let half_life = stats.half_life();
        let zscore = stats.zscore();
        let rolling = stats.zscore_rolling();

        let failures = [
            (Statistic::Correlation, correlation.error()),
            (Statistic::HedgeRatio, hedge_ratio.error()),
            (Statistic::Cointegration, cointegration.error()),
            (Statistic::HalfLife, half_life.error()),
            (Statistic::ZScore, zscore.error()),
            (Statistic::RollingZScore, rolling.error()),
        ]
        .into_iter()
        .filter_map(|(statistic, error)| {
            error.map(|error| StatFailure {
                statistic,
                error: error.clone(),
            })
        })
        .collect();

        Self {
            timestamp,
            last_a: last(stats.series_a()),
            last_b: last(stats.series_b()),
            correlation: correlation.value(),
            cointegrated: stats.is_cointegrated(),
            coint_p_value: cointegration.as_value().p_value,
            spread: last(stats.spread()),
            zscore: last(zscore.as_value().as_slice()),
            zscore_rolling: rolling.as_value().last().copied().flatten(),
            half_life: half_life.as_value().value,
            mean_reverting: half_life.as_value().is_mean_reverting(),
            hedge_ratio: hedge_ratio.value(),
            failures,
        }
    }

    /// A row for a window whose statistics could not be constructed at all
    ///
    /// Every statistic is reported as failed with `error`; numeric fields are NaN and
    /// the verdicts are negative.
    pub fn failed(timestamp: K, last_a: T, last_b: T, error: PairError) -> Self {
        let failures = [
            Statistic::Correlation,
            Statistic::HedgeRatio,
            Statistic::Cointegration,
            Statistic::HalfLife,
            Statistic::ZScore,
            Statistic::RollingZScore,
        ]
        .into_iter()
        .map(|statistic| StatFailure {
            statistic,
            error: error.clone(),
        })
        .collect();

        Self {
            timestamp,
            last_a,
            last_b,
            correlation: T::nan(),
            cointegrated: false,
            coint_p_value: T::one(),
            spread: T::nan(),
            zscore: T::nan(),
            zscore_rolling: None,
            half_life: T::nan(),
            mean_reverting: false,
            hedge_ratio: T::nan(),
            failures,
        }
    }

    /// Returns `true` if every statistic in the row was computed
    #[inline]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Time-ordered snapshots of one pair, the per-pair result table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairHistory<K, T> {
    /// Symbols of the pair
    pub pair: PairId,
    /// One row per window, in ascending timestamp order
    pub snapshots: Vec<StatisticsSnapshot<K, T>>,
}

impl<K, T: Float + Default> PairHistory<K, T> {
    /// Column header of the table with the pair's symbols filled in
    pub fn columns(&self) -> [String; 10] {
        [
            "Date".to_owned(),
            format!("{} Close", self.pair.first()),
            format!("{} Close", self.pair.second()),
            "Correlation".to_owned(),
            "Is Cointegrated".to_owned(),
            "Spread".to_owned(),
            "Z-Score".to_owned(),
            "Z-Score Rolling".to_owned(),
            "Half-Life".to_owned(),
            "Hedge Ratio".to_owned(),
        ]
    }

    /// Table rows in the order of [`columns`](Self::columns)
    ///
    /// A serialized [`StatisticsSnapshot`] names the closes `Close A` and `Close B`
    /// because it does not know the symbols; these rows are positional, so pairing them
    /// with `columns()` gives the table with the symbol names in its header. Non-finite
    /// values become `null`.
    pub fn rows(&self) -> Result<Vec<Vec<serde_json::Value>>, serde_json::Error>
    where
        K: Serialize,
        T: Serialize,
    {
        self.snapshots
            .iter()
            .map(|snap| {
                let mut record = serde_json::to_value(snap)?;
                Ok(ROW_KEYS
                    .iter()
                    .map(|key| {
                        record
                            .get_mut(*key)
                            .map(serde_json::Value::take)
                            .unwrap_or_default()
                    })
                    .collect())
            })
            .collect()
    }

    /// Number of rows
    #[inline]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns `true` if no window was evaluated
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Number of windows whose correlation is strictly above `threshold`
    pub fn highly_correlated_windows(&self, threshold: T) -> usize {
        self.snapshots
            .iter()
            .filter(|s| s.correlation > threshold)
            .count()
    }

    /// Number of windows with at least one failed statistic
    pub fn failed_windows(&self) -> usize {
        self.snapshots.iter().filter(|s| !s.is_clean()).count()
    }
}
