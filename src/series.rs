use core::fmt;

use num_traits::Float;
use serde::{Deserialize, Serialize};

use crate::{DataError, helper::first_non_finite};

/// Two price series aligned on a shared, strictly increasing timestamp sequence.
///
/// Every constructor checks the invariants once, so the evaluator and the screener can
/// slice the pair freely: equal lengths, at least two observations, finite values and
/// strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeriesPair<K, T> {
    timestamps: Vec<K>,
    a: Vec<T>,
    b: Vec<T>,
}

impl<K: Ord + Clone, T: Float> AlignedSeriesPair<K, T> {
    /// Creates an aligned pair from its columns
    ///
    /// # Arguments
    ///
    /// * `timestamps` - Strictly increasing observation times
    /// * `a` - The first series
    /// * `b` - The second series
    ///
    /// # Returns
    ///
    /// * `Result<Self, DataError>` - The pair, or the first violated invariant
    pub fn new(timestamps: Vec<K>, a: Vec<T>, b: Vec<T>) -> Result<Self, DataError> {
        if a.len() != b.len() {
            return Err(DataError::LengthMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        if timestamps.len() != a.len() {
            return Err(DataError::LengthMismatch {
                left: timestamps.len(),
                right: a.len(),
            });
        }
        if a.len() < 2 {
            return Err(DataError::TooShort {
                required: 2,
                actual: a.len(),
            });
        }
        if let Some(index) = first_non_finite(&a).or_else(|| first_non_finite(&b)) {
            return Err(DataError::NonFinite { index });
        }
        if let Some(index) = timestamps.windows(2).position(|w| w[0] >= w[1]) {
            return Err(DataError::UnorderedTimestamps { index: index + 1 });
        }
        Ok(Self { timestamps, a, b })
    }

    /// Creates an aligned pair from `(timestamp, a, b)` rows
    pub fn from_rows<I>(rows: I) -> Result<Self, DataError>
    where
        I: IntoIterator<Item = (K, T, T)>,
    {
        let rows = rows.into_iter();
        let (lower, _) = rows.size_hint();
        let mut timestamps = Vec::with_capacity(lower);
        let mut a = Vec::with_capacity(lower);
        let mut b = Vec::with_capacity(lower);
        for (ts, va, vb) in rows {
            timestamps.push(ts);
            a.push(va);
            b.push(vb);
        }
        Self::new(timestamps, a, b)
    }

    /// Aligns two independently sampled series on the timestamps they share
    ///
    /// Inputs may arrive in any order; a timestamp repeated within one side keeps its
    /// first value. Timestamps present on only one side are dropped.
    ///
    /// # Arguments
    ///
    /// * `left` - `(timestamp, value)` observations of the first series
    /// * `right` - `(timestamp, value)` observations of the second series
    ///
    /// # Returns
    ///
    /// * `Result<Self, DataError>` - The inner join, which must still hold two observations
    pub fn inner_join(left: &[(K, T)], right: &[(K, T)]) -> Result<Self, DataError> {
        let left = sorted_unique(left);
        let right = sorted_unique(right);

        let capacity = left.len().min(right.len());
        let mut timestamps = Vec::with_capacity(capacity);
        let mut a = Vec::with_capacity(capacity);
        let mut b = Vec::with_capacity(capacity);

        let (mut i, mut j) = (0, 0);
        while i < left.len() && j < right.len() {
            match left[i].0.cmp(&right[j].0) {
                core::cmp::Ordering::Less => i += 1,
                core::cmp::Ordering::Greater => j += 1,
                core::cmp::Ordering::Equal => {
                    timestamps.push(left[i].0.clone());
                    a.push(left[i].1);
                    b.push(right[j].1);
                    i += 1;
                    j += 1;
                }
            }
        }
        Self::new(timestamps, a, b)
    }
}

impl<K, T> AlignedSeriesPair<K, T> {
    /// Number of aligned observations
    #[inline]
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Always `false` for a constructed pair, kept for slice-like ergonomics
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Observation times
    #[inline]
    pub fn timestamps(&self) -> &[K] {
        &self.timestamps
    }

    /// The first series
    #[inline]
    pub fn series_a(&self) -> &[T] {
        &self.a
    }

    /// The second series
    #[inline]
    pub fn series_b(&self) -> &[T] {
        &self.b
    }

    /// The trailing `n` observations, or all of them when fewer are available
    pub fn tail(&self, n: usize) -> PairSlice<'_, K, T> {
        let start = self.len().saturating_sub(n);
        self.slice(start, self.len())
    }

    /// Observations `start..end`
    #[inline]
    pub(crate) fn slice(&self, start: usize, end: usize) -> PairSlice<'_, K, T> {
        PairSlice {
            timestamps: &self.timestamps[start..end],
            a: &self.a[start..end],
            b: &self.b[start..end],
        }
    }
}

/// A borrowed run of consecutive observations of an [`AlignedSeriesPair`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairSlice<'a, K, T> {
    /// Observation times
    pub timestamps: &'a [K],
    /// The first series
    pub a: &'a [T],
    /// The second series
    pub b: &'a [T],
}

impl<K, T> PairSlice<'_, K, T> {
    /// Number of observations in the slice
    #[inline]
    pub fn len(&self) -> usize {
        self.a.len()
    }

    /// Returns `true` if the slice holds no observation
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.a.is_empty()
    }

    /// Time of the last observation
    #[inline]
    pub fn last_timestamp(&self) -> Option<&K> {
        self.timestamps.last()
    }
}

fn sorted_unique<K: Ord + Clone, T: Copy>(rows: &[(K, T)]) -> Vec<(K, T)> {
    let mut rows = rows.to_vec();
    rows.sort_by(|x, y| x.0.cmp(&y.0));
    rows.dedup_by(|next, kept| next.0 == kept.0);
    rows
}

/// Symbols of a candidate pair, serialized as a two-element array
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PairId(pub String, pub String);

impl PairId {
    /// Creates a pair identifier
    pub fn new(a: impl Into<String>, b: impl Into<String>) -> Self {
        Self(a.into(), b.into())
    }

    /// Symbol of the first (dependent) series
    #[inline]
    pub fn first(&self) -> &str {
        &self.0
    }

    /// Symbol of the second (regressor) series
    #[inline]
    pub fn second(&self) -> &str {
        &self.1
    }
}

impl fmt::Display for PairId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}
