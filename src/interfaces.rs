//! Contracts of the collaborators around the statistics core
//!
//! Price acquisition and result persistence live outside this crate; the batch
//! functions in [`pipeline`](crate::pipeline) only talk to them through these traits.

use core::fmt::Display;

use crate::{AlignedSeriesPair, PairHistory, PairId};

/// Source of aligned price history for a pair
pub trait PriceSeriesProvider<K, T> {
    /// Error reported when a pair cannot be served
    type Error: Display;

    /// Returns up to `bars` trailing observations of `pair`, already inner-joined
    ///
    /// # Arguments
    ///
    /// * `pair` - Symbols of the two series
    /// * `bars` - Number of trailing observations requested
    ///
    /// # Returns
    ///
    /// * `Result<AlignedSeriesPair<K, T>, Self::Error>` - The aligned history
    fn fetch(&mut self, pair: &PairId, bars: usize) -> Result<AlignedSeriesPair<K, T>, Self::Error>;
}

/// Destination of evaluation results
pub trait ResultSink<K, T> {
    /// Error reported when a result cannot be stored
    type Error: Display;

    /// Stores the per-pair result table of a backtest
    ///
    /// Serializing the snapshots directly names the close columns `Close A` and
    /// `Close B`; write [`PairHistory::columns`] with [`PairHistory::rows`] to get the
    /// `<symbol> Close` header.
    fn write_history(&mut self, history: &PairHistory<K, T>) -> Result<(), Self::Error>;

    /// Stores the pairs that passed screening, in candidate order
    fn write_accepted(&mut self, pairs: &[PairId]) -> Result<(), Self::Error>;
}
