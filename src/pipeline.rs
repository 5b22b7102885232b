//! Batch runs wiring a [`PriceSeriesProvider`] through the statistics into a [`ResultSink`]
//!
//! Both runs process every pair: a provider, evaluation or sink failure is logged and
//! counted, and the batch moves on to the next pair.

use num_traits::Float;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    EngineConfig, PairId, PairScreener, PriceSeriesProvider, ResultSink, WindowSpec,
    WindowedEvaluator,
};

/// Bars of history evaluated per pair by a backtest, on top of one window length
pub const DEFAULT_HISTORY_BARS: usize = 28_800;

/// Counts of a batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    /// Pairs handed to the run
    pub processed: usize,
    /// Pairs whose result reached the sink
    pub succeeded: usize,
    /// Pairs evaluated but not accepted by the screener
    pub rejected: usize,
    /// Pairs lost to a provider, evaluation or sink failure
    pub failed: usize,
}

/// Backtests every pair over a sliding window and stores one result table per pair
///
/// # Arguments
///
/// * `provider` - Source of the aligned histories
/// * `sink` - Destination of the result tables
/// * `pairs` - The pairs to backtest
/// * `spec` - The sliding window
/// * `config` - Settings of every per-window engine
/// * `history_bars` - Windows per pair; `history_bars + spec.length()` bars are requested
///
/// # Returns
///
/// * `BatchSummary` - How many pairs were stored and how many failed
pub fn backtest_pairs<K, T, P, S>(
    provider: &mut P,
    sink: &mut S,
    pairs: &[PairId],
    spec: WindowSpec,
    config: EngineConfig,
    history_bars: usize,
) -> BatchSummary
where
    K: Clone + Send + Sync,
    T: Float + Default + Send + Sync,
    P: PriceSeriesProvider<K, T>,
    S: ResultSink<K, T>,
{
    let bars = history_bars + spec.length();
    let mut summary = BatchSummary {
        processed: pairs.len(),
        ..Default::default()
    };

    for pair in pairs {
        let series = match provider.fetch(pair, bars) {
            Ok(series) => series,
            Err(err) => {
                warn!(pair = %pair, error = %err, "Provider failed, skipping pair");
                summary.failed += 1;
                continue;
            }
        };
        let evaluator = match WindowedEvaluator::new(&series, spec, config) {
            Ok(evaluator) => evaluator,
            Err(err) => {
                warn!(pair = %pair, error = %err, "Cannot evaluate pair");
                summary.failed += 1;
                continue;
            }
        };

        let history = evaluator.history(pair.clone());
        info!(
            pair = %pair,
            windows = history.len(),
            failed_windows = history.failed_windows(),
            "Backtest evaluated"
        );
        match sink.write_history(&history) {
            Ok(()) => summary.succeeded += 1,
            Err(err) => {
                warn!(pair = %pair, error = %err, "Sink failed to store history");
                summary.failed += 1;
            }
        }
    }

    info!(
        processed = summary.processed,
        succeeded = summary.succeeded,
        failed = summary.failed,
        "Backtest batch complete"
    );
    summary
}

/// Screens the candidates and stores the accepted pairs
///
/// # Returns
///
/// * `BatchSummary` - Accepted pairs count as succeeded once stored; a sink failure
///   turns them into failures
pub fn screen_and_store<K, T, P, S>(
    provider: &mut P,
    sink: &mut S,
    candidates: &[PairId],
    screener: &PairScreener,
) -> BatchSummary
where
    K: Send + Sync,
    T: Float + Default + Send + Sync,
    P: PriceSeriesProvider<K, T>,
    S: ResultSink<K, T>,
{
    let report = screener.screen(provider, candidates);
    let accepted = report.accepted();
    let failures = report.failures();

    let mut summary = BatchSummary {
        processed: report.len(),
        succeeded: accepted.len(),
        rejected: report.len() - accepted.len() - failures,
        failed: failures,
    };

    if let Err(err) = sink.write_accepted(&accepted) {
        warn!(error = %err, accepted = accepted.len(), "Sink failed to store accepted pairs");
        summary.failed += summary.succeeded;
        summary.succeeded = 0;
    }

    info!(
        processed = summary.processed,
        accepted = summary.succeeded,
        rejected = summary.rejected,
        failed = summary.failed,
        "Screening batch complete"
    );
    summary
}
