#![doc = include_str!("../README.md")]
#![deny(
    unsafe_code,
    unused_imports,
    unused_variables,
    unused_must_use,
    missing_docs,
    clippy::all,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::dbg_macro,
    clippy::todo,
    clippy::unimplemented
)]
#![allow(clippy::len_without_is_empty)]

pub(crate) type Kbn<T> = compensated_summation::KahanBabuskaNeumaier<T>;

mod utils;
pub(crate) use utils::helper;

mod error;
pub use error::{ConfigError, DataError, NumericalError, PairError, Result};

mod config;
pub use config::{
    AdfConfig, EngineConfig, InfoCriterion, LagConvention, ScreenerConfig, Trend, WindowSpec,
};

mod estimate;
pub use estimate::{Estimate, HalfLife, StatFailure, Statistic, TestResult};

pub mod hypothesis;

mod rolling;
pub use rolling::RollingZScore;

mod series;
pub use series::{AlignedSeriesPair, PairId, PairSlice};

mod pair_statistics;
pub use pair_statistics::PairStatistics;

mod snapshot;
pub use snapshot::{PairHistory, StatisticsSnapshot};

mod evaluator;
pub use evaluator::{WindowedEvaluator, Windows};

mod screener;
pub use screener::{PairScreener, Rejection, ScreeningMetrics, ScreeningReport, ScreeningResult};

mod interfaces;
pub use interfaces::{PriceSeriesProvider, ResultSink};

pub mod pipeline;
pub use pipeline::BatchSummary;
