use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Deterministic terms included in a unit root regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Trend {
    /// No deterministic terms
    #[serde(rename = "n")]
    None,
    /// A constant
    #[default]
    #[serde(rename = "c")]
    Constant,
}

impl Trend {
    /// Number of deterministic regressors the trend adds
    #[inline]
    pub const fn regressors(&self) -> usize {
        match self {
            Trend::None => 0,
            Trend::Constant => 1,
        }
    }
}

/// Information criterion used to pick the number of lagged differences
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoCriterion {
    /// Akaike information criterion
    #[default]
    Aic,
    /// Bayesian information criterion
    Bic,
}

/// How the lagged spread is built for the half-life regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LagConvention {
    /// `lag[i] = spread[i - 1]`, the first observation is dropped
    #[default]
    Shifted,
    /// `lag[0] = spread[0]`, keeps every observation with a zero first difference
    SelfReferential,
}

/// Lag selection of the Augmented Dickey-Fuller regression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdfConfig {
    /// Largest number of lagged differences, `ceil(12 * (n / 100)^(1/4))` when unset
    pub max_lag: Option<usize>,
    /// Criterion to search `0..=max_lag`, or `None` to use `max_lag` as is
    pub autolag: Option<InfoCriterion>,
}

impl Default for AdfConfig {
    fn default() -> Self {
        Self {
            max_lag: None,
            autolag: Some(InfoCriterion::Aic),
        }
    }
}

/// Settings of a [`PairStatistics`](crate::PairStatistics) instance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// p-value below which a unit root is rejected
    pub significance: f64,
    /// Window of the rolling z-score
    pub rolling_window: usize,
    /// Delta degrees of freedom of the full-window z-score
    pub ddof: bool,
    /// Delta degrees of freedom of the rolling z-score
    pub rolling_ddof: bool,
    /// Lag selection of the unit root tests
    pub adf: AdfConfig,
    /// Lag construction of the half-life regression
    pub half_life_lag: LagConvention,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            significance: 0.05,
            rolling_window: 21,
            ddof: false,
            rolling_ddof: true,
            adf: AdfConfig::default(),
            half_life_lag: LagConvention::default(),
        }
    }
}

impl EngineConfig {
    /// Parses a JSON document, missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the settings
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - The first invalid setting, if any
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_significance(self.significance)?;
        let min_window = 1 + usize::from(self.rolling_ddof);
        if self.rolling_window < min_window {
            return Err(ConfigError::RollingWindow {
                window: self.rolling_window,
                len: min_window,
            });
        }
        Ok(())
    }
}

/// Length of the sliding window, the stride is always one observation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "usize", into = "usize")]
pub struct WindowSpec {
    length: usize,
}

impl WindowSpec {
    /// Smallest window a regression can be fitted on
    pub const MIN_LENGTH: usize = 2;

    /// Creates a window of `length` observations
    ///
    /// # Arguments
    ///
    /// * `length` - Observations per window, at least two
    ///
    /// # Returns
    ///
    /// * `Result<Self, ConfigError>` - The window, or `ConfigError::WindowLength`
    pub fn new(length: usize) -> Result<Self, ConfigError> {
        if length < Self::MIN_LENGTH {
            return Err(ConfigError::WindowLength(length));
        }
        Ok(Self { length })
    }

    /// Observations per window
    #[inline]
    pub const fn length(&self) -> usize {
        self.length
    }

    /// Observations the window advances per step
    #[inline]
    pub const fn stride(&self) -> usize {
        1
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self { length: 288 }
    }
}

impl TryFrom<usize> for WindowSpec {
    type Error = ConfigError;

    fn try_from(length: usize) -> Result<Self, Self::Error> {
        Self::new(length)
    }
}

impl From<WindowSpec> for usize {
    fn from(spec: WindowSpec) -> Self {
        spec.length
    }
}

/// Acceptance thresholds and lookback of the [`PairScreener`](crate::PairScreener)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerConfig {
    /// Correlation must be strictly above this value
    pub min_correlation: f64,
    /// Half-life must lie in `(0, max_half_life]`
    pub max_half_life: f64,
    /// Observations of the single lookback window
    pub lookback: WindowSpec,
    /// Settings of the per-pair engine, its significance drives the cointegration verdict
    pub engine: EngineConfig,
}

impl Default for ScreenerConfig {
    fn default() -> Self {
        Self {
            min_correlation: 0.7,
            max_half_life: 35.0,
            lookback: WindowSpec::default(),
            engine: EngineConfig::default(),
        }
    }
}

impl ScreenerConfig {
    /// Parses a JSON document, missing fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the thresholds and the engine settings
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-1.0..1.0).contains(&self.min_correlation) {
            return Err(ConfigError::Threshold {
                name: "min_correlation",
                value: self.min_correlation,
            });
        }
        if self.max_half_life.is_nan() || self.max_half_life <= 0.0 {
            return Err(ConfigError::Threshold {
                name: "max_half_life",
                value: self.max_half_life,
            });
        }
        self.engine.validate()
    }
}

fn validate_significance(significance: f64) -> Result<(), ConfigError> {
    if significance > 0.0 && significance < 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Significance(significance))
    }
}
