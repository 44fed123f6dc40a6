//! Forecast pipeline configuration types.

use forecast_spi::{ForecastError, Result, ScalerKind, TrainingOptions, VariationStrategy};
use serde::{Deserialize, Serialize};

/// Readings the dataset must hold before a train is attempted.
pub const MIN_TRAINING_POINTS: usize = 25;

/// Largest horizon a single forecast may request (14 days of hours).
pub const MAX_FORECAST_STEPS: usize = 336;

/// Horizon used when the caller does not ask for one (7 days of hours).
pub const DEFAULT_FORECAST_STEPS: usize = 168;

/// Extra points required on top of `lookback` before training.
pub const TRAINING_MARGIN: usize = 10;

/// Layer sizes and optimizer settings of the recurrent network.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Units of the first LSTM layer (returns the full sequence)
    pub first_units: usize,
    /// Units of the second LSTM layer (returns the final state)
    pub second_units: usize,
    /// Units of the ReLU dense layer before the linear output
    pub dense_units: usize,
    /// Dropout rate after each LSTM layer
    pub dropout: f64,
    /// Adam learning rate
    pub learning_rate: f64,
}

impl NetworkConfig {
    pub fn new(first_units: usize, second_units: usize) -> Self {
        Self {
            first_units,
            second_units,
            ..Self::default()
        }
    }

    fn validate(&self) -> Result<()> {
        for (name, units) in [
            ("network.first_units", self.first_units),
            ("network.second_units", self.second_units),
            ("network.dense_units", self.dense_units),
        ] {
            if units == 0 {
                return Err(ForecastError::invalid_parameter(name, "must be at least 1"));
            }
        }
        if !(0.0..1.0).contains(&self.dropout) {
            return Err(ForecastError::invalid_parameter(
                "network.dropout",
                "must be in [0, 1)",
            ));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(ForecastError::invalid_parameter(
                "network.learning_rate",
                "must be a positive finite number",
            ));
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            first_units: 64,
            second_units: 32,
            dense_units: 25,
            dropout: 0.2,
            learning_rate: 0.001,
        }
    }
}

/// Which hour of day the post-hoc day/night factor starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HourAnchor {
    /// The local wall-clock hour at the time of the forecast call
    #[default]
    WallClock,
    /// The UTC hour of the first forecast timestamp
    Origin,
}

/// Complete configuration of a forecasting pipeline.
///
/// The three historical predictor variants are available as presets:
/// [`ForecastConfig::standard`], [`ForecastConfig::hybrid`] and
/// [`ForecastConfig::advanced`] (the default).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForecastConfig {
    pub scaler_kind: ScalerKind,
    /// Window length fed to the model
    pub lookback: usize,
    /// Fixed epoch budget
    pub epochs: usize,
    pub batch_size: usize,
    /// Fraction of training examples held out for validation, in `[0, 1)`
    pub validation_split: f64,
    pub variation: VariationStrategy,
    pub network: NetworkConfig,
    /// Upper bound on the number of held-out points in the backtest
    pub backtest_horizon: usize,
    /// Minimum dataset size accepted by the service
    pub min_training_points: usize,
    /// Largest accepted forecast horizon
    pub max_steps: usize,
    pub hour_anchor: HourAnchor,
    /// Seed for weight init, dropout, shuffling and variation; entropy when unset
    pub seed: Option<u64>,
}

impl ForecastConfig {
    /// Plain LSTM predictor: min-max scaling, 30-step lookback, 100 epochs,
    /// raw forecasts.
    pub fn standard() -> Self {
        Self {
            scaler_kind: ScalerKind::MinMax,
            lookback: 30,
            epochs: 100,
            batch_size: 32,
            validation_split: 0.2,
            variation: VariationStrategy::None,
            network: NetworkConfig::new(50, 50),
            backtest_horizon: 20,
            min_training_points: MIN_TRAINING_POINTS,
            max_steps: MAX_FORECAST_STEPS,
            hour_anchor: HourAnchor::WallClock,
            seed: None,
        }
    }

    /// Seasonal predictor: like [`standard`](Self::standard), with per-hour
    /// patterns blended into every step and a 30-point backtest.
    pub fn hybrid() -> Self {
        Self {
            variation: VariationStrategy::HourlyBlend,
            backtest_horizon: 30,
            ..Self::standard()
        }
    }

    /// Fast predictor: z-score scaling, 12-step lookback, 10 epochs and
    /// post-hoc realism injection.
    pub fn advanced() -> Self {
        Self {
            scaler_kind: ScalerKind::ZScore,
            lookback: 12,
            epochs: 10,
            batch_size: 64,
            validation_split: 0.1,
            variation: VariationStrategy::PostHoc,
            network: NetworkConfig::new(64, 32),
            backtest_horizon: 20,
            min_training_points: MIN_TRAINING_POINTS,
            max_steps: MAX_FORECAST_STEPS,
            hour_anchor: HourAnchor::WallClock,
            seed: None,
        }
    }

    /// Look up a preset by name (`standard`, `hybrid`, `advanced`).
    pub fn preset(name: &str) -> Result<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "standard" | "plain" => Ok(Self::standard()),
            "hybrid" => Ok(Self::hybrid()),
            "advanced" => Ok(Self::advanced()),
            other => Err(ForecastError::invalid_parameter(
                "preset",
                format!("unknown preset '{}', expected standard, hybrid or advanced", other),
            )),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Smallest series `train()` accepts: `lookback + 10`.
    pub fn min_series_len(&self) -> usize {
        self.lookback + TRAINING_MARGIN
    }

    pub fn training_options(&self) -> TrainingOptions {
        TrainingOptions {
            lookback: self.lookback,
            epochs: self.epochs,
            batch_size: self.batch_size,
            validation_split: self.validation_split,
        }
    }

    /// Check every field for a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            return Err(ForecastError::invalid_parameter("lookback", "must be at least 1"));
        }
        if self.epochs == 0 {
            return Err(ForecastError::invalid_parameter("epochs", "must be at least 1"));
        }
        if self.batch_size == 0 {
            return Err(ForecastError::invalid_parameter("batch_size", "must be at least 1"));
        }
        if !(0.0..1.0).contains(&self.validation_split) {
            return Err(ForecastError::invalid_parameter(
                "validation_split",
                "must be in [0, 1)",
            ));
        }
        if self.backtest_horizon == 0 {
            return Err(ForecastError::invalid_parameter(
                "backtest_horizon",
                "must be at least 1",
            ));
        }
        if self.max_steps == 0 {
            return Err(ForecastError::invalid_parameter("max_steps", "must be at least 1"));
        }
        self.network.validate()
    }
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self::advanced()
    }
}

/// Builder for [`ForecastConfig`], starting from a preset.
#[derive(Debug, Clone, Default)]
pub struct ForecastConfigBuilder {
    config: ForecastConfig,
}

impl ForecastConfigBuilder {
    /// Start from the default (advanced) preset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ForecastConfig) -> Self {
        Self { config }
    }

    pub fn scaler_kind(mut self, kind: ScalerKind) -> Self {
        self.config.scaler_kind = kind;
        self
    }

    pub fn lookback(mut self, lookback: usize) -> Self {
        self.config.lookback = lookback;
        self
    }

    pub fn epochs(mut self, epochs: usize) -> Self {
        self.config.epochs = epochs;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn validation_split(mut self, split: f64) -> Self {
        self.config.validation_split = split;
        self
    }

    pub fn variation(mut self, strategy: VariationStrategy) -> Self {
        self.config.variation = strategy;
        self
    }

    pub fn network(mut self, network: NetworkConfig) -> Self {
        self.config.network = network;
        self
    }

    pub fn backtest_horizon(mut self, horizon: usize) -> Self {
        self.config.backtest_horizon = horizon;
        self
    }

    pub fn min_training_points(mut self, points: usize) -> Self {
        self.config.min_training_points = points;
        self
    }

    pub fn max_steps(mut self, steps: usize) -> Self {
        self.config.max_steps = steps;
        self
    }

    pub fn hour_anchor(mut self, anchor: HourAnchor) -> Self {
        self.config.hour_anchor = anchor;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> Result<ForecastConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_match_variants() {
        let standard = ForecastConfig::standard();
        assert_eq!(standard.scaler_kind, ScalerKind::MinMax);
        assert_eq!(standard.lookback, 30);
        assert_eq!(standard.epochs, 100);
        assert_eq!(standard.batch_size, 32);
        assert_eq!(standard.variation, VariationStrategy::None);
        assert_eq!(standard.network.first_units, 50);
        assert_eq!(standard.network.second_units, 50);

        let hybrid = ForecastConfig::hybrid();
        assert_eq!(hybrid.variation, VariationStrategy::HourlyBlend);
        assert_eq!(hybrid.backtest_horizon, 30);
        assert_eq!(hybrid.lookback, 30);

        let advanced = ForecastConfig::advanced();
        assert_eq!(advanced.scaler_kind, ScalerKind::ZScore);
        assert_eq!(advanced.lookback, 12);
        assert_eq!(advanced.epochs, 10);
        assert_eq!(advanced.batch_size, 64);
        assert!((advanced.validation_split - 0.1).abs() < 1e-12);
        assert_eq!(advanced.variation, VariationStrategy::PostHoc);
        assert_eq!(advanced.network.first_units, 64);
        assert_eq!(advanced.network.second_units, 32);
    }

    #[test]
    fn test_all_presets_validate() {
        for config in [
            ForecastConfig::standard(),
            ForecastConfig::hybrid(),
            ForecastConfig::advanced(),
        ] {
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_default_is_advanced() {
        assert_eq!(ForecastConfig::default(), ForecastConfig::advanced());
    }

    #[test]
    fn test_preset_lookup() {
        assert_eq!(ForecastConfig::preset("Hybrid").unwrap(), ForecastConfig::hybrid());
        assert_eq!(ForecastConfig::preset("plain").unwrap(), ForecastConfig::standard());
        assert!(matches!(
            ForecastConfig::preset("lstm-xl"),
            Err(ForecastError::InvalidParameter { .. })
        ));
    }

    #[test]
    fn test_min_series_len() {
        assert_eq!(ForecastConfig::advanced().min_series_len(), 22);
        assert_eq!(ForecastConfig::standard().min_series_len(), 40);
    }

    #[test]
    fn test_training_options_mirror_config() {
        let options = ForecastConfig::hybrid().training_options();
        assert_eq!(options.lookback, 30);
        assert_eq!(options.epochs, 100);
        assert_eq!(options.batch_size, 32);
        assert!((options.validation_split - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let cases = [
            ForecastConfigBuilder::new().lookback(0),
            ForecastConfigBuilder::new().epochs(0),
            ForecastConfigBuilder::new().batch_size(0),
            ForecastConfigBuilder::new().validation_split(1.0),
            ForecastConfigBuilder::new().validation_split(-0.1),
            ForecastConfigBuilder::new().backtest_horizon(0),
            ForecastConfigBuilder::new().max_steps(0),
            ForecastConfigBuilder::new().network(NetworkConfig {
                dropout: 1.0,
                ..NetworkConfig::default()
            }),
            ForecastConfigBuilder::new().network(NetworkConfig {
                dense_units: 0,
                ..NetworkConfig::default()
            }),
            ForecastConfigBuilder::new().network(NetworkConfig {
                learning_rate: 0.0,
                ..NetworkConfig::default()
            }),
        ];

        for builder in cases {
            assert!(matches!(
                builder.build(),
                Err(ForecastError::InvalidParameter { .. })
            ));
        }
    }

    #[test]
    fn test_builder_overrides_preset() {
        let config = ForecastConfigBuilder::from_config(ForecastConfig::standard())
            .lookback(8)
            .epochs(3)
            .variation(VariationStrategy::PostHoc)
            .hour_anchor(HourAnchor::Origin)
            .seed(7)
            .build()
            .unwrap();

        assert_eq!(config.scaler_kind, ScalerKind::MinMax);
        assert_eq!(config.lookback, 8);
        assert_eq!(config.epochs, 3);
        assert_eq!(config.variation, VariationStrategy::PostHoc);
        assert_eq!(config.hour_anchor, HourAnchor::Origin);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: ForecastConfig =
            serde_json::from_str(r#"{"lookback": 24, "network": {"first_units": 16}}"#).unwrap();
        assert_eq!(config.lookback, 24);
        assert_eq!(config.network.first_units, 16);
        assert_eq!(config.network.second_units, 32);
        assert_eq!(config.epochs, ForecastConfig::advanced().epochs);
        assert_eq!(config.scaler_kind, ScalerKind::ZScore);
    }

    #[test]
    fn test_config_json_roundtrip() {
        let config = ForecastConfig::hybrid().with_seed(42);
        let json = serde_json::to_string(&config).unwrap();
        let back: ForecastConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
