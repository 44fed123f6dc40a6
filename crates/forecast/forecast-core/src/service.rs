//! Train and forecast entry points over historical readings.

use crate::backtest::Backtester;
use crate::forecaster::{self, Forecaster, Variation};
use crate::lifecycle::{lstm_factory, ModelLifecycle, RegressorFactory};
use crate::variation;
use chrono::{DateTime, Utc};
use forecast_api::ForecastConfig;
use forecast_spi::{
    CancelToken, ForecastError, ForecastResult, HistoricalDataset, HourlyProfile, LifecycleState,
    Reading, Result, TrainingReport, VariationProfile, VariationStrategy,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of a successful `train()`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub data_points: usize,
    pub days_used: usize,
    pub trained_at: DateTime<Utc>,
    pub report: TrainingReport,
}

/// One forecasting pipeline: a model lifecycle plus the statistics gathered
/// at train time.
#[derive(Debug)]
pub struct PredictionService {
    config: ForecastConfig,
    lifecycle: ModelLifecycle,
    variation: Option<VariationProfile>,
    hourly: Option<HourlyProfile>,
    last_training: Option<TrainingSummary>,
    rng: StdRng,
}

impl PredictionService {
    pub fn new(config: ForecastConfig) -> Result<Self> {
        Self::with_factory(config, lstm_factory())
    }

    /// Build a service around a custom regressor.
    pub fn with_factory(config: ForecastConfig, factory: RegressorFactory) -> Result<Self> {
        config.validate()?;
        let rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        Ok(Self {
            lifecycle: ModelLifecycle::with_factory(config.clone(), factory),
            config,
            variation: None,
            hourly: None,
            last_training: None,
            rng,
        })
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_trained(&self) -> bool {
        self.lifecycle.is_trained()
    }

    pub fn last_training(&self) -> Option<&TrainingSummary> {
        self.last_training.as_ref()
    }

    pub fn variation_profile(&self) -> Option<&VariationProfile> {
        self.variation.as_ref()
    }

    pub fn hourly_profile(&self) -> Option<&HourlyProfile> {
        self.hourly.as_ref()
    }

    pub fn train(&mut self, dataset: &HistoricalDataset) -> Result<TrainingSummary> {
        self.train_with_cancel(dataset, &CancelToken::new())
    }

    /// Train on every reading of `dataset`.
    ///
    /// Rejects datasets with fewer than `min_training_points` readings,
    /// non-finite values, or fewer than `lookback + 10` points.
    pub fn train_with_cancel(
        &mut self,
        dataset: &HistoricalDataset,
        cancel: &CancelToken,
    ) -> Result<TrainingSummary> {
        if dataset.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        let values = dataset.values();
        check_finite(&values)?;
        if values.len() < self.config.min_training_points {
            return Err(ForecastError::InsufficientData {
                required: self.config.min_training_points,
                actual: values.len(),
            });
        }

        info!(
            points = values.len(),
            days = dataset.days,
            scaler = %self.config.scaler_kind,
            lookback = self.config.lookback,
            epochs = self.config.epochs,
            "Training started"
        );

        let result = self
            .lifecycle
            .train(&values, &self.config.training_options(), cancel);

        let report = match result {
            Ok(report) => report,
            Err(e) => {
                if !self.lifecycle.is_trained() {
                    self.clear_profiles();
                }
                return Err(e);
            }
        };

        self.variation = Some(variation::analyze(&values)?);
        self.hourly = Some(variation::hourly_profile(&dataset.data)?);

        let summary = TrainingSummary {
            data_points: dataset.total_points,
            days_used: dataset.days,
            trained_at: Utc::now(),
            report,
        };
        self.last_training = Some(summary.clone());
        Ok(summary)
    }

    /// Forecast `steps` hourly values after `origin_timestamp` (ms epoch)
    /// from `series`, with backtested accuracy.
    pub fn forecast(
        &mut self,
        series: &[Reading],
        origin_timestamp: i64,
        steps: usize,
    ) -> Result<ForecastResult> {
        let scaler = *self.lifecycle.scaler()?;
        let lookback = self.lifecycle.lookback()?;

        if steps == 0 || steps > self.config.max_steps {
            return Err(ForecastError::invalid_parameter(
                "steps",
                format!("must be between 1 and {}", self.config.max_steps),
            ));
        }
        if series.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        let values: Vec<f64> = series.iter().map(|r| r.value).collect();
        check_finite(&values)?;

        let variation = match (self.config.variation, &self.variation, &self.hourly) {
            (VariationStrategy::PostHoc, Some(profile), _) => Variation::PostHoc {
                profile,
                start_hour: forecaster::start_hour(self.config.hour_anchor, origin_timestamp),
            },
            (VariationStrategy::HourlyBlend, _, Some(profile)) => Variation::HourlyBlend(profile),
            _ => Variation::None,
        };

        let path = Forecaster::new(&self.lifecycle, &scaler, lookback).full_forecast(
            &values,
            origin_timestamp,
            steps,
            variation,
            &mut self.rng,
        )?;

        let accuracy = match Backtester::new(lookback, self.config.backtest_horizon).evaluate_with(
            series,
            &self.lifecycle,
            &scaler,
            variation,
            &mut self.rng,
        ) {
            Ok(accuracy) => accuracy,
            Err(e) => {
                warn!(error = %e, "Backtest failed, reporting zero accuracy");
                Default::default()
            }
        };

        info!(
            steps,
            mae = accuracy.mae,
            rmse = accuracy.rmse,
            "Forecast generated"
        );

        Ok(ForecastResult {
            values: path.values,
            timestamps: path.timestamps,
            accuracy,
        })
    }

    /// Forecast from the whole dataset, starting after its last reading.
    pub fn forecast_dataset(
        &mut self,
        dataset: &HistoricalDataset,
        steps: usize,
    ) -> Result<ForecastResult> {
        if !self.lifecycle.is_trained() {
            return Err(ForecastError::NotTrained);
        }
        let origin = dataset.last_timestamp().ok_or(ForecastError::EmptySeries)?;
        self.forecast(&dataset.data, origin, steps)
    }

    /// Release the model and all train-time statistics.
    pub fn dispose(&mut self) {
        self.lifecycle.dispose();
        self.clear_profiles();
    }

    fn clear_profiles(&mut self) {
        self.variation = None;
        self.hourly = None;
        self.last_training = None;
    }
}

fn check_finite(values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ForecastError::InvalidData(format!(
            "non-finite value {} at index {}",
            values[index], index
        ))),
        None => Ok(()),
    }
}
