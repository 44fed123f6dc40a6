//! Ownership of the trained model and its scaler through
//! `Untrained → Trained → Disposed`.

use crate::network::LstmRegressor;
use crate::scaler::Scaler;
use crate::windower;
use forecast_api::{ForecastConfig, TRAINING_MARGIN};
use forecast_spi::{
    CancelToken, ForecastError, LifecycleState, Result, ScalerState, SequenceRegressor,
    StepPredictor, TrainingOptions, TrainingReport,
};
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};

/// Builds an untrained regressor for a lookback and configuration.
pub type RegressorFactory =
    Arc<dyn Fn(usize, &ForecastConfig) -> Box<dyn SequenceRegressor> + Send + Sync>;

/// Factory producing the stacked LSTM network described by `config.network`.
pub fn lstm_factory() -> RegressorFactory {
    Arc::new(|lookback, config: &ForecastConfig| {
        Box::new(LstmRegressor::new(lookback, &config.network, config.seed))
            as Box<dyn SequenceRegressor>
    })
}

/// Check a raw training series before anything is built from it.
///
/// Order: empty, non-finite values, then length against `lookback + 10`.
pub fn validate_series(series: &[f64], lookback: usize) -> Result<()> {
    if series.is_empty() {
        return Err(ForecastError::EmptySeries);
    }
    if let Some(index) = series.iter().position(|v| !v.is_finite()) {
        return Err(ForecastError::InvalidData(format!(
            "non-finite value {} at index {}",
            series[index], index
        )));
    }
    let required = lookback + TRAINING_MARGIN;
    if series.len() < required {
        return Err(ForecastError::InsufficientData {
            required,
            actual: series.len(),
        });
    }
    Ok(())
}

struct FittedModel {
    regressor: Box<dyn SequenceRegressor>,
    scaler: ScalerState,
}

pub struct ModelLifecycle {
    config: ForecastConfig,
    factory: RegressorFactory,
    state: LifecycleState,
    model: Option<FittedModel>,
}

impl ModelLifecycle {
    pub fn new(config: ForecastConfig) -> Self {
        Self::with_factory(config, lstm_factory())
    }

    /// Use a custom regressor in place of the LSTM network.
    pub fn with_factory(config: ForecastConfig, factory: RegressorFactory) -> Self {
        Self {
            config,
            factory,
            state: LifecycleState::Untrained,
            model: None,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn is_trained(&self) -> bool {
        self.state == LifecycleState::Trained
    }

    pub fn config(&self) -> &ForecastConfig {
        &self.config
    }

    /// Fit a fresh scaler and model on `series`.
    ///
    /// Input problems are reported before any model is built and leave the
    /// current state untouched. A failure during fitting discards any
    /// previous model and leaves the lifecycle `Untrained`.
    pub fn train(
        &mut self,
        series: &[f64],
        options: &TrainingOptions,
        cancel: &CancelToken,
    ) -> Result<TrainingReport> {
        validate_series(series, options.lookback)?;

        self.model = None;
        self.state = LifecycleState::Untrained;

        match self.fit(series, options, cancel) {
            Ok((model, report)) => {
                info!(
                    points = series.len(),
                    lookback = options.lookback,
                    epochs = report.epochs_run,
                    final_loss = report.final_loss,
                    parameters = model.regressor.parameter_count(),
                    elapsed_ms = report.elapsed_ms,
                    "Model trained"
                );
                self.model = Some(model);
                self.state = LifecycleState::Trained;
                Ok(report)
            }
            Err(e) => {
                warn!(error = %e, "Training failed, model discarded");
                Err(e)
            }
        }
    }

    fn fit(
        &self,
        series: &[f64],
        options: &TrainingOptions,
        cancel: &CancelToken,
    ) -> Result<(FittedModel, TrainingReport)> {
        let (scaler, normalized) = Scaler::new(self.config.scaler_kind).fit_transform(series)?;
        let set = windower::build_training_set(&normalized, options.lookback)?;

        let mut regressor = (self.factory)(options.lookback, &self.config);
        let report = regressor.fit(&set, options, cancel)?;

        Ok((FittedModel { regressor, scaler }, report))
    }

    /// Predict the normalized value following `window`.
    pub fn predict(&self, window: &[f64]) -> Result<f64> {
        self.fitted()?.regressor.predict(window)
    }

    /// Scaler fitted by the last successful train.
    pub fn scaler(&self) -> Result<&ScalerState> {
        Ok(&self.fitted()?.scaler)
    }

    /// Window length of the trained model.
    pub fn lookback(&self) -> Result<usize> {
        Ok(self.fitted()?.regressor.lookback())
    }

    pub fn parameter_count(&self) -> Result<usize> {
        Ok(self.fitted()?.regressor.parameter_count())
    }

    /// Release the model and scaler. Safe to call repeatedly.
    pub fn dispose(&mut self) {
        if self.model.take().is_some() {
            info!("Model disposed");
        }
        self.state = LifecycleState::Disposed;
    }

    fn fitted(&self) -> Result<&FittedModel> {
        match (&self.model, self.state) {
            (Some(model), LifecycleState::Trained) => Ok(model),
            _ => Err(ForecastError::NotTrained),
        }
    }
}

impl StepPredictor for ModelLifecycle {
    fn predict_step(&self, window: &[f64]) -> Result<f64> {
        self.predict(window)
    }
}

impl fmt::Debug for ModelLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelLifecycle")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
