//! Forecast Facade
//!
//! High-level API for the gas-concentration forecasting pipeline.
//! Re-exports all public types from the forecast stack for convenient usage.
//!
//! ```no_run
//! use forecast_facade::{ForecastConfig, HistoricalDataset, PredictionService, Reading, HOUR_MS};
//!
//! let readings: Vec<Reading> = (0..200)
//!     .map(|i| Reading::new(i * HOUR_MS, 400.0 + (i % 24) as f64))
//!     .collect();
//! let dataset = HistoricalDataset::from_readings(readings);
//!
//! let mut service = PredictionService::new(ForecastConfig::advanced())?;
//! service.train(&dataset)?;
//! let forecast = service.forecast_dataset(&dataset, 168)?;
//! println!("{} values, mae {:.4}", forecast.len(), forecast.accuracy.mae);
//! # Ok::<(), forecast_facade::ForecastError>(())
//! ```

// Re-export everything from API (which includes SPI configuration types)
pub use forecast_api::*;

// Explicit re-exports for documentation
pub use forecast_api::prelude;

// Re-export core modules for direct access
pub use forecast_core::{
    backtest, forecaster, lifecycle, metrics, network, scaler, service, session, variation,
    windower,
};

// Re-export core types at root
pub use forecast_core::{
    lstm_factory, Backtester, ForecastPath, ForecastSession, Forecaster, HourlyBlender,
    LstmRegressor, ModelLifecycle, PredictionService, RegressorFactory, Scaler, TrainingSummary,
    Variation,
};

// Re-export SPI contracts and models
pub use forecast_spi::{
    Accuracy, CancelToken, ErrorKind, ForecastResult, HistoricalDataProvider, HistoricalDataset,
    HourlyPattern, HourlyProfile, LifecycleState, Reading, ScalerState, SequenceRegressor,
    StepPredictor, TrainingReport, TrainingSet, VariationProfile, HOUR_MS,
};
