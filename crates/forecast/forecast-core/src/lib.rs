//! Forecast Core
//!
//! Core implementations of the forecasting pipeline: scaling, windowing,
//! variation statistics, the stacked LSTM regressor, model lifecycle,
//! autoregressive forecasting, backtesting, and the service and session
//! entry points.

pub mod backtest;
pub mod forecaster;
pub mod lifecycle;
pub mod metrics;
pub mod network;
pub mod scaler;
pub mod service;
pub mod session;
pub mod variation;
pub mod windower;

// Re-export SPI traits for implementations
pub use forecast_spi::{
    ForecastError, HistoricalDataProvider, Result, SequenceRegressor, StepPredictor,
};

// Re-export main types
pub use backtest::Backtester;
pub use forecaster::{ForecastPath, Forecaster, Variation};
pub use lifecycle::{lstm_factory, ModelLifecycle, RegressorFactory};
pub use network::LstmRegressor;
pub use scaler::Scaler;
pub use service::{PredictionService, TrainingSummary};
pub use session::ForecastSession;
pub use variation::HourlyBlender;
