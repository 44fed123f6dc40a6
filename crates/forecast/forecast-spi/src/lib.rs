//! Forecast Service Provider Interface
//!
//! Defines the models, contracts and error type shared by every crate of the
//! forecasting stack:
//!
//! - [`SequenceRegressor`]: a trainable one-step-ahead regressor over windows
//! - [`StepPredictor`]: anything that can score a single lookback window
//! - [`HistoricalDataProvider`]: boundary to the store that owns the readings
//! - [`ForecastError`]: standardized error type for all forecast operations

pub mod contract;
pub mod error;
pub mod model;

// Re-export all public items at crate root for convenience
pub use contract::{HistoricalDataProvider, SequenceRegressor, StepPredictor};
pub use error::{ErrorKind, ForecastError, Result};
pub use model::{
    Accuracy, CancelToken, ForecastResult, HistoricalDataset, HourlyPattern, HourlyProfile,
    LifecycleState, Reading, ScalerKind, ScalerState, TrainingOptions, TrainingReport,
    TrainingSet, VariationProfile, VariationStrategy, HOUR_MS,
};
