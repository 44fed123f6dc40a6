//! Forecast Consumer API
//!
//! Configuration types and builders for the forecasting pipeline.
//!
//! This crate provides:
//! - [`ForecastConfig`] and its presets for the plain, hybrid and advanced
//!   predictor variants
//! - [`ForecastConfigBuilder`] for overriding individual settings
//! - Re-exports from SPI for convenience

pub mod config;

pub use config::{
    ForecastConfig, ForecastConfigBuilder, HourAnchor, NetworkConfig, DEFAULT_FORECAST_STEPS,
    MAX_FORECAST_STEPS, MIN_TRAINING_POINTS, TRAINING_MARGIN,
};

// Re-export SPI types used in configuration
pub use forecast_spi::{ForecastError, Result, ScalerKind, TrainingOptions, VariationStrategy};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{ForecastConfig, ForecastConfigBuilder, HourAnchor, NetworkConfig};
    pub use forecast_spi::{
        Accuracy, ForecastError, ForecastResult, Reading, Result, ScalerKind, VariationStrategy,
    };
}
