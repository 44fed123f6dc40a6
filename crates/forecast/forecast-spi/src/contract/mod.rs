//! Contract module containing trait definitions for forecast operations

mod dataset_provider;
mod sequence_regressor;
mod step_predictor;

pub use dataset_provider::HistoricalDataProvider;
pub use sequence_regressor::SequenceRegressor;
pub use step_predictor::StepPredictor;
