//! Model module containing data structures

mod forecast_result;
mod lifecycle;
mod reading;
mod scaler_state;
mod training_set;
mod variation;

pub use forecast_result::{Accuracy, ForecastResult};
pub use lifecycle::{CancelToken, LifecycleState, TrainingOptions, TrainingReport};
pub use reading::{HistoricalDataset, Reading, HOUR_MS};
pub use scaler_state::{ScalerKind, ScalerState};
pub use training_set::TrainingSet;
pub use variation::{HourlyPattern, HourlyProfile, VariationProfile, VariationStrategy};
