//! Forecast output models.

use serde::{Deserialize, Serialize};

/// Backtest error metrics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub mae: f64,
    pub rmse: f64,
}

impl Accuracy {
    pub fn new(mae: f64, rmse: f64) -> Self {
        Self { mae, rmse }
    }

    /// `{0, 0}`, reported when no backtest could be run.
    pub fn zero() -> Self {
        Self::default()
    }
}

/// A finished forecast: one value and one `"YYYY-MM-DD HH:MM"` label per
/// step, plus the backtested accuracy of the model that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastResult {
    pub values: Vec<f64>,
    pub timestamps: Vec<String>,
    pub accuracy: Accuracy,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
