//! Fitted normalization parameters.

use crate::error::{ForecastError, Result};
use serde::{Deserialize, Serialize};

/// Normalization family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalerKind {
    /// Zero mean, unit variance; `location = mean`, `scale = std`
    ZScore,
    /// `[0, 1]` range; `location = min`, `scale = max - min`
    MinMax,
}

impl ScalerKind {
    /// Normalized value that corresponds to the "middle" of the fitted data.
    pub fn baseline(&self) -> f64 {
        match self {
            ScalerKind::ZScore => 0.0,
            ScalerKind::MinMax => 0.5,
        }
    }
}

impl std::fmt::Display for ScalerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScalerKind::ZScore => write!(f, "z-score"),
            ScalerKind::MinMax => write!(f, "min-max"),
        }
    }
}

/// Immutable result of fitting a scaler.
///
/// `scale` is always strictly positive and finite.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerState {
    kind: ScalerKind,
    location: f64,
    scale: f64,
}

impl ScalerState {
    pub fn new(kind: ScalerKind, location: f64, scale: f64) -> Result<Self> {
        if !location.is_finite() {
            return Err(ForecastError::invalid_parameter("location", "must be finite"));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(ForecastError::invalid_parameter(
                "scale",
                "must be finite and greater than zero",
            ));
        }
        Ok(Self {
            kind,
            location,
            scale,
        })
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    pub fn location(&self) -> f64 {
        self.location
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Map a raw value into the normalized domain.
    pub fn apply(&self, value: f64) -> f64 {
        (value - self.location) / self.scale
    }

    /// Map a normalized value back into the raw domain.
    pub fn invert(&self, normalized: f64) -> f64 {
        normalized * self.scale + self.location
    }

    pub fn apply_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.apply(v)).collect()
    }

    pub fn invert_all(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|&v| self.invert(v)).collect()
    }
}
