//! Forecast error types

use thiserror::Error;

/// Errors that can occur during forecasting operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// Scaling or profiling was asked to work on an empty series
    #[error("Empty series: at least one value is required")]
    EmptySeries,

    /// Insufficient data points for the operation
    #[error("Insufficient data: need at least {required} points, got {actual}")]
    InsufficientData { required: usize, actual: usize },

    /// Input contains NaN or infinite values
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Model was never trained, or has been disposed
    #[error("Model not trained: call train() first")]
    NotTrained,

    /// Numerical failure while fitting the model
    #[error("Training failed: {0}")]
    TrainingFailure(String),

    /// Invalid parameter value
    #[error("Invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    /// Another train() call already holds the session
    #[error("Session busy: a training run is already in progress")]
    Busy,

    /// Training was cancelled through its cancel token
    #[error("Training cancelled after {epochs_completed} epochs")]
    Cancelled { epochs_completed: usize },
}

/// Coarse classification used by transport adapters to map errors onto
/// status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied unusable input or called out of sequence
    Caller,
    /// The session is occupied by another operation
    Conflict,
    /// The operation failed internally
    Internal,
}

impl ForecastError {
    /// Shorthand for [`ForecastError::InvalidParameter`].
    pub fn invalid_parameter(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Classify the error for transport adapters.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::EmptySeries
            | Self::InsufficientData { .. }
            | Self::InvalidData(_)
            | Self::NotTrained
            | Self::InvalidParameter { .. } => ErrorKind::Caller,
            Self::Busy => ErrorKind::Conflict,
            Self::TrainingFailure(_) | Self::Cancelled { .. } => ErrorKind::Internal,
        }
    }
}
