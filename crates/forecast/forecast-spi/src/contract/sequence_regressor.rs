//! Trainable one-step-ahead regressor over fixed-length windows.

use crate::error::Result;
use crate::model::{CancelToken, TrainingOptions, TrainingReport, TrainingSet};

/// A regression model mapping a normalized window to the next normalized
/// value.
///
/// Implementations own all of their parameters and buffers; nothing they
/// allocate escapes a call except the returned values.
///
/// # Example
///
/// ```rust,ignore
/// use forecast_spi::{CancelToken, SequenceRegressor, TrainingOptions, TrainingSet};
///
/// fn fit_and_score<R: SequenceRegressor>(
///     model: &mut R,
///     set: &TrainingSet,
///     options: &TrainingOptions,
/// ) -> forecast_spi::Result<f64> {
///     model.fit(set, options, &CancelToken::new())?;
///     model.predict(&set.inputs[0])
/// }
/// ```
pub trait SequenceRegressor: Send {
    /// Fit the model for exactly `options.epochs` epochs.
    ///
    /// Must check `cancel` at least once per epoch and return
    /// [`ForecastError::Cancelled`](crate::ForecastError::Cancelled) when it
    /// is set.
    fn fit(
        &mut self,
        set: &TrainingSet,
        options: &TrainingOptions,
        cancel: &CancelToken,
    ) -> Result<TrainingReport>;

    /// Predict the value following `window`.
    fn predict(&self, window: &[f64]) -> Result<f64>;

    /// Window length the model was built for.
    fn lookback(&self) -> usize;

    /// Number of trainable parameters.
    fn parameter_count(&self) -> usize;
}
