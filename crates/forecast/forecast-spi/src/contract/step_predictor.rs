//! Single-window prediction used by the autoregressive loop.

use crate::error::Result;

/// Anything that can predict the next normalized value from one window.
///
/// The forecaster and backtester only need this view of a model, which keeps
/// them independent of how the model is trained or owned.
pub trait StepPredictor {
    /// Predict the value following `window` (normalized domain).
    fn predict_step(&self, window: &[f64]) -> Result<f64>;
}

impl<F> StepPredictor for F
where
    F: Fn(&[f64]) -> Result<f64>,
{
    fn predict_step(&self, window: &[f64]) -> Result<f64> {
        self(window)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_step_predictor() {
        let last_value =
            |window: &[f64]| -> Result<f64> { Ok(window.last().copied().unwrap_or(0.0)) };
        assert_eq!(last_value.predict_step(&[1.0, 2.0, 3.0]).unwrap(), 3.0);
    }

    #[test]
    fn test_step_predictor_by_reference() {
        fn run<P: StepPredictor + ?Sized>(p: &P) -> f64 {
            p.predict_step(&[4.0]).unwrap()
        }
        let doubler = |window: &[f64]| -> Result<f64> { Ok(window[0] * 2.0) };
        assert_eq!(run(&doubler), 8.0);
    }
}
