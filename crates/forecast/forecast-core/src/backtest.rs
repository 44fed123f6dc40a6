//! Hold-out evaluation of a trained model.

use crate::forecaster::{denormalize_and_floor, iterate, iterate_with, Variation};
use crate::metrics;
use crate::variation::{self, HourlyBlender};
use forecast_spi::{Accuracy, ForecastError, Reading, Result, ScalerState, StepPredictor};
use rand::Rng;
use tracing::{debug, warn};

/// Forecasts the most recent `horizon` points from the window preceding them
/// and scores the forecast against what actually happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backtester {
    lookback: usize,
    horizon: usize,
}

impl Backtester {
    pub fn new(lookback: usize, horizon: usize) -> Self {
        Self { lookback, horizon }
    }

    /// Number of held-out points for a series of `len` values; zero when the
    /// series is too short to evaluate (`len ≤ 2·lookback`).
    pub fn test_size(&self, len: usize) -> usize {
        if len <= 2 * self.lookback {
            return 0;
        }
        self.horizon.min(len - self.lookback - 1)
    }

    /// MAE and RMSE of a raw forecast over the held-out tail of `series`.
    ///
    /// Returns zero accuracy when the series is too short.
    pub fn evaluate<P: StepPredictor + ?Sized>(
        &self,
        series: &[f64],
        model: &P,
        scaler: &ScalerState,
    ) -> Result<Accuracy> {
        self.score(series, scaler, |seed, _split, test_size| {
            Ok(denormalize_and_floor(&iterate(model, seed, test_size)?, scaler))
        })
    }

    /// Like [`evaluate`](Self::evaluate), but the held-out forecast goes
    /// through the same variation stage as a served forecast. Hours of day
    /// come from the held-out readings' timestamps.
    pub fn evaluate_with<P, R>(
        &self,
        readings: &[Reading],
        model: &P,
        scaler: &ScalerState,
        stage: Variation<'_>,
        rng: &mut R,
    ) -> Result<Accuracy>
    where
        P: StepPredictor + ?Sized,
        R: Rng + ?Sized,
    {
        let series: Vec<f64> = readings.iter().map(|r| r.value).collect();
        self.score(&series, scaler, |seed, split, test_size| {
            let held_out = &readings[split..];
            match stage {
                Variation::None => {
                    Ok(denormalize_and_floor(&iterate(model, seed, test_size)?, scaler))
                }
                Variation::PostHoc { profile, .. } => {
                    let raw = denormalize_and_floor(&iterate(model, seed, test_size)?, scaler);
                    let start_hour = held_out
                        .first()
                        .map_or(0, |r| variation::hour_of_day(r.timestamp));
                    Ok(variation::apply_variation(profile, &raw, start_hour, rng))
                }
                Variation::HourlyBlend(profile) => {
                    let blender = HourlyBlender::new(profile, scaler);
                    let blended = iterate_with(model, seed, test_size, |step, prediction| {
                        let hour = held_out
                            .get(step)
                            .map_or(0, |r| variation::hour_of_day(r.timestamp));
                        blender.blend(prediction, hour, rng)
                    })?;
                    Ok(denormalize_and_floor(&blended, scaler))
                }
            }
        })
    }

    /// Split off the hold-out, let `predict(seed, split, test_size)` forecast
    /// it and score the result.
    fn score<F>(&self, series: &[f64], scaler: &ScalerState, predict: F) -> Result<Accuracy>
    where
        F: FnOnce(&[f64], usize, usize) -> Result<Vec<f64>>,
    {
        if self.lookback == 0 {
            return Err(ForecastError::invalid_parameter("lookback", "must be at least 1"));
        }

        let test_size = self.test_size(series.len());
        if test_size == 0 {
            warn!(
                points = series.len(),
                lookback = self.lookback,
                "Series too short for backtest, reporting zero accuracy"
            );
            return Ok(Accuracy::zero());
        }

        let split = series.len() - test_size;
        let actual = &series[split..];
        let seed = scaler.apply_all(&series[split - self.lookback..split]);

        let predicted = predict(&seed, split, test_size)?;
        let accuracy = metrics::accuracy(actual, &predicted);

        debug!(
            test_size,
            mae = accuracy.mae,
            rmse = accuracy.rmse,
            "Backtest complete"
        );
        Ok(accuracy)
    }
}
