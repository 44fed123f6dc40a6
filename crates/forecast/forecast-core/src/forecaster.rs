//! Autoregressive multi-step forecasting.
//!
//! Each step predicts from the current window, then slides the window left
//! and appends the normalized prediction. Errors compound with the horizon.

use crate::variation::{self, HourlyBlender};
use crate::windower;
use chrono::{Local, TimeZone, Timelike, Utc};
use forecast_api::HourAnchor;
use forecast_spi::{
    ForecastError, HourlyProfile, Result, ScalerState, StepPredictor, VariationProfile, HOUR_MS,
};
use rand::Rng;
use tracing::debug;

/// Output format of forecast timestamps.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M";

const PROGRESS_EVERY_STEPS: usize = 50;

/// Realism stage applied to a forecast.
#[derive(Debug, Clone, Copy)]
pub enum Variation<'a> {
    /// Raw model output
    None,
    /// Noise, spikes and day/night factor on the finished forecast
    PostHoc {
        profile: &'a VariationProfile,
        start_hour: u32,
    },
    /// Per-hour blend inside the autoregressive loop
    HourlyBlend(&'a HourlyProfile),
}

/// Values and labels of one forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastPath {
    pub values: Vec<f64>,
    pub timestamps: Vec<String>,
}

/// Run `steps` autoregressive predictions from `seed_window`.
pub fn iterate<P: StepPredictor + ?Sized>(
    model: &P,
    seed_window: &[f64],
    steps: usize,
) -> Result<Vec<f64>> {
    iterate_with(model, seed_window, steps, |_, prediction| prediction)
}

/// Like [`iterate`], passing every prediction through `adjust(step, value)`
/// before it is recorded and fed back.
pub fn iterate_with<P, F>(
    model: &P,
    seed_window: &[f64],
    steps: usize,
    mut adjust: F,
) -> Result<Vec<f64>>
where
    P: StepPredictor + ?Sized,
    F: FnMut(usize, f64) -> f64,
{
    if seed_window.is_empty() {
        return Err(ForecastError::invalid_parameter(
            "seed_window",
            "must hold at least one value",
        ));
    }

    let mut window = seed_window.to_vec();
    let mut output = Vec::with_capacity(steps);

    for step in 0..steps {
        let value = adjust(step, model.predict_step(&window)?);

        window.rotate_left(1);
        if let Some(last) = window.last_mut() {
            *last = value;
        }
        output.push(value);

        if (step + 1) % PROGRESS_EVERY_STEPS == 0 {
            debug!(step = step + 1, steps, "Forecast progress");
        }
    }

    Ok(output)
}

/// Map normalized values back to the raw domain and floor at zero.
pub fn denormalize_and_floor(values: &[f64], scaler: &ScalerState) -> Vec<f64> {
    values.iter().map(|&v| scaler.invert(v).max(0.0)).collect()
}

/// Labels for `steps` hourly points after `origin_ms`; the first label is
/// `origin + 1h`.
pub fn forecast_timestamps(origin_ms: i64, steps: usize) -> Result<Vec<String>> {
    (1..=steps as i64)
        .map(|i| {
            i.checked_mul(HOUR_MS)
                .and_then(|offset| origin_ms.checked_add(offset))
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
                .map(|dt| dt.format(TIMESTAMP_FORMAT).to_string())
                .ok_or_else(|| {
                    ForecastError::invalid_parameter(
                        "origin_timestamp",
                        format!("{} + {}h is outside the supported date range", origin_ms, i),
                    )
                })
        })
        .collect()
}

/// Hour of day the post-hoc day/night factor starts from.
pub fn start_hour(anchor: HourAnchor, origin_ms: i64) -> u32 {
    match anchor {
        HourAnchor::WallClock => Local::now().hour(),
        HourAnchor::Origin => variation::hour_of_day(origin_ms.saturating_add(HOUR_MS)),
    }
}

/// Composes windowing, iteration, denormalization and variation for one
/// trained model.
pub struct Forecaster<'a, P: ?Sized> {
    model: &'a P,
    scaler: &'a ScalerState,
    lookback: usize,
}

impl<'a, P: StepPredictor + ?Sized> Forecaster<'a, P> {
    pub fn new(model: &'a P, scaler: &'a ScalerState, lookback: usize) -> Self {
        Self {
            model,
            scaler,
            lookback,
        }
    }

    /// Raw (non-varied) forecast of `steps` values following `series`.
    pub fn raw_forecast(&self, series: &[f64], steps: usize) -> Result<Vec<f64>> {
        let normalized = self.scaler.apply_all(series);
        let seed = windower::last_window(&normalized, self.lookback)?;
        let predictions = iterate(self.model, seed, steps)?;
        Ok(denormalize_and_floor(&predictions, self.scaler))
    }

    /// Forecast `steps` hourly values after `origin_ms` from the raw
    /// `series`, applying the chosen variation stage.
    pub fn full_forecast<R: Rng + ?Sized>(
        &self,
        series: &[f64],
        origin_ms: i64,
        steps: usize,
        variation: Variation<'_>,
        rng: &mut R,
    ) -> Result<ForecastPath> {
        if steps == 0 {
            return Err(ForecastError::invalid_parameter("steps", "must be at least 1"));
        }
        let timestamps = forecast_timestamps(origin_ms, steps)?;

        let values = match variation {
            Variation::None => self.raw_forecast(series, steps)?,
            Variation::PostHoc {
                profile,
                start_hour,
            } => {
                let raw = self.raw_forecast(series, steps)?;
                variation::apply_variation(profile, &raw, start_hour, rng)
            }
            Variation::HourlyBlend(profile) => {
                let normalized = self.scaler.apply_all(series);
                let seed = windower::last_window(&normalized, self.lookback)?;
                let blender = HourlyBlender::new(profile, self.scaler);
                let blended = iterate_with(self.model, seed, steps, |step, prediction| {
                    // Keyed on the hour of this step's label.
                    let ts = origin_ms.saturating_add((step as i64 + 1) * HOUR_MS);
                    blender.blend(prediction, variation::hour_of_day(ts), rng)
                })?;
                denormalize_and_floor(&blended, self.scaler)
            }
        };

        Ok(ForecastPath { values, timestamps })
    }
}
