//! Noise, spike and diurnal statistics used to make forecasts look like
//! sensor output.
//!
//! Two strategies consume these statistics:
//! - post-hoc: [`apply_variation`] perturbs a finished raw forecast with
//!   Gaussian noise, occasional synthetic spikes and a day/night factor
//! - hourly blend: [`HourlyBlender`] nudges every autoregressive step
//!   toward the historical mean of its hour of day

use crate::metrics;
use forecast_spi::{
    ForecastError, HourlyPattern, HourlyProfile, Reading, Result, ScalerState, VariationProfile,
    HOUR_MS,
};
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Noise standard deviation as a fraction of the historical std.
pub const NOISE_FRACTION: f64 = 0.15;

/// Spike probability multiplier applied to the historical spike frequency.
pub const SPIKE_BOOST: f64 = 1.5;

/// Daytime hours (inclusive) that get the positive diurnal factor.
pub const DAYTIME_HOURS: std::ops::RangeInclusive<u32> = 8..=20;

const DAYTIME_FACTOR: f64 = 0.10;
const NIGHT_FACTOR: f64 = -0.05;

const BLEND_INFLUENCE: f64 = 0.5;
const BLEND_NOISE: f64 = 0.3;
const BLEND_FALLBACK_NOISE: f64 = 0.1;
const BLEND_MARGIN: f64 = 0.1;

/// Compute noise and spike statistics over the raw (unnormalized) series.
///
/// A spike is a point above `mean + 2·std` whose rise from the previous
/// point exceeds `std`.
pub fn analyze(series: &[f64]) -> Result<VariationProfile> {
    if series.is_empty() {
        return Err(ForecastError::EmptySeries);
    }

    let mean = metrics::mean(series);
    let std = metrics::std_dev(series);
    let threshold = mean + 2.0 * std;

    let (count, total_height) = series
        .windows(2)
        .filter(|pair| pair[1] > threshold && pair[1] - pair[0] > std)
        .fold((0usize, 0.0), |(count, total), pair| {
            (count + 1, total + (pair[1] - mean))
        });

    let spike_frequency = count as f64 / series.len() as f64;
    let avg_spike_height = if count > 0 {
        total_height / count as f64
    } else {
        2.0 * std
    };

    debug!(
        mean,
        std,
        spike_frequency,
        avg_spike_height,
        "Variation profile computed"
    );

    Ok(VariationProfile {
        mean,
        std,
        spike_frequency,
        avg_spike_height,
    })
}

/// Day/night multiplier offset for an hour of day.
pub fn hourly_factor(hour: u32) -> f64 {
    if DAYTIME_HOURS.contains(&(hour % 24)) {
        DAYTIME_FACTOR
    } else {
        NIGHT_FACTOR
    }
}

/// Perturb a raw forecast step by step: Gaussian noise, then a possible
/// spike, then the diurnal factor for `(start_hour + i) mod 24`, then a
/// floor at zero.
pub fn apply_variation<R: Rng + ?Sized>(
    profile: &VariationProfile,
    raw: &[f64],
    start_hour: u32,
    rng: &mut R,
) -> Vec<f64> {
    let noise_std = NOISE_FRACTION * profile.std;
    let spike_probability = (SPIKE_BOOST * profile.spike_frequency).clamp(0.0, 1.0);
    let spike_mean = 0.5 * profile.avg_spike_height;
    let spike_std = 0.3 * profile.avg_spike_height.abs();

    raw.iter()
        .enumerate()
        .map(|(i, &value)| {
            let mut value = value + gaussian(rng, 0.0, noise_std);

            if rng.gen::<f64>() < spike_probability {
                value += gaussian(rng, spike_mean, spike_std).abs();
            }

            let hour = ((start_hour as usize + i) % 24) as u32;
            value *= 1.0 + hourly_factor(hour);

            value.max(0.0)
        })
        .collect()
}

/// Hour of day (UTC) of a millisecond timestamp.
pub fn hour_of_day(timestamp_ms: i64) -> u32 {
    timestamp_ms.div_euclid(HOUR_MS).rem_euclid(24) as u32
}

/// Group readings by UTC hour of day and summarize each group.
pub fn hourly_profile(readings: &[Reading]) -> Result<HourlyProfile> {
    if readings.is_empty() {
        return Err(ForecastError::EmptySeries);
    }

    let mut buckets: Vec<Vec<f64>> = vec![Vec::new(); 24];
    for reading in readings {
        buckets[hour_of_day(reading.timestamp) as usize].push(reading.value);
    }

    let patterns: Vec<HourlyPattern> = buckets
        .iter()
        .enumerate()
        .filter(|(_, values)| !values.is_empty())
        .map(|(hour, values)| HourlyPattern {
            hour: hour as u32,
            mean: metrics::mean(values),
            std_dev: metrics::std_dev(values),
            min: values.iter().cloned().fold(f64::INFINITY, f64::min),
            max: values.iter().cloned().fold(f64::NEG_INFINITY, f64::max),
            count: values.len(),
        })
        .collect();

    let values: Vec<f64> = readings.iter().map(|r| r.value).collect();
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    debug!(hours = patterns.len(), "Hourly profile computed");

    Ok(HourlyProfile {
        patterns,
        min,
        max,
        series_std: metrics::std_dev(&values),
    })
}

/// Per-step hourly blend applied inside the autoregressive loop.
///
/// Works in the normalized domain: the model output is shifted toward the
/// normalized mean of the step's hour, jittered with uniform noise and
/// clamped inside the central 80% of the historical range.
#[derive(Debug, Clone)]
pub struct HourlyBlender<'a> {
    profile: &'a HourlyProfile,
    scaler: &'a ScalerState,
    lower: f64,
    upper: f64,
}

impl<'a> HourlyBlender<'a> {
    pub fn new(profile: &'a HourlyProfile, scaler: &'a ScalerState) -> Self {
        let range = profile.max - profile.min;
        let lower = scaler.apply(profile.min + BLEND_MARGIN * range);
        let upper = scaler.apply(profile.max - BLEND_MARGIN * range);
        Self {
            profile,
            scaler,
            lower: lower.min(upper),
            upper: lower.max(upper),
        }
    }

    /// Shift of the normalized prediction for `hour`; zero for hours with
    /// no history.
    pub fn modulation(&self, hour: u32) -> f64 {
        self.profile.pattern(hour).map_or(0.0, |pattern| {
            (self.scaler.apply(pattern.mean) - self.scaler.kind().baseline()) * BLEND_INFLUENCE
        })
    }

    /// Width of the uniform noise band for `hour`.
    pub fn noise_width(&self, hour: u32) -> f64 {
        let scale = self.scaler.scale();
        match self.profile.pattern(hour) {
            Some(pattern) => pattern.std_dev / scale * BLEND_NOISE,
            None => NOISE_FRACTION * self.profile.series_std / scale * BLEND_FALLBACK_NOISE,
        }
    }

    /// Blend one normalized prediction for the given hour of day.
    pub fn blend<R: Rng + ?Sized>(&self, prediction: f64, hour: u32, rng: &mut R) -> f64 {
        let noise = (rng.gen::<f64>() - 0.5) * self.noise_width(hour);
        (prediction + self.modulation(hour) + noise).clamp(self.lower, self.upper)
    }

    /// Normalized clamp bounds.
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }
}

fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std: f64) -> f64 {
    if !(std > 0.0 && std.is_finite()) {
        return mean;
    }
    Normal::new(mean, std).map_or(mean, |normal| normal.sample(rng))
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_spi::ScalerKind;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_analyze_detects_spikes() {
        let mut series = vec![10.0; 40];
        series[20] = 60.0;
        let profile = analyze(&series).unwrap();

        assert!(profile.std > 0.0);
        assert!((profile.spike_frequency - 1.0 / 40.0).abs() < 1e-12);
        assert!((profile.avg_spike_height - (60.0 - profile.mean)).abs() < 1e-9);
    }

    #[test]
    fn test_gradual_rise_is_not_a_spike() {
        let series: Vec<f64> = (0..50).map(f64::from).collect();
        let profile = analyze(&series).unwrap();
        assert_eq!(profile.spike_frequency, 0.0);
        assert!((profile.avg_spike_height - 2.0 * profile.std).abs() < 1e-12);
    }

    #[test]
    fn test_analyze_constant_series() {
        let profile = analyze(&[42.0; 30]).unwrap();
        assert_eq!(profile.mean, 42.0);
        assert_eq!(profile.std, 0.0);
        assert_eq!(profile.spike_frequency, 0.0);
        assert_eq!(profile.avg_spike_height, 0.0);
    }

    #[test]
    fn test_analyze_empty() {
        assert_eq!(analyze(&[]), Err(ForecastError::EmptySeries));
    }

    #[test]
    fn test_hourly_factor() {
        assert_eq!(hourly_factor(8), 0.10);
        assert_eq!(hourly_factor(20), 0.10);
        assert_eq!(hourly_factor(21), -0.05);
        assert_eq!(hourly_factor(7), -0.05);
        assert_eq!(hourly_factor(32), 0.10);
    }

    #[test]
    fn test_variation_without_noise_is_diurnal_only() {
        let profile = VariationProfile {
            mean: 100.0,
            std: 0.0,
            spike_frequency: 0.0,
            avg_spike_height: 0.0,
        };
        let mut rng = StdRng::seed_from_u64(1);
        let out = apply_variation(&profile, &[100.0; 4], 19, &mut rng);

        // Hours 19, 20, 21, 22
        assert!((out[0] - 110.0).abs() < 1e-9);
        assert!((out[1] - 110.0).abs() < 1e-9);
        assert!((out[2] - 95.0).abs() < 1e-9);
        assert!((out[3] - 95.0).abs() < 1e-9);
    }

    #[test]
    fn test_variation_clamps_at_zero() {
        let profile = VariationProfile {
            mean: 1.0,
            std: 50.0,
            spike_frequency: 0.0,
            avg_spike_height: 100.0,
        };
        let mut rng = StdRng::seed_from_u64(9);
        let out = apply_variation(&profile, &[0.0; 200], 0, &mut rng);
        assert_eq!(out.len(), 200);
        assert!(out.iter().all(|v| *v >= 0.0));
        assert!(out.iter().any(|v| *v == 0.0));
    }

    #[test]
    fn test_certain_spikes_raise_every_value() {
        let profile = VariationProfile {
            mean: 10.0,
            std: 0.0,
            spike_frequency: 1.0,
            avg_spike_height: 20.0,
        };
        let mut rng = StdRng::seed_from_u64(3);
        let out = apply_variation(&profile, &[10.0; 50], 12, &mut rng);
        // Night factor 0.95 is the smallest multiplier applied to 10 + |spike|
        assert!(out.iter().all(|v| *v >= 9.5 - 1e-9));
        assert!(out.iter().any(|v| *v > 11.5));
    }

    #[test]
    fn test_seeded_variation_is_reproducible() {
        let profile = VariationProfile {
            mean: 5.0,
            std: 2.0,
            spike_frequency: 0.1,
            avg_spike_height: 4.0,
        };
        let raw = [5.0; 24];
        let a = apply_variation(&profile, &raw, 3, &mut StdRng::seed_from_u64(11));
        let b = apply_variation(&profile, &raw, 3, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }

    #[test]
    fn test_hour_of_day() {
        assert_eq!(hour_of_day(0), 0);
        assert_eq!(hour_of_day(13 * HOUR_MS + 59_000), 13);
        assert_eq!(hour_of_day(25 * HOUR_MS), 1);
        assert_eq!(hour_of_day(-HOUR_MS), 23);
    }

    fn two_day_readings() -> Vec<Reading> {
        (0..48)
            .map(|i| {
                let hour = i % 24;
                let value = if (8..=20).contains(&hour) { 80.0 } else { 20.0 } + (i / 24) as f64;
                Reading::new(i as i64 * HOUR_MS, value)
            })
            .collect()
    }

    #[test]
    fn test_hourly_profile() {
        let profile = hourly_profile(&two_day_readings()).unwrap();
        assert_eq!(profile.covered_hours(), 24);
        assert_eq!(profile.min, 20.0);
        assert_eq!(profile.max, 81.0);

        let noon = profile.pattern(12).unwrap();
        assert_eq!(noon.count, 2);
        assert!((noon.mean - 80.5).abs() < 1e-12);
        assert!((noon.std_dev - 0.5).abs() < 1e-12);
        assert_eq!(noon.min, 80.0);
        assert_eq!(noon.max, 81.0);
    }

    #[test]
    fn test_hourly_profile_partial_coverage() {
        let readings: Vec<Reading> = (0..6).map(|i| Reading::new(i * HOUR_MS, 1.0)).collect();
        let profile = hourly_profile(&readings).unwrap();
        assert_eq!(profile.covered_hours(), 6);
        assert!(profile.pattern(10).is_none());
    }

    #[test]
    fn test_blender_follows_hour_mean() {
        let profile = hourly_profile(&two_day_readings()).unwrap();
        let scaler = ScalerState::new(ScalerKind::MinMax, 20.0, 61.0).unwrap();
        let blender = HourlyBlender::new(&profile, &scaler);

        assert!(blender.modulation(12) > 0.0);
        assert!(blender.modulation(2) < 0.0);

        let (lower, upper) = blender.bounds();
        assert!((lower - 0.1).abs() < 1e-12);
        assert!((upper - 0.9).abs() < 1e-12);

        let mut rng = StdRng::seed_from_u64(5);
        for hour in 0..24 {
            let v = blender.blend(0.5, hour, &mut rng);
            assert!(v >= lower && v <= upper);
        }
        assert_eq!(blender.blend(5.0, 12, &mut rng), upper);
        assert_eq!(blender.blend(-5.0, 2, &mut rng), lower);
    }

    #[test]
    fn test_blender_fallback_noise_for_missing_hour() {
        let readings: Vec<Reading> = (0..4)
            .map(|i| Reading::new(i * HOUR_MS, 10.0 + i as f64))
            .collect();
        let profile = hourly_profile(&readings).unwrap();
        let scaler = ScalerState::new(ScalerKind::ZScore, 11.5, 2.0).unwrap();
        let blender = HourlyBlender::new(&profile, &scaler);

        assert_eq!(blender.modulation(15), 0.0);
        let expected = NOISE_FRACTION * profile.series_std / 2.0 * 0.1;
        assert!((blender.noise_width(15) - expected).abs() < 1e-12);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_variation_non_negative(
            raw in prop::collection::vec(0.0f64..500.0, 0..100),
            std in 0.0f64..200.0,
            spike_frequency in 0.0f64..1.0,
            avg_spike_height in 0.0f64..400.0,
            start_hour in 0u32..24,
            seed in any::<u64>(),
        ) {
            let profile = VariationProfile { mean: 100.0, std, spike_frequency, avg_spike_height };
            let mut rng = StdRng::seed_from_u64(seed);
            let out = apply_variation(&profile, &raw, start_hour, &mut rng);
            prop_assert_eq!(out.len(), raw.len());
            prop_assert!(out.iter().all(|v| *v >= 0.0 && v.is_finite()));
        }
    }
}
