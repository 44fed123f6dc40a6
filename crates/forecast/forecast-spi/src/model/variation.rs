//! Statistics used to make forecasts look like real sensor output.

use serde::{Deserialize, Serialize};

/// How forecasts are varied after (or during) the autoregressive rollout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariationStrategy {
    /// Raw model output, only floored at zero
    None,
    /// Gaussian noise, synthetic spikes and a day/night factor applied to the
    /// finished forecast
    #[default]
    PostHoc,
    /// Per-hour historical means and spreads blended into every
    /// autoregressive step
    HourlyBlend,
}

/// Noise and spike statistics of the unnormalized training series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VariationProfile {
    pub mean: f64,
    /// Population standard deviation
    pub std: f64,
    /// Fraction of points classified as spikes, in `[0, 1]`
    pub spike_frequency: f64,
    /// Mean of `value - mean` over spikes; `2 * std` when there are none
    pub avg_spike_height: f64,
}

/// Statistics of all readings that fell into one hour of the day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HourlyPattern {
    /// Hour of day (UTC), `0..24`
    pub hour: u32,
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Hour-of-day profile of a training series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyProfile {
    /// Patterns for the hours that had at least one reading, ascending by hour
    pub patterns: Vec<HourlyPattern>,
    /// Minimum over the whole series
    pub min: f64,
    /// Maximum over the whole series
    pub max: f64,
    /// Population standard deviation over the whole series
    pub series_std: f64,
}

impl HourlyProfile {
    pub fn pattern(&self, hour: u32) -> Option<&HourlyPattern> {
        self.patterns.iter().find(|p| p.hour == hour % 24)
    }

    /// Number of hours of the day with history.
    pub fn covered_hours(&self) -> usize {
        self.patterns.len()
    }
}
