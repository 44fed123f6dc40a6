//! Sensor readings and the historical dataset handed over by the store.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Milliseconds in one hour, the fixed spacing of forecast timestamps.
pub const HOUR_MS: i64 = 3_600_000;

const DAY_MS: i64 = 24 * HOUR_MS;

/// A single gas-concentration measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
    /// Concentration value
    pub value: f64,
}

impl Reading {
    pub fn new(timestamp: i64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Historical readings, ascending by timestamp, as returned by a
/// [`HistoricalDataProvider`](crate::HistoricalDataProvider).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoricalDataset {
    pub data: Vec<Reading>,
    /// Number of distinct calendar days (UTC) covered by `data`
    pub days: usize,
    pub total_points: usize,
}

impl HistoricalDataset {
    /// Build a dataset from readings, sorting them and dropping duplicate
    /// timestamps (the first reading for a timestamp wins).
    pub fn from_readings(mut readings: Vec<Reading>) -> Self {
        readings.sort_by_key(|r| r.timestamp);
        readings.dedup_by_key(|r| r.timestamp);

        let days = readings
            .iter()
            .map(|r| r.timestamp.div_euclid(DAY_MS))
            .collect::<BTreeSet<_>>()
            .len();

        Self {
            total_points: readings.len(),
            days,
            data: readings,
        }
    }

    /// Raw values in timestamp order.
    pub fn values(&self) -> Vec<f64> {
        self.data.iter().map(|r| r.value).collect()
    }

    /// Timestamp of the most recent reading.
    pub fn last_timestamp(&self) -> Option<i64> {
        self.data.last().map(|r| r.timestamp)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
