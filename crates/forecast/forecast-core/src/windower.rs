//! Supervised windows over a normalized series.

use forecast_spi::{ForecastError, Result, TrainingSet};

/// Fewest (window, target) pairs a training set may hold.
pub const MIN_TRAINING_PAIRS: usize = 2;

/// Number of pairs a series of `len` values yields for `lookback`.
pub fn pair_count(len: usize, lookback: usize) -> usize {
    len.saturating_sub(lookback)
}

/// Slide a window of `lookback` values over `normalized`, pairing each
/// window with the value that follows it.
pub fn build_training_set(normalized: &[f64], lookback: usize) -> Result<TrainingSet> {
    if lookback == 0 {
        return Err(ForecastError::invalid_parameter("lookback", "must be at least 1"));
    }

    let pairs = pair_count(normalized.len(), lookback);
    if pairs < MIN_TRAINING_PAIRS {
        return Err(ForecastError::InsufficientData {
            required: lookback + MIN_TRAINING_PAIRS,
            actual: normalized.len(),
        });
    }

    let inputs = normalized
        .windows(lookback)
        .take(pairs)
        .map(<[f64]>::to_vec)
        .collect();
    let targets = normalized[lookback..].to_vec();

    Ok(TrainingSet { inputs, targets })
}

/// The final `lookback` values of `normalized`.
pub fn last_window(normalized: &[f64], lookback: usize) -> Result<&[f64]> {
    if lookback == 0 {
        return Err(ForecastError::invalid_parameter("lookback", "must be at least 1"));
    }
    if normalized.len() < lookback {
        return Err(ForecastError::InsufficientData {
            required: lookback,
            actual: normalized.len(),
        });
    }
    Ok(&normalized[normalized.len() - lookback..])
}
