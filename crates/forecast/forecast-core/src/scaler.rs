//! Invertible normalization of a one-dimensional series.

use crate::metrics;
use forecast_spi::{ForecastError, Result, ScalerKind, ScalerState};

/// Fits a [`ScalerState`] of a fixed kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scaler {
    kind: ScalerKind,
}

impl Scaler {
    pub fn new(kind: ScalerKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> ScalerKind {
        self.kind
    }

    /// Fit location and scale to `series`.
    ///
    /// Z-score uses the mean and population standard deviation, min-max uses
    /// the minimum and the range. A constant series gets `scale = 1`.
    pub fn fit(&self, series: &[f64]) -> Result<ScalerState> {
        if series.is_empty() {
            return Err(ForecastError::EmptySeries);
        }
        if let Some(index) = series.iter().position(|v| !v.is_finite()) {
            return Err(ForecastError::InvalidData(format!(
                "non-finite value at index {}",
                index
            )));
        }

        let (location, spread) = match self.kind {
            ScalerKind::ZScore => (metrics::mean(series), metrics::std_dev(series)),
            ScalerKind::MinMax => {
                let min = series.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = series.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                (min, max - min)
            }
        };

        let scale = if spread > 0.0 && spread.is_finite() {
            spread
        } else {
            1.0
        };

        ScalerState::new(self.kind, location, scale)
    }

    /// Fit and normalize in one pass.
    pub fn fit_transform(&self, series: &[f64]) -> Result<(ScalerState, Vec<f64>)> {
        let state = self.fit(series)?;
        let normalized = state.apply_all(series);
        Ok((state, normalized))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Vec<f64> {
        (0..48)
            .map(|i| 400.0 + 30.0 * (i as f64 * 0.26).sin() + i as f64)
            .collect()
    }

    #[test]
    fn test_zscore_fit() {
        let data = sample();
        let (state, normalized) = Scaler::new(ScalerKind::ZScore).fit_transform(&data).unwrap();
        assert_eq!(state.kind(), ScalerKind::ZScore);
        assert!(metrics::mean(&normalized).abs() < 1e-9);
        assert!((metrics::std_dev(&normalized) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_minmax_fit() {
        let data = sample();
        let (state, normalized) = Scaler::new(ScalerKind::MinMax).fit_transform(&data).unwrap();
        let min = normalized.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = normalized.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(min.abs() < 1e-12);
        assert!((max - 1.0).abs() < 1e-12);
        assert!(state.scale() > 0.0);
    }

    #[test]
    fn test_constant_series_uses_unit_scale() {
        for kind in [ScalerKind::ZScore, ScalerKind::MinMax] {
            let state = Scaler::new(kind).fit(&[42.0; 10]).unwrap();
            assert_eq!(state.location(), 42.0);
            assert_eq!(state.scale(), 1.0);
            assert_eq!(state.apply(42.0), 0.0);
        }
    }

    #[test]
    fn test_empty_series() {
        assert_eq!(
            Scaler::new(ScalerKind::ZScore).fit(&[]),
            Err(ForecastError::EmptySeries)
        );
    }

    #[test]
    fn test_non_finite_rejected() {
        let result = Scaler::new(ScalerKind::MinMax).fit(&[1.0, f64::INFINITY, 2.0]);
        assert!(matches!(result, Err(ForecastError::InvalidData(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(256))]

        #[test]
        fn prop_round_trip(
            series in prop::collection::vec(0.0f64..10_000.0, 1..64),
            value in 0.0f64..10_000.0,
            minmax in any::<bool>(),
        ) {
            let kind = if minmax { ScalerKind::MinMax } else { ScalerKind::ZScore };
            let state = Scaler::new(kind).fit(&series).unwrap();
            let back = state.invert(state.apply(value));
            let tolerance = 1e-9 * value.abs().max(1.0);
            prop_assert!((back - value).abs() <= tolerance, "{} -> {}", value, back);
        }

        #[test]
        fn prop_scale_positive(series in prop::collection::vec(-1e6f64..1e6, 1..64)) {
            for kind in [ScalerKind::ZScore, ScalerKind::MinMax] {
                let state = Scaler::new(kind).fit(&series).unwrap();
                prop_assert!(state.scale() > 0.0);
            }
        }
    }
}
