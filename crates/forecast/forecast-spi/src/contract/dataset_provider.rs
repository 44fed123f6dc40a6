//! Boundary to the store that owns historical readings.

use crate::error::Result;
use crate::model::HistoricalDataset;

/// Source of the historical readings a model is trained and forecast on.
///
/// Implementations return readings ascending by timestamp without duplicate
/// timestamps.
pub trait HistoricalDataProvider: Send + Sync {
    /// Provider name, used in logs.
    fn name(&self) -> &str;

    /// Load the complete historical dataset.
    fn load(&self) -> Result<HistoricalDataset>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reading;

    struct FixedProvider(Vec<Reading>);

    impl HistoricalDataProvider for FixedProvider {
        fn name(&self) -> &str {
            "fixed"
        }

        fn load(&self) -> Result<HistoricalDataset> {
            Ok(HistoricalDataset::from_readings(self.0.clone()))
        }
    }

    #[test]
    fn test_provider_as_trait_object() {
        let provider: Box<dyn HistoricalDataProvider> =
            Box::new(FixedProvider(vec![Reading::new(2, 1.0), Reading::new(1, 0.5)]));
        let dataset = provider.load().unwrap();
        assert_eq!(provider.name(), "fixed");
        assert_eq!(dataset.values(), vec![0.5, 1.0]);
    }
}
