//! Forecast configuration resolved from the environment.

use forecast_facade::ForecastConfig;
use serde_json::Value;
use std::error::Error;
use std::fs;
use std::path::Path;

/// Preset used when `FORECAST_PRESET` is unset.
pub const DEFAULT_PRESET: &str = "advanced";

/// Start from the named preset and overlay the JSON object in
/// `override_path`, if any. Keys missing from the file keep the preset's
/// values.
pub fn load(
    preset: Option<&str>,
    override_path: Option<&Path>,
) -> Result<ForecastConfig, Box<dyn Error>> {
    let base = ForecastConfig::preset(preset.unwrap_or(DEFAULT_PRESET))?;
    let Some(path) = override_path else {
        return Ok(base);
    };

    let overrides: Value = serde_json::from_str(&fs::read_to_string(path)?)?;
    if !overrides.is_object() {
        return Err(format!("{}: expected a JSON object", path.display()).into());
    }

    let mut merged = serde_json::to_value(&base)?;
    merge(&mut merged, overrides);
    let config: ForecastConfig = serde_json::from_value(merged)?;
    config.validate()?;
    Ok(config)
}

fn merge(target: &mut Value, overrides: Value) {
    match (target, overrides) {
        (Value::Object(target), Value::Object(overrides)) => {
            for (key, value) in overrides {
                match target.get_mut(&key) {
                    Some(slot) => merge(slot, value),
                    None => {
                        target.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forecast_facade::{ScalerKind, VariationStrategy};
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn json_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_default_preset() {
        assert_eq!(load(None, None).unwrap(), ForecastConfig::advanced());
    }

    #[test]
    fn test_named_preset() {
        let config = load(Some("hybrid"), None).unwrap();
        assert_eq!(config.variation, VariationStrategy::HourlyBlend);
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load(Some("quantum"), None).is_err());
    }

    #[test]
    fn test_override_keeps_preset_values() {
        let file = json_file(r#"{"epochs": 3, "network": {"first_units": 8}, "seed": 5}"#);
        let config = load(Some("standard"), Some(file.path())).unwrap();

        assert_eq!(config.epochs, 3);
        assert_eq!(config.seed, Some(5));
        assert_eq!(config.network.first_units, 8);
        // untouched keys come from the standard preset
        assert_eq!(config.network.second_units, 50);
        assert_eq!(config.lookback, 30);
        assert_eq!(config.scaler_kind, ScalerKind::MinMax);
    }

    #[test]
    fn test_invalid_override_rejected() {
        let file = json_file(r#"{"lookback": 0}"#);
        assert!(load(None, Some(file.path())).is_err());

        let file = json_file("[1, 2]");
        assert!(load(None, Some(file.path())).is_err());
    }
}
