//! Unit tests for the forecast facade
//!
//! Error contracts, configuration and thread-safety of the public types.

use forecast_facade::{
    Accuracy, ErrorKind, ForecastConfig, ForecastError, ForecastResult, ForecastSession,
    HourAnchor, PredictionService, ScalerKind, VariationStrategy,
};

// ============================================================================
// Error Tests
// ============================================================================

#[test]
fn test_error_messages() {
    assert_eq!(
        ForecastError::InsufficientData {
            required: 40,
            actual: 24
        }
        .to_string(),
        "Insufficient data: need at least 40 points, got 24"
    );
    assert_eq!(
        ForecastError::NotTrained.to_string(),
        "Model not trained: call train() first"
    );
    assert_eq!(
        ForecastError::Busy.to_string(),
        "Session busy: a training run is already in progress"
    );
}

#[test]
fn test_error_kinds_map_to_responses() {
    assert_eq!(ForecastError::EmptySeries.kind(), ErrorKind::Caller);
    assert_eq!(
        ForecastError::InvalidData("NaN".into()).kind(),
        ErrorKind::Caller
    );
    assert_eq!(ForecastError::NotTrained.kind(), ErrorKind::Caller);
    assert_eq!(ForecastError::Busy.kind(), ErrorKind::Conflict);
    assert_eq!(
        ForecastError::TrainingFailure("diverged".into()).kind(),
        ErrorKind::Internal
    );
}

#[test]
fn test_error_is_boxable() {
    fn fails() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(ForecastError::NotTrained)?;
        Ok(())
    }
    assert_eq!(
        fails().unwrap_err().to_string(),
        "Model not trained: call train() first"
    );
}

// ============================================================================
// Configuration Tests
// ============================================================================

#[test]
fn test_preset_names() {
    for (name, scaler, variation) in [
        ("standard", ScalerKind::MinMax, VariationStrategy::None),
        ("hybrid", ScalerKind::MinMax, VariationStrategy::HourlyBlend),
        ("advanced", ScalerKind::ZScore, VariationStrategy::PostHoc),
    ] {
        let config = ForecastConfig::preset(name).unwrap();
        assert_eq!(config.scaler_kind, scaler, "{}", name);
        assert_eq!(config.variation, variation, "{}", name);
    }
}

#[test]
fn test_config_json_field_names() {
    let json = serde_json::to_value(ForecastConfig::hybrid()).unwrap();
    assert_eq!(json["scaler_kind"], "min_max");
    assert_eq!(json["variation"], "hourly_blend");
    assert_eq!(json["hour_anchor"], "wall_clock");
    assert_eq!(json["network"]["first_units"], 50);
    assert_eq!(json["max_steps"], 336);
}

#[test]
fn test_config_from_json_override() {
    let config: ForecastConfig = serde_json::from_str(
        r#"{"scaler_kind": "min_max", "variation": "none", "hour_anchor": "origin", "seed": 9}"#,
    )
    .unwrap();
    assert_eq!(config.scaler_kind, ScalerKind::MinMax);
    assert_eq!(config.variation, VariationStrategy::None);
    assert_eq!(config.hour_anchor, HourAnchor::Origin);
    assert_eq!(config.seed, Some(9));
    assert_eq!(config.lookback, 12);
}

// ============================================================================
// Result and Thread-safety Tests
// ============================================================================

#[test]
fn test_forecast_result_json_shape() {
    let result = ForecastResult {
        values: vec![1.5, 2.25],
        timestamps: vec!["2024-01-01 01:00".into(), "2024-01-01 02:00".into()],
        accuracy: Accuracy::new(0.5, 0.75),
    };
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["values"][1], 2.25);
    assert_eq!(json["timestamps"][0], "2024-01-01 01:00");
    assert_eq!(json["accuracy"]["rmse"], 0.75);
    assert_eq!(result.len(), 2);
}

#[test]
fn test_public_types_are_thread_safe() {
    fn assert_send<T: Send>() {}
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send::<PredictionService>();
    assert_send_sync::<ForecastSession>();
    assert_send_sync::<ForecastError>();
    assert_send_sync::<ForecastConfig>();
}
