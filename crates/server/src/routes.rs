//! API route handlers

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::SecondsFormat;
use forecast_facade::{
    CancelToken, ErrorKind, ForecastError, ForecastSession, HistoricalDataProvider,
    HistoricalDataset, LifecycleState, DEFAULT_FORECAST_STEPS, MAX_FORECAST_STEPS,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<ForecastSession>,
    pub provider: Arc<dyn HistoricalDataProvider>,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/predictions/train", post(train))
        .route("/api/predictions/forecast", get(forecast))
        .route("/api/predictions/dispose", post(dispose))
        .with_state(state)
}

/// JSON error body with a status picked from the error kind.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: Value,
}

impl ApiError {
    fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            body: json!({ "error": message.into() }),
        }
    }
}

impl From<ForecastError> for ApiError {
    fn from(err: ForecastError) -> Self {
        let status = match err.kind() {
            ErrorKind::Caller => StatusCode::BAD_REQUEST,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = match &err {
            ForecastError::InsufficientData { required, actual } => json!({
                "error": err.to_string(),
                "required": required,
                "current": actual,
            }),
            _ => json!({ "error": err.to_string() }),
        };
        Self { status, body }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let model = if state.session.is_training() {
        "training".to_string()
    } else {
        state
            .session
            .try_state()
            .map_or_else(|| "busy".to_string(), |s| s.to_string())
    };
    Json(json!({
        "status": "alive",
        "version": env!("CARGO_PKG_VERSION"),
        "model": model,
    }))
}

/// Cancels a train whose request went away before it finished.
struct CancelOnDrop {
    token: CancelToken,
    armed: bool,
}

impl CancelOnDrop {
    fn new(token: CancelToken) -> Self {
        Self { token, armed: true }
    }

    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.armed {
            self.token.cancel();
            warn!("Train request dropped, cancelling training");
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainResponse {
    pub success: bool,
    pub data_points: usize,
    pub days_used: usize,
    pub training_date: String,
}

pub async fn train(State(state): State<AppState>) -> Result<Json<TrainResponse>, ApiError> {
    let token = CancelToken::new();
    let guard = CancelOnDrop::new(token.clone());

    let joined = tokio::task::spawn_blocking(move || {
        if token.is_cancelled() {
            return Err(ForecastError::Cancelled {
                epochs_completed: 0,
            });
        }
        let dataset = state.provider.load()?;
        info!(
            provider = state.provider.name(),
            points = dataset.total_points,
            days = dataset.days,
            "Training requested"
        );
        state.session.train_with_cancel(&dataset, token)
    })
    .await;
    guard.disarm();

    let summary = joined.map_err(|e| {
        error!(error = %e, "Training task failed");
        ApiError::internal("training task failed")
    })??;

    Ok(Json(TrainResponse {
        success: true,
        data_points: summary.data_points,
        days_used: summary.days_used,
        training_date: summary
            .trained_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

#[derive(Debug, Default, Deserialize)]
pub struct ForecastQuery {
    pub steps: Option<String>,
}

impl ForecastQuery {
    /// Requested horizon; unparsable or zero falls back to the default,
    /// anything larger than the maximum is clamped.
    pub fn steps(&self) -> usize {
        self.steps
            .as_deref()
            .and_then(|s| s.trim().parse::<usize>().ok())
            .filter(|&steps| steps > 0)
            .unwrap_or(DEFAULT_FORECAST_STEPS)
            .min(MAX_FORECAST_STEPS)
    }
}

#[derive(Debug, Serialize)]
pub struct AccuracyBody {
    pub mae: String,
    pub rmse: String,
}

#[derive(Debug, Serialize)]
pub struct PredictionBody {
    pub future_values: Vec<f64>,
    pub future_dates: Vec<String>,
    pub accuracy: AccuracyBody,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResponse {
    pub success: bool,
    pub prediction: PredictionBody,
    pub steps_generated: usize,
}

pub async fn forecast(
    State(state): State<AppState>,
    Query(query): Query<ForecastQuery>,
) -> Result<Json<ForecastResponse>, ApiError> {
    let steps = query.steps();

    let result = tokio::task::spawn_blocking(move || {
        // An untrained session answers before the store is touched.
        if state.session.state() != LifecycleState::Trained {
            return Err(ForecastError::NotTrained);
        }
        let dataset: HistoricalDataset = state.provider.load()?;
        state.session.forecast_dataset(&dataset, steps)
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Forecast task failed");
        ApiError::internal("forecast task failed")
    })??;

    Ok(Json(ForecastResponse {
        success: true,
        prediction: PredictionBody {
            future_values: result.values.iter().map(|&v| round_to(v, 2)).collect(),
            future_dates: result.timestamps,
            accuracy: AccuracyBody {
                mae: format!("{:.4}", result.accuracy.mae),
                rmse: format!("{:.4}", result.accuracy.rmse),
            },
        },
        steps_generated: steps,
    }))
}

pub async fn dispose(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    tokio::task::spawn_blocking(move || state.session.dispose())
        .await
        .map_err(|e| {
            error!(error = %e, "Dispose task failed");
            ApiError::internal("dispose task failed")
        })?;
    Ok(Json(json!({ "success": true })))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
