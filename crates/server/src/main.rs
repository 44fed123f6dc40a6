//! # server
//!
//! REST API for training and querying the gas-concentration forecaster.

use forecast_facade::{ForecastSession, HistoricalDataProvider};
use std::env;
use std::error::Error;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod provider;
mod routes;

use provider::JsonFileProvider;
use routes::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env file (optional - won't fail if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "server=info,forecast_core=info,tower_http=info".into()),
        )
        .init();

    let preset = env::var("FORECAST_PRESET").ok();
    let override_path = env::var("FORECAST_CONFIG").ok().map(PathBuf::from);
    let forecast_config = config::load(preset.as_deref(), override_path.as_deref())?;

    let dataset_path =
        env::var("DATASET_PATH").unwrap_or_else(|_| "data/readings.json".to_string());
    let provider = JsonFileProvider::new(dataset_path);
    tracing::info!(
        provider = provider.name(),
        path = %provider.path().display(),
        scaler = %forecast_config.scaler_kind,
        variation = ?forecast_config.variation,
        lookback = forecast_config.lookback,
        "Forecast pipeline configured"
    );

    let state = AppState {
        session: Arc::new(ForecastSession::new(forecast_config)?),
        provider: Arc::new(provider),
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .map_err(|e| format!("PORT must be a valid number: {}", e))?;
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| format!("Invalid HOST:PORT configuration: {}", e))?;

    tracing::info!("server v{} listening on {}", env!("CARGO_PKG_VERSION"), addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
