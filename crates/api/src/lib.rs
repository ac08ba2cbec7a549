//! Outbreak Sentinel API Server
//!
//! REST boundary for the prediction pipeline: validates input, maps
//! pipeline errors to HTTP status codes, and exposes Prometheus metrics.

use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use fallback::OllamaAdvisor;
use inference_engine::{InferenceError, ModelArtifact, RiskClassifier};
use metrics_exporter_prometheus::PrometheusHandle;
use pipeline::PredictionPipeline;
use serde::Serialize;
use std::sync::Arc;
use storage::{HistoryStore, MemoryStore, SqliteStore};
use tokio::sync::RwLock;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

mod config;
mod error;
mod routes;

pub use crate::config::{AppConfig, LoggingConfig, ModelConfig, ServerConfig, StorageConfig, CONFIG_PATH_ENV};
pub use crate::error::ApiError;

/// State shared across handlers
pub type SharedState = Arc<RwLock<AppState>>;

/// Application state
pub struct AppState {
    pub pipeline: PredictionPipeline,
    pub version: String,
    pub start_time: std::time::Instant,
    /// Present when the binary installed a Prometheus recorder
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    pub fn new(pipeline: PredictionPipeline) -> Self {
        Self {
            pipeline,
            version: env!("CARGO_PKG_VERSION").to_string(),
            start_time: std::time::Instant::now(),
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub components: ComponentStatus,
}

/// Component status
#[derive(Debug, Serialize)]
pub struct ComponentStatus {
    pub model: ComponentHealth,
    pub database: ComponentHealth,
}

/// Individual component health
#[derive(Debug, Serialize)]
pub struct ComponentHealth {
    pub status: String,
    pub detail: Option<String>,
}

/// Build the pipeline described by a configuration
pub async fn build_pipeline(config: &AppConfig) -> anyhow::Result<PredictionPipeline> {
    let alerting = config.alerting();
    alerting.validate()?;

    let classifier = match &config.model.dir {
        Some(dir) => match ModelArtifact::load(dir) {
            Ok(artifact) => RiskClassifier::new(Arc::new(artifact)),
            Err(InferenceError::ModelUnavailable(reason)) => {
                warn!("Model unavailable ({}); only override rules will classify", reason);
                RiskClassifier::without_model()
            }
            Err(e) => return Err(e.into()),
        },
        None => {
            warn!("No model directory configured; only override rules will classify");
            RiskClassifier::without_model()
        }
    };

    let store: Arc<dyn HistoryStore> = if config.storage.is_memory() {
        Arc::new(MemoryStore::with_retention(config.storage.max_memory_records))
    } else {
        Arc::new(SqliteStore::connect(&config.storage.url).await?)
    };

    let mut pipeline = PredictionPipeline::new(classifier, store, alerting);
    if config.advice.enabled {
        let advisor = OllamaAdvisor::new(&config.advice)?;
        pipeline = pipeline.with_advisor(Arc::new(advisor), config.advice.timeout());
    }
    Ok(pipeline)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }
    let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Create the application router
pub fn create_router(state: SharedState, cors_origins: &[String]) -> Router {
    Router::new()
        .route("/api/v1/health", get(health_handler))
        .route("/api/v1/predict", post(routes::predictions::predict))
        .route("/api/v1/predict/batch", post(routes::predictions::predict_batch))
        .route("/api/v1/predictions", get(routes::predictions::get_predictions))
        .route("/api/v1/alerts", get(routes::alerts::get_alerts))
        .route("/api/v1/alerts/:id/resolve", patch(routes::alerts::resolve_alert))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .route("/api/v1/model/metrics", get(routes::stats::get_model_metrics))
        .route("/api/v1/agent/analyze", post(routes::agent::analyze))
        .route("/api/v1/agent/simulate", post(routes::agent::simulate))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(cors_origins))
        .with_state(state)
}

/// Health check handler
async fn health_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    let classifier = state.pipeline.classifier();
    let model = match classifier.artifact() {
        Some(artifact) => ComponentHealth {
            status: "ok".to_string(),
            detail: Some(artifact.version().to_string()),
        },
        None => ComponentHealth {
            status: "unavailable".to_string(),
            detail: Some("override rules only".to_string()),
        },
    };
    let store = state.pipeline.store();
    let database = match store.summary().await {
        Ok(_) => ComponentHealth {
            status: "ok".to_string(),
            detail: Some(store.name().to_string()),
        },
        Err(e) => ComponentHealth {
            status: "error".to_string(),
            detail: Some(e.to_string()),
        },
    };

    let status = if classifier.is_loaded() && database.status == "ok" {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        components: ComponentStatus { model, database },
    })
}

/// Prometheus exposition
async fn metrics_handler(State(state): State<SharedState>) -> impl IntoResponse {
    let state = state.read().await;
    match &state.metrics {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (
            StatusCode::NOT_FOUND,
            "metrics recorder not installed".to_string(),
        ),
    }
}

/// Initialize logging
pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let level: Level = config
        .level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level '{}'", config.level))?;

    if config.json {
        let subscriber = FmtSubscriber::builder()
            .json()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(true)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    Ok(())
}

/// Run the server
pub async fn run_server(config: AppConfig, metrics: Option<PrometheusHandle>) -> anyhow::Result<()> {
    let pipeline = build_pipeline(&config).await?;
    let mut state = AppState::new(pipeline);
    if let Some(handle) = metrics {
        state = state.with_metrics(handle);
    }

    let app = create_router(Arc::new(RwLock::new(state)), &config.server.cors_origins);

    info!("Starting API server on {}", config.server.bind);
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
