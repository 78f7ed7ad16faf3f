//! Health check and metrics endpoint

use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use std::time::SystemTime;

/// Health check status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub uptime_seconds: u64,
    pub store_connected: bool,
    pub bot_username: Option<String>,
}

/// Metrics data
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub messages_received: u64,
    pub uploads: u64,
    pub batches: u64,
    pub captions_edited: u64,
    pub subscription_prompts: u64,
    pub approvals: u64,
    pub users_saved: u64,
    pub errors: u64,
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub metrics: Arc<RwLock<Metrics>>,
    pub start_time: SystemTime,
    pub bot_username: Option<String>,
    pub store_connected: Arc<RwLock<bool>>,
}

impl AppState {
    pub fn new(bot_username: Option<String>) -> Self {
        Self {
            metrics: Arc::new(RwLock::new(Metrics::default())),
            start_time: SystemTime::now(),
            bot_username,
            store_connected: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn set_store_connected(&self, connected: bool) {
        *self.store_connected.write().await = connected;
    }

    pub async fn snapshot(&self) -> Metrics {
        self.metrics.read().await.clone()
    }

    pub async fn increment_messages_received(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.messages_received += 1;
    }

    pub async fn increment_uploads(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.uploads += 1;
    }

    pub async fn increment_batches(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.batches += 1;
    }

    pub async fn increment_captions(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.captions_edited += 1;
    }

    pub async fn increment_subscription_prompts(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.subscription_prompts += 1;
    }

    pub async fn add_approvals(&self, count: u64) {
        let mut metrics = self.metrics.write().await;
        metrics.approvals += count;
    }

    pub async fn increment_users_saved(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.users_saved += 1;
    }

    pub async fn increment_errors(&self) {
        let mut metrics = self.metrics.write().await;
        metrics.errors += 1;
    }
}

/// Health check endpoint handler
async fn health_handler(State(state): State<AppState>) -> (StatusCode, Json<HealthStatus>) {
    let uptime = state.start_time
        .elapsed()
        .unwrap_or_default()
        .as_secs();

    let store_connected = *state.store_connected.read().await;

    let (status, status_code) = if store_connected {
        ("healthy", StatusCode::OK)
    } else {
        ("unhealthy", StatusCode::SERVICE_UNAVAILABLE)
    };

    (
        status_code,
        Json(HealthStatus {
            status: status.to_string(),
            uptime_seconds: uptime,
            store_connected,
            bot_username: state.bot_username.clone(),
        }),
    )
}

/// Metrics endpoint handler
async fn metrics_handler(State(state): State<AppState>) -> Json<Metrics> {
    Json(state.snapshot().await)
}

/// Create health check router
pub fn create_health_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/ready", get(ready_handler))
        .route("/live", get(live_handler))
        .with_state(state)
}

/// Readiness check (ready to accept traffic)
async fn ready_handler(State(state): State<AppState>) -> StatusCode {
    if *state.store_connected.read().await {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// Liveness check (process is alive)
async fn live_handler() -> StatusCode {
    StatusCode::OK
}

/// Start health check server
pub async fn start_health_server(state: AppState, port: u16) -> anyhow::Result<()> {
    let app = create_health_router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Health check server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
