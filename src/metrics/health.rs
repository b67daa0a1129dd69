//! Health check endpoints and Prometheus metrics server
//!
//! HTTP endpoints for health checks and Prometheus metrics for the lobby
//! herald, served with Axum.

use crate::metrics::collector::MetricsCollector;
use crate::service::health::{HealthCheck, HealthView, HealthStatus};
use anyhow::{Context, Result};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use prometheus::{Encoder, TextEncoder};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

/// Health server configuration
#[derive(Debug, Clone)]
pub struct HealthServerConfig {
    /// Port to bind the health server to
    pub port: u16,
    /// Host to bind to (typically "0.0.0.0" for all interfaces)
    pub host: String,
}

impl Default for HealthServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            host: "0.0.0.0".to_string(),
        }
    }
}

/// Shared state for the health server
#[derive(Clone)]
pub struct HealthServerState {
    pub metrics_collector: Arc<MetricsCollector>,
    pub view: Option<HealthView>,
}

/// Health server that provides HTTP endpoints for monitoring
pub struct HealthServer {
    config: HealthServerConfig,
    state: HealthServerState,
    shutdown_tx: broadcast::Sender<()>,
}

impl HealthServer {
    /// Create a new health server
    pub fn new(config: HealthServerConfig, metrics_collector: Arc<MetricsCollector>) -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            state: HealthServerState {
                metrics_collector,
                view: None,
            },
            shutdown_tx,
        }
    }

    /// Attach the service view used by the health endpoints
    pub fn with_view(mut self, view: HealthView) -> Self {
        self.state.view = Some(view);
        self
    }

    pub fn config(&self) -> &HealthServerConfig {
        &self.config
    }

    /// Start the health server
    pub async fn start(&self) -> Result<()> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .context("Invalid health server address")?;

        let app = self.create_router();
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind health server to {}", addr))?;

        info!("Health server listening on http://{}", addr);

        let mut shutdown_rx = self.shutdown_tx.subscribe();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
                info!("Health server shutdown signal received");
            })
            .await?;

        info!("Health server stopped");
        Ok(())
    }

    /// Create the Axum router with all health endpoints
    pub fn create_router(&self) -> Router {
        Router::new()
            .route("/", get(root_handler))
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
            .route("/alive", get(alive_handler))
            .route("/metrics", get(metrics_handler))
            .route("/stats", get(stats_handler))
            .with_state(self.state.clone())
    }

    /// Stop the health server
    pub async fn stop(&self) -> Result<()> {
        info!("Stopping health server...");

        if let Err(e) = self.shutdown_tx.send(()) {
            warn!("Failed to send shutdown signal to health server: {}", e);
        }

        Ok(())
    }
}

/// Root endpoint handler - shows service information
async fn root_handler() -> impl IntoResponse {
    let info = json!({
        "service": "lobby-herald",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": [
            "/health",
            "/ready",
            "/alive",
            "/metrics",
            "/stats"
        ]
    });

    Json(info)
}

/// Lightweight health check endpoint handler
async fn health_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Health check requested");

    let status = match &state.view {
        Some(view) => match HealthCheck::check(view).await {
            Ok(health) => Some(health.status),
            Err(e) => {
                error!("Health check failed: {}", e);
                None
            }
        },
        None => None,
    };

    let (code, label) = match status {
        Some(HealthStatus::Healthy) => (StatusCode::OK, "healthy"),
        Some(HealthStatus::Degraded) => (StatusCode::OK, "degraded"),
        Some(HealthStatus::Unhealthy) | None => (StatusCode::SERVICE_UNAVAILABLE, "unhealthy"),
    };

    let mut body = json!({
        "status": label,
        "service": "lobby-herald",
        "version": env!("CARGO_PKG_VERSION")
    });
    if state.view.is_none() {
        body["error"] = json!("Service not initialized");
    }

    (code, Json(body))
}

/// Readiness check endpoint handler
async fn ready_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Readiness check requested");

    match &state.view {
        Some(view) => match HealthCheck::readiness_check(view).await {
            Ok(HealthStatus::Healthy) => (StatusCode::OK, "Ready"),
            Ok(HealthStatus::Degraded) => (StatusCode::OK, "Degraded but ready"),
            Ok(HealthStatus::Unhealthy) => (StatusCode::SERVICE_UNAVAILABLE, "Not ready"),
            Err(e) => {
                error!("Readiness check failed: {}", e);
                (StatusCode::SERVICE_UNAVAILABLE, "Not ready")
            }
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service not initialized"),
    }
}

/// Liveness check endpoint handler
async fn alive_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Liveness check requested");

    match &state.view {
        Some(view) => match HealthCheck::liveness_check(view).await {
            Ok(HealthStatus::Healthy) => (StatusCode::OK, "Alive"),
            _ => (StatusCode::SERVICE_UNAVAILABLE, "Not alive"),
        },
        None => (StatusCode::SERVICE_UNAVAILABLE, "Service not initialized"),
    }
}

/// Prometheus metrics endpoint handler
async fn metrics_handler(State(state): State<HealthServerState>) -> Response {
    debug!("Metrics endpoint requested");

    let registry = state.metrics_collector.registry();
    let metric_families = registry.gather();
    let encoder = TextEncoder::new();

    match encoder.encode_to_string(&metric_families) {
        Ok(metrics_output) => (
            StatusCode::OK,
            [("content-type", encoder.format_type().to_string())],
            metrics_output,
        )
            .into_response(),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to encode metrics".to_string(),
            )
                .into_response()
        }
    }
}

/// Detailed tracker statistics endpoint handler
async fn stats_handler(State(state): State<HealthServerState>) -> impl IntoResponse {
    debug!("Stats endpoint requested");

    let Some(view) = &state.view else {
        let error_response = json!({
            "service": {
                "name": "lobby-herald",
                "version": env!("CARGO_PKG_VERSION"),
                "status": "error"
            },
            "error": "Service not initialized",
            "timestamp": chrono::Utc::now()
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(error_response));
    };

    match HealthCheck::check(view).await {
        Ok(health) => {
            let stats = json!({
                "service": {
                    "name": health.service,
                    "version": health.version,
                    "status": health.status,
                    "uptime_seconds": health.stats.uptime_seconds
                },
                "tracker": view.tracker_stats(),
                "components": health.checks,
                "timestamp": chrono::Utc::now()
            });

            (StatusCode::OK, Json(stats))
        }
        Err(e) => {
            error!("Failed to get stats: {}", e);

            let error_response = json!({
                "service": {
                    "name": view.service_name(),
                    "version": env!("CARGO_PKG_VERSION"),
                    "status": "error"
                },
                "error": "Failed to get service stats",
                "timestamp": chrono::Utc::now()
            });

            (StatusCode::SERVICE_UNAVAILABLE, Json(error_response))
        }
    }
}
