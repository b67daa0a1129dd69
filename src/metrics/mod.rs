//! Metrics and monitoring for the lobby herald
//!
//! Prometheus metrics for the poll loop and an Axum server exposing health,
//! readiness, liveness and metrics endpoints.

pub mod collector;
pub mod health;

pub use collector::{MetricsCollector, PerformanceMetrics, ServiceMetrics, TrackerMetrics};
pub use health::{HealthServer, HealthServerConfig};

use std::sync::Arc;

/// Unified metrics service that combines all monitoring capabilities
#[derive(Clone)]
pub struct MetricsService {
    collector: Arc<MetricsCollector>,
    health_server: Option<Arc<HealthServer>>,
}

impl MetricsService {
    /// Create a new metrics service; `health_server` is `None` when disabled
    pub fn new(collector: Arc<MetricsCollector>, health_server: Option<Arc<HealthServer>>) -> Self {
        Self {
            collector,
            health_server,
        }
    }

    /// Get the metrics collector
    pub fn collector(&self) -> Arc<MetricsCollector> {
        self.collector.clone()
    }

    /// Get the health server, if enabled
    pub fn health_server(&self) -> Option<Arc<HealthServer>> {
        self.health_server.clone()
    }

    /// Serve the health endpoints until stopped; returns at once when disabled
    pub async fn start(&self) -> anyhow::Result<()> {
        match &self.health_server {
            Some(server) => server.start().await,
            None => Ok(()),
        }
    }

    /// Stop the metrics service
    pub async fn stop(&self) -> anyhow::Result<()> {
        match &self.health_server {
            Some(server) => server.stop().await,
            None => Ok(()),
        }
    }
}
