//! Health check endpoints and monitoring
//!
//! Health is derived from the running flag and the statistics the polling
//! task publishes: repeated listing failures or an unreachable target channel
//! degrade the service, a stopped service is unhealthy.

use crate::tracker::TrackerStats;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::debug;

/// Consecutive listing failures after which the service reports degraded
pub const FETCH_FAILURE_THRESHOLD: u32 = 3;

/// Health check status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl HealthStatus {
    /// Gauge value exported to Prometheus (0=unhealthy, 1=degraded, 2=healthy)
    pub fn as_gauge(&self) -> u8 {
        match self {
            HealthStatus::Healthy => 2,
            HealthStatus::Degraded => 1,
            HealthStatus::Unhealthy => 0,
        }
    }

    fn worst(self, other: HealthStatus) -> HealthStatus {
        if self.as_gauge() <= other.as_gauge() {
            self
        } else {
            other
        }
    }
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "✅ healthy"),
            HealthStatus::Degraded => write!(f, "⚠️  degraded"),
            HealthStatus::Unhealthy => write!(f, "❌ unhealthy"),
        }
    }
}

/// Read-only view of the running service used by health checks
#[derive(Clone)]
pub struct HealthView {
    service_name: String,
    is_running: Arc<RwLock<bool>>,
    tracker_stats: Arc<std::sync::RwLock<TrackerStats>>,
    started_at: Instant,
}

impl HealthView {
    pub fn new(
        service_name: impl Into<String>,
        is_running: Arc<RwLock<bool>>,
        tracker_stats: Arc<std::sync::RwLock<TrackerStats>>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            is_running,
            tracker_stats,
            started_at: Instant::now(),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Latest tracker statistics, `None` if the lock is poisoned
    pub fn tracker_stats(&self) -> Option<TrackerStats> {
        self.tracker_stats.read().ok().map(|stats| stats.clone())
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    /// Overall service status
    pub status: HealthStatus,
    /// Service name
    pub service: String,
    /// Crate version
    pub version: String,
    /// Current timestamp
    pub timestamp: chrono::DateTime<chrono::Utc>,
    /// Detailed component checks
    pub checks: Vec<ComponentCheck>,
    /// Service statistics
    pub stats: ServiceStats,
}

/// Individual component health check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentCheck {
    /// Component name
    pub name: String,
    /// Component status
    pub status: HealthStatus,
    /// Optional explanation when not healthy
    pub message: Option<String>,
}

/// Service statistics for health reporting
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceStats {
    pub uptime_seconds: u64,
    pub ticks: u64,
    pub seen_lobbies: usize,
    pub lobbies_fetched: u64,
    pub notifications_published: u64,
    pub publish_failures: u64,
    pub fetch_failures: u64,
    pub last_tick_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl HealthCheck {
    /// Perform a full health check of the service
    pub async fn check(view: &HealthView) -> Result<Self> {
        let running = Self::check_service_running(view).await;
        let stats = view.tracker_stats();

        let checks = vec![
            running,
            Self::check_listing(stats.as_ref()),
            Self::check_channel(stats.as_ref()),
        ];
        let status = checks
            .iter()
            .fold(HealthStatus::Healthy, |acc, check| acc.worst(check.status));

        let stats = match stats {
            Some(tracker) => ServiceStats {
                uptime_seconds: view.uptime_seconds(),
                ticks: tracker.ticks,
                seen_lobbies: tracker.seen_size,
                lobbies_fetched: tracker.lobbies_fetched,
                notifications_published: tracker.notifications_published,
                publish_failures: tracker.publish_failures,
                fetch_failures: tracker.fetch_failures,
                last_tick_at: tracker.last_tick_at,
            },
            None => {
                debug!("Tracker stats unavailable for health check");
                ServiceStats {
                    uptime_seconds: view.uptime_seconds(),
                    ..ServiceStats::default()
                }
            }
        };

        Ok(HealthCheck {
            status,
            service: view.service_name().to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now(),
            checks,
            stats,
        })
    }

    /// Simple liveness check - just verify service is running
    pub async fn liveness_check(view: &HealthView) -> Result<HealthStatus> {
        if view.is_running().await {
            Ok(HealthStatus::Healthy)
        } else {
            Ok(HealthStatus::Unhealthy)
        }
    }

    /// Readiness check - running, baseline taken, and the listing reachable
    pub async fn readiness_check(view: &HealthView) -> Result<HealthStatus> {
        if !view.is_running().await {
            return Ok(HealthStatus::Unhealthy);
        }

        let stats = view.tracker_stats();
        match &stats {
            Some(tracker) if !tracker.initialized => Ok(HealthStatus::Unhealthy),
            _ => Ok(Self::check_listing(stats.as_ref()).status),
        }
    }

    async fn check_service_running(view: &HealthView) -> ComponentCheck {
        let (status, message) = if view.is_running().await {
            (HealthStatus::Healthy, None)
        } else {
            (
                HealthStatus::Unhealthy,
                Some("Service is not running".to_string()),
            )
        };

        ComponentCheck {
            name: "service_running".to_string(),
            status,
            message,
        }
    }

    fn check_listing(stats: Option<&TrackerStats>) -> ComponentCheck {
        let (status, message) = match stats {
            None => (
                HealthStatus::Unhealthy,
                Some("Cannot access tracker statistics".to_string()),
            ),
            Some(tracker) if tracker.consecutive_fetch_failures >= FETCH_FAILURE_THRESHOLD => (
                HealthStatus::Degraded,
                Some(format!(
                    "{} consecutive listing fetches failed",
                    tracker.consecutive_fetch_failures
                )),
            ),
            Some(_) => (HealthStatus::Healthy, None),
        };

        ComponentCheck {
            name: "lobby_listing".to_string(),
            status,
            message,
        }
    }

    fn check_channel(stats: Option<&TrackerStats>) -> ComponentCheck {
        let (status, message) = match stats.and_then(|tracker| tracker.channel_available) {
            Some(false) => (
                HealthStatus::Degraded,
                Some("Target channel could not be resolved on the last tick".to_string()),
            ),
            _ => (HealthStatus::Healthy, None),
        };

        ComponentCheck {
            name: "notification_channel".to_string(),
            status,
            message,
        }
    }
}

/// Convert health check to JSON string
impl HealthCheck {
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| anyhow::anyhow!("Failed to serialize health check: {}", e))
    }
}
