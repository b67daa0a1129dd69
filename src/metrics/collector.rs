//! Metrics collection using Prometheus
//!
//! Tracker and service metrics for the lobby herald, registered on a
//! dedicated registry that the health server exposes on `/metrics`.

use crate::tracker::{TickOutcome, TickReport};
use anyhow::Result;
use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector for the herald
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    /// Service-level metrics
    service_metrics: ServiceMetrics,

    /// Poll loop metrics
    tracker_metrics: TrackerMetrics,

    /// Performance metrics
    performance_metrics: PerformanceMetrics,
}

/// Service-level metrics
#[derive(Clone)]
pub struct ServiceMetrics {
    /// Service uptime in seconds
    pub uptime_seconds: IntGauge,

    /// Health check status (0=unhealthy, 1=degraded, 2=healthy)
    pub health_status: IntGauge,

    /// Component health status
    pub component_health: IntGaugeVec,
}

/// Poll loop metrics
#[derive(Clone)]
pub struct TrackerMetrics {
    /// Ticks run, by outcome
    pub ticks_total: IntCounterVec,

    /// Listing fetches that failed
    pub fetch_failures_total: IntCounter,

    /// Lobbies returned by the listing
    pub lobbies_fetched_total: IntCounter,

    /// Lobbies admitted for announcement
    pub lobbies_admitted_total: IntCounter,

    /// Lobbies not announced, by reason
    pub lobbies_filtered_total: IntCounterVec,

    /// Publish attempts, by result
    pub publishes_total: IntCounterVec,

    /// Identifiers currently held in the seen-set
    pub seen_set_size: IntGauge,

    /// Identifiers evicted by trimming
    pub seen_set_evictions_total: IntCounter,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// Full tick duration including pacing
    pub tick_duration: Histogram,

    /// Card rendering time
    pub render_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let service_metrics = ServiceMetrics::new(&registry)?;
        let tracker_metrics = TrackerMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            service_metrics,
            tracker_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    /// Get service metrics
    pub fn service(&self) -> &ServiceMetrics {
        &self.service_metrics
    }

    /// Get tracker metrics
    pub fn tracker(&self) -> &TrackerMetrics {
        &self.tracker_metrics
    }

    /// Get performance metrics
    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record the counters of a finished tick
    pub fn record_tick(&self, report: &TickReport, duration: Duration) {
        let outcome = match report.outcome {
            TickOutcome::Completed => "completed",
            TickOutcome::ChannelUnavailable => "channel_unavailable",
        };

        let tracker = &self.tracker_metrics;
        tracker.ticks_total.with_label_values(&[outcome]).inc();
        tracker.lobbies_fetched_total.inc_by(report.fetched as u64);
        tracker.lobbies_admitted_total.inc_by(report.admitted as u64);
        tracker
            .lobbies_filtered_total
            .with_label_values(&["already_seen"])
            .inc_by(report.already_seen as u64);
        tracker
            .lobbies_filtered_total
            .with_label_values(&["stale"])
            .inc_by(report.stale as u64);
        tracker
            .lobbies_filtered_total
            .with_label_values(&["keyword_mismatch"])
            .inc_by(report.keyword_mismatch as u64);
        tracker
            .publishes_total
            .with_label_values(&["success"])
            .inc_by(report.published as u64);
        tracker
            .publishes_total
            .with_label_values(&["failed"])
            .inc_by(report.failed as u64);
        tracker.seen_set_evictions_total.inc_by(report.trimmed as u64);

        self.performance_metrics
            .tick_duration
            .observe(duration.as_secs_f64());
    }

    /// Record a failed listing fetch
    pub fn record_fetch_failure(&self) {
        self.tracker_metrics.fetch_failures_total.inc();
    }

    /// Record card rendering duration
    pub fn record_render(&self, duration: Duration) {
        self.performance_metrics
            .render_duration
            .observe(duration.as_secs_f64());
    }

    /// Update the seen-set size gauge
    pub fn set_seen_size(&self, size: usize) {
        self.tracker_metrics.seen_set_size.set(size as i64);
    }

    /// Update service uptime
    pub fn set_uptime(&self, uptime: Duration) {
        self.service_metrics
            .uptime_seconds
            .set(uptime.as_secs() as i64);
    }

    /// Update health status
    pub fn update_health_status(&self, status: u8) {
        self.service_metrics.health_status.set(status as i64);
    }

    /// Update component health
    pub fn update_component_health(&self, component: &str, healthy: bool) {
        let status = if healthy { 1 } else { 0 };
        self.service_metrics
            .component_health
            .with_label_values(&[component])
            .set(status);
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl ServiceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let uptime_seconds =
            IntGauge::new("lobby_herald_uptime_seconds", "Service uptime in seconds")?;
        registry.register(Box::new(uptime_seconds.clone()))?;

        let health_status = IntGauge::new(
            "lobby_herald_health_status",
            "Health status (0=unhealthy, 1=degraded, 2=healthy)",
        )?;
        registry.register(Box::new(health_status.clone()))?;

        let component_health = IntGaugeVec::new(
            Opts::new("lobby_herald_component_health", "Component health status"),
            &["component"],
        )?;
        registry.register(Box::new(component_health.clone()))?;

        Ok(Self {
            uptime_seconds,
            health_status,
            component_health,
        })
    }
}

impl TrackerMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let ticks_total = IntCounterVec::new(
            Opts::new("lobby_herald_ticks_total", "Poll ticks run"),
            &["outcome"],
        )?;
        registry.register(Box::new(ticks_total.clone()))?;

        let fetch_failures_total = IntCounter::new(
            "lobby_herald_fetch_failures_total",
            "Failed lobby listing fetches",
        )?;
        registry.register(Box::new(fetch_failures_total.clone()))?;

        let lobbies_fetched_total = IntCounter::new(
            "lobby_herald_lobbies_fetched_total",
            "Lobbies returned by the listing",
        )?;
        registry.register(Box::new(lobbies_fetched_total.clone()))?;

        let lobbies_admitted_total = IntCounter::new(
            "lobby_herald_lobbies_admitted_total",
            "Lobbies admitted for announcement",
        )?;
        registry.register(Box::new(lobbies_admitted_total.clone()))?;

        let lobbies_filtered_total = IntCounterVec::new(
            Opts::new(
                "lobby_herald_lobbies_filtered_total",
                "Lobbies skipped, by reason",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(lobbies_filtered_total.clone()))?;

        let publishes_total = IntCounterVec::new(
            Opts::new("lobby_herald_publishes_total", "Publish attempts"),
            &["result"],
        )?;
        registry.register(Box::new(publishes_total.clone()))?;

        let seen_set_size = IntGauge::new(
            "lobby_herald_seen_set_size",
            "Lobby identifiers held in the seen-set",
        )?;
        registry.register(Box::new(seen_set_size.clone()))?;

        let seen_set_evictions_total = IntCounter::new(
            "lobby_herald_seen_set_evictions_total",
            "Identifiers evicted from the seen-set",
        )?;
        registry.register(Box::new(seen_set_evictions_total.clone()))?;

        Ok(Self {
            ticks_total,
            fetch_failures_total,
            lobbies_fetched_total,
            lobbies_admitted_total,
            lobbies_filtered_total,
            publishes_total,
            seen_set_size,
            seen_set_evictions_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let tick_duration = Histogram::with_opts(
            HistogramOpts::new(
                "lobby_herald_tick_duration_seconds",
                "Poll tick duration",
            )
            .buckets(vec![0.01, 0.05, 0.1, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        )?;
        registry.register(Box::new(tick_duration.clone()))?;

        let render_duration = Histogram::with_opts(
            HistogramOpts::new(
                "lobby_herald_render_duration_seconds",
                "Game card rendering time",
            )
            .buckets(vec![0.005, 0.01, 0.05, 0.1, 0.25, 0.5, 1.0]),
        )?;
        registry.register(Box::new(render_duration.clone()))?;

        Ok(Self {
            tick_duration,
            render_duration,
        })
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new().expect("Failed to create default metrics collector")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_collector_creation() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        let _service = collector.service();
        let _tracker = collector.tracker();
        let _performance = collector.performance();
    }

    #[test]
    fn test_record_tick_updates_counters() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let report = TickReport {
            fetched: 5,
            already_seen: 2,
            stale: 1,
            keyword_mismatch: 1,
            admitted: 1,
            published: 1,
            failed: 0,
            trimmed: 0,
            outcome: TickOutcome::Completed,
        };

        collector.record_tick(&report, Duration::from_millis(20));

        let tracker = collector.tracker();
        assert_eq!(tracker.lobbies_fetched_total.get(), 5);
        assert_eq!(tracker.lobbies_admitted_total.get(), 1);
        assert_eq!(
            tracker
                .lobbies_filtered_total
                .with_label_values(&["already_seen"])
                .get(),
            2
        );
        assert_eq!(
            tracker.ticks_total.with_label_values(&["completed"]).get(),
            1
        );
        assert_eq!(collector.performance().tick_duration.get_sample_count(), 1);
    }

    #[test]
    fn test_fetch_failures_and_seen_size() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.record_fetch_failure();
        collector.record_fetch_failure();
        collector.set_seen_size(42);

        assert_eq!(collector.tracker().fetch_failures_total.get(), 2);
        assert_eq!(collector.tracker().seen_set_size.get(), 42);
    }

    #[test]
    fn test_health_status_updates() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");

        collector.update_health_status(2);
        collector.update_component_health("listing", true);
        collector.update_component_health("sink", false);

        assert_eq!(collector.service().health_status.get(), 2);
        assert_eq!(
            collector
                .service()
                .component_health
                .with_label_values(&["sink"])
                .get(),
            0
        );
    }

    #[test]
    fn test_metrics_timer() {
        let collector = MetricsCollector::new().expect("Failed to create metrics collector");
        let timer = collector.start_timer();

        std::thread::sleep(Duration::from_millis(10));
        assert!(timer.elapsed() >= Duration::from_millis(10));
        assert!(timer.stop() >= Duration::from_millis(10));
    }
}
