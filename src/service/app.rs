//! Main application state and service coordination
//!
//! `AppState` builds the tracker and its collaborators from configuration,
//! runs the polling task and the health server, and coordinates shutdown.

use crate::config::AppConfig;
use crate::listing::{HttpLobbyListing, LobbyListing};
use crate::metrics::{HealthServer, HealthServerConfig, MetricsCollector, MetricsService};
use crate::notify::{DiscordSink, MessageTemplate, NotificationSink};
use crate::render::{CardRenderer, Renderer};
use crate::service::health::{HealthCheck, HealthView};
use crate::tracker::{
    AdmissionFilter, FixedDelayPacer, LobbyTracker, NoDelayPacer, PublishPacer, TrackerOptions,
    TrackerStats,
};
use anyhow::Result;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{watch, RwLock};
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{debug, error, info, warn};

/// Service-level errors
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Service initialization error: {message}")]
    Initialization { message: String },

    #[error("Background task error: {message}")]
    BackgroundTask { message: String },
}

/// External collaborators of the tracker
pub struct Components {
    pub listing: Arc<dyn LobbyListing>,
    pub sink: Arc<dyn NotificationSink>,
    pub renderer: Arc<dyn CardRenderer>,
    pub pacer: Arc<dyn PublishPacer>,
}

impl Components {
    /// Production collaborators: HTTP listing, Discord sink, image renderer
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let listing = HttpLobbyListing::new(&config.listing.api_url, config.listing_timeout())
            .map_err(|e| ServiceError::Initialization {
                message: format!("Failed to create listing client: {}", e),
            })?;

        let sink = DiscordSink::new(
            &config.discord.api_base,
            &config.discord.token,
            config.discord_timeout(),
        )
        .map_err(|e| ServiceError::Initialization {
            message: format!("Failed to create Discord client: {}", e),
        })?;

        info!(
            "Loading artwork from {}",
            config.render.assets_dir.display()
        );
        let renderer = Renderer::from_assets_dir(&config.render.assets_dir);
        if renderer.assets().background().is_none() || renderer.assets().frame().is_none() {
            warn!("Some artwork is missing, cards will use drawn fallbacks");
        }

        Ok(Self {
            listing: Arc::new(listing),
            sink: Arc::new(sink),
            renderer: Arc::new(renderer),
            pacer: pacer_for(config.publish_delay()),
        })
    }
}

/// Fixed pacing, or none when the delay is zero
pub fn pacer_for(delay: Duration) -> Arc<dyn PublishPacer> {
    if delay.is_zero() {
        Arc::new(NoDelayPacer)
    } else {
        Arc::new(FixedDelayPacer::new(delay))
    }
}

/// Main application state containing all service components
pub struct AppState {
    /// Application configuration
    config: AppConfig,

    /// Poll loop, handed to its task on start
    tracker: Option<LobbyTracker>,

    /// Notification sink, kept for the startup channel check
    sink: Arc<dyn NotificationSink>,

    /// Statistics published by the poll loop
    tracker_stats: Arc<std::sync::RwLock<TrackerStats>>,

    /// Metrics service for monitoring and health checks
    metrics_service: Arc<MetricsService>,

    /// Stops the poll loop between ticks
    shutdown_tx: watch::Sender<bool>,

    /// Poll loop task
    poll_task: Option<JoinHandle<()>>,

    /// Background task handles
    background_tasks: Vec<JoinHandle<()>>,

    /// Service status
    is_running: Arc<RwLock<bool>>,

    view: HealthView,
}

impl AppState {
    /// Initialize the application with production collaborators
    pub async fn new(config: AppConfig) -> Result<Self, ServiceError> {
        let components = Components::from_config(&config)?;
        Self::with_components(config, components)
    }

    /// Initialize the application around the given collaborators
    pub fn with_components(config: AppConfig, components: Components) -> Result<Self, ServiceError> {
        info!("Initializing {}", config.service.name);

        let metrics_collector =
            Arc::new(
                MetricsCollector::new().map_err(|e| ServiceError::Initialization {
                    message: format!("Failed to create metrics collector: {}", e),
                })?,
            );

        let filter = AdmissionFilter::new(
            config.tracker.freshness_threshold_seconds,
            &config.tracker.keyword,
        )
        .map_err(|e| ServiceError::Configuration {
            message: format!("Invalid keyword filter: {}", e),
        })?;

        let template = MessageTemplate::new(
            config.discord.message_template.clone(),
            &config.discord.mention_roles,
        );

        let tracker = LobbyTracker::new(
            components.listing,
            components.sink.clone(),
            components.renderer,
            components.pacer,
            TrackerOptions {
                channel_id: config.discord.channel_id.clone(),
                filter,
                template,
                seen_capacity: config.tracker.seen_capacity,
            },
        )
        .with_metrics(metrics_collector.clone());

        let tracker_stats = tracker.stats_handle();
        let is_running = Arc::new(RwLock::new(false));
        let view = HealthView::new(
            config.service.name.clone(),
            is_running.clone(),
            tracker_stats.clone(),
        );

        let health_server = if config.service.enable_health_server {
            let health_config = HealthServerConfig {
                port: config.service.health_port,
                host: "0.0.0.0".to_string(),
            };
            Some(Arc::new(
                HealthServer::new(health_config, metrics_collector.clone())
                    .with_view(view.clone()),
            ))
        } else {
            None
        };

        let metrics_service = Arc::new(MetricsService::new(metrics_collector, health_server));
        let (shutdown_tx, _) = watch::channel(false);

        Ok(Self {
            config,
            tracker: Some(tracker),
            sink: components.sink,
            tracker_stats,
            metrics_service,
            shutdown_tx,
            poll_task: None,
            background_tasks: Vec::new(),
            is_running,
            view,
        })
    }

    /// Take the startup baseline and start polling and monitoring
    pub async fn start(&mut self) -> Result<(), ServiceError> {
        info!("Starting {}", self.config.service.name);

        let mut tracker = self
            .tracker
            .take()
            .ok_or_else(|| ServiceError::Initialization {
                message: "Service already started".to_string(),
            })?;

        *self.is_running.write().await = true;

        if self.config.service.enable_health_server {
            self.start_metrics_service().await;
        } else {
            info!("Health server disabled");
        }

        self.check_target_channel().await;

        let baseline = tracker.initialize().await;
        info!("Tracking {} existing lobbies", baseline);

        let interval = self.config.poll_interval();
        let shutdown_rx = self.shutdown_tx.subscribe();
        self.poll_task = Some(tokio::spawn(tracker.run(shutdown_rx, interval)));
        info!("Monitoring {} every {}s", self.config.listing.api_url, interval.as_secs());

        self.start_health_metrics_task();

        info!("✅ {} started successfully", self.config.service.name);
        Ok(())
    }

    /// Perform graceful shutdown
    pub async fn shutdown(&mut self) -> Result<(), ServiceError> {
        info!("Starting graceful shutdown of {}", self.config.service.name);

        *self.is_running.write().await = false;
        let _ = self.shutdown_tx.send(true);

        if let Some(task) = self.poll_task.take() {
            let timeout = self.config.shutdown_timeout();
            match tokio::time::timeout(timeout, task).await {
                Ok(Ok(())) => info!("✅ Polling loop stopped"),
                Ok(Err(e)) => warn!("Polling task ended abnormally: {}", e),
                Err(_) => warn!(
                    "Polling loop did not stop within {}s, abandoning it",
                    timeout.as_secs()
                ),
            }
        }

        if let Err(e) = self.metrics_service.stop().await {
            warn!("Failed to stop metrics service: {}", e);
        }

        self.stop_background_tasks().await;

        match self.tracker_stats.read() {
            Ok(stats) => info!(
                "Final statistics: {} ticks, {} lobbies fetched, {} published, {} failed",
                stats.ticks,
                stats.lobbies_fetched,
                stats.notifications_published,
                stats.publish_failures
            ),
            Err(_) => {
                return Err(ServiceError::BackgroundTask {
                    message: "Failed to read final tracker statistics".to_string(),
                })
            }
        }

        info!("✅ {} shutdown completed", self.config.service.name);
        Ok(())
    }

    /// Get service configuration
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Check if service is running
    pub async fn is_running(&self) -> bool {
        *self.is_running.read().await
    }

    /// Snapshot of the poll loop statistics
    pub fn tracker_stats(&self) -> Option<TrackerStats> {
        self.tracker_stats.read().ok().map(|stats| stats.clone())
    }

    /// Read-only view used by health checks
    pub fn view(&self) -> HealthView {
        self.view.clone()
    }

    /// Get metrics service
    pub fn metrics_service(&self) -> Arc<MetricsService> {
        self.metrics_service.clone()
    }

    /// Log whether the target channel is reachable. Not fatal: every tick
    /// checks again.
    async fn check_target_channel(&self) {
        let channel_id = &self.config.discord.channel_id;
        match self.sink.resolve_channel(channel_id).await {
            Ok(Some(channel)) => info!(
                "✅ Target channel found: {} ({})",
                channel.name.as_deref().unwrap_or("unnamed"),
                channel.id
            ),
            Ok(None) => error!(
                "❌ Target channel {} not found, double-check the channel id",
                channel_id
            ),
            Err(e) => error!("❌ Could not look up target channel {}: {:#}", channel_id, e),
        }
    }

    async fn start_metrics_service(&mut self) {
        let metrics_service = self.metrics_service.clone();
        let port = self.config.service.health_port;

        let handle = tokio::spawn(async move {
            if let Err(e) = metrics_service.start().await {
                error!("Metrics service failed: {:#}", e);
            } else {
                info!("Metrics service task completed");
            }
        });
        self.background_tasks.push(handle);

        // Give the server a moment to bind
        tokio::time::sleep(Duration::from_millis(100)).await;
        info!("✅ Health endpoints started on port {}", port);
    }

    fn start_health_metrics_task(&mut self) {
        let metrics_collector = self.metrics_service.collector();
        let is_running = self.is_running.clone();
        let view = self.view.clone();

        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(15));
            let start_time = tokio::time::Instant::now();
            debug!("Health metrics task started");

            while *is_running.read().await {
                interval.tick().await;

                metrics_collector.set_uptime(start_time.elapsed());
                match HealthCheck::check(&view).await {
                    Ok(health) => {
                        metrics_collector.update_health_status(health.status.as_gauge());
                        for check in &health.checks {
                            metrics_collector.update_component_health(
                                &check.name,
                                check.status.as_gauge() == 2,
                            );
                        }
                    }
                    Err(e) => warn!("Health check failed: {}", e),
                }
            }

            debug!("Health metrics task stopped");
        });
        self.background_tasks.push(handle);
    }

    /// Stop all background tasks
    async fn stop_background_tasks(&mut self) {
        let task_count = self.background_tasks.len();
        if task_count == 0 {
            return;
        }

        info!("Stopping {} background tasks...", task_count);

        for (i, task) in self.background_tasks.drain(..).enumerate() {
            debug!("Aborting background task {}/{}", i + 1, task_count);
            task.abort();
        }

        info!("✅ All {} background tasks stopped", task_count);
    }
}
