//! The poll-filter-dedup loop
//!
//! `LobbyTracker` owns the seen-set and runs one tick per timer period:
//! fetch the listing, confirm the target channel, admit new lobbies through
//! the filter and announce each with a rendered card.

use crate::error::{HeraldError, Result};
use crate::listing::LobbyListing;
use crate::metrics::MetricsCollector;
use crate::notify::{MessageTemplate, NotificationSink};
use crate::render::CardRenderer;
use crate::tracker::filter::{Admission, AdmissionFilter};
use crate::tracker::pacing::PublishPacer;
use crate::tracker::seen::SeenSet;
use crate::types::{ChannelId, ChannelInfo, Lobby, Notification};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// File name of the card attached to every announcement
pub const CARD_FILE_NAME: &str = "game.png";

/// How a tick ended
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickOutcome {
    /// Every fetched lobby was evaluated
    #[default]
    Completed,
    /// The target channel could not be resolved; nothing was marked seen
    ChannelUnavailable,
}

/// Counters describing a single tick
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TickReport {
    pub fetched: usize,
    pub already_seen: usize,
    pub stale: usize,
    pub keyword_mismatch: usize,
    pub admitted: usize,
    pub published: usize,
    pub failed: usize,
    pub trimmed: usize,
    pub outcome: TickOutcome,
}

/// Running totals shared with the health server
#[derive(Debug, Clone, Default, Serialize)]
pub struct TrackerStats {
    /// Whether the startup baseline has been taken
    pub initialized: bool,
    pub ticks: u64,
    pub lobbies_fetched: u64,
    pub lobbies_admitted: u64,
    pub notifications_published: u64,
    pub publish_failures: u64,
    pub fetch_failures: u64,
    /// Fetch failures since the last successful fetch
    pub consecutive_fetch_failures: u32,
    /// Result of the last channel lookup, `None` before the first tick
    pub channel_available: Option<bool>,
    pub seen_size: usize,
    pub last_tick_at: Option<DateTime<Utc>>,
    pub last_report: Option<TickReport>,
}

/// Tracker parameters that are not collaborators
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    pub channel_id: ChannelId,
    pub filter: AdmissionFilter,
    pub template: MessageTemplate,
    pub seen_capacity: usize,
}

/// Poll-filter-dedup loop over a lobby listing
pub struct LobbyTracker {
    /// Source of lobby snapshots
    listing: Arc<dyn LobbyListing>,
    /// Destination for announcements
    sink: Arc<dyn NotificationSink>,
    /// Renders the card attached to each announcement
    renderer: Arc<dyn CardRenderer>,
    /// Wait between consecutive announcements
    pacer: Arc<dyn PublishPacer>,
    channel_id: ChannelId,
    filter: AdmissionFilter,
    template: MessageTemplate,
    /// Identifiers already processed
    seen: SeenSet,
    stats: Arc<RwLock<TrackerStats>>,
    metrics_collector: Option<Arc<MetricsCollector>>,
}

impl LobbyTracker {
    /// Create a tracker with an empty seen-set
    pub fn new(
        listing: Arc<dyn LobbyListing>,
        sink: Arc<dyn NotificationSink>,
        renderer: Arc<dyn CardRenderer>,
        pacer: Arc<dyn PublishPacer>,
        options: TrackerOptions,
    ) -> Self {
        Self {
            listing,
            sink,
            renderer,
            pacer,
            channel_id: options.channel_id,
            filter: options.filter,
            template: options.template,
            seen: SeenSet::new(options.seen_capacity),
            stats: Arc::new(RwLock::new(TrackerStats::default())),
            metrics_collector: None,
        }
    }

    /// Record tick and render metrics on the given collector
    pub fn with_metrics(mut self, metrics_collector: Arc<MetricsCollector>) -> Self {
        self.metrics_collector = Some(metrics_collector);
        self
    }

    /// Identifiers already processed
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    pub fn channel_id(&self) -> &ChannelId {
        &self.channel_id
    }

    /// Shared handle to the running statistics
    pub fn stats_handle(&self) -> Arc<RwLock<TrackerStats>> {
        self.stats.clone()
    }

    /// Snapshot of the running statistics
    pub fn stats(&self) -> Result<TrackerStats> {
        let stats = self.stats.read().map_err(|_| HeraldError::InternalError {
            message: "Failed to acquire tracker stats lock".to_string(),
        })?;

        Ok(stats.clone())
    }

    /// Take the startup baseline: mark every listed lobby as seen without
    /// announcing anything. Returns the resulting seen-set size.
    pub async fn initialize(&mut self) -> usize {
        let lobbies = self.fetch().await.unwrap_or_default();

        for lobby in &lobbies {
            self.seen.insert(&lobby.id);
        }
        let trimmed = self.seen.trim();
        if trimmed > 0 {
            debug!("Trimmed {} identifiers from the startup baseline", trimmed);
        }

        let seen_size = self.seen.len();
        self.update_stats(|stats| {
            stats.initialized = true;
            stats.seen_size = seen_size;
        });
        if let Some(metrics) = &self.metrics_collector {
            metrics.set_seen_size(seen_size);
        }

        info!("Initialized seen-set with {} lobbies", seen_size);
        seen_size
    }

    /// Run one poll-filter-dedup cycle. Failures are logged and counted,
    /// never returned.
    pub async fn tick(&mut self) -> TickReport {
        let started = Instant::now();
        let lobbies = self.fetch().await.unwrap_or_default();
        let mut report = TickReport {
            fetched: lobbies.len(),
            ..TickReport::default()
        };

        match self.ensure_channel().await {
            Ok(channel) => debug!(
                "Resolved channel {} ({})",
                channel.id,
                channel.name.as_deref().unwrap_or("unnamed")
            ),
            Err(e) => {
                error!("Skipping tick: {:#}", e);
                report.outcome = TickOutcome::ChannelUnavailable;
                self.finish_tick(&report, started.elapsed(), false);
                return report;
            }
        }

        for lobby in lobbies {
            if !self.seen.insert(&lobby.id) {
                report.already_seen += 1;
                continue;
            }

            match self.filter.evaluate(&lobby) {
                Admission::Admitted => {}
                Admission::Stale => {
                    report.stale += 1;
                    debug!("Skipping {}: up for {}s", lobby, lobby.uptime_seconds);
                    continue;
                }
                Admission::KeywordMismatch => {
                    report.keyword_mismatch += 1;
                    debug!("Skipping {}: keyword not present", lobby);
                    continue;
                }
            }

            report.admitted += 1;
            match self.announce(&lobby).await {
                Ok(()) => {
                    report.published += 1;
                    info!("Announced new game {}", lobby);
                    self.pacer.pause().await;
                }
                Err(e) => {
                    report.failed += 1;
                    warn!("Failed to announce {}: {:#}", lobby, e);
                }
            }
        }

        report.trimmed = self.seen.trim();
        if report.trimmed > 0 {
            debug!(
                "Trimmed {} identifiers, seen-set now holds {}",
                report.trimmed,
                self.seen.len()
            );
        }

        self.finish_tick(&report, started.elapsed(), true);
        report
    }

    /// Drive ticks on a fixed period until `shutdown` flips to true or its
    /// sender is dropped. Call `initialize` first.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>, period: Duration) {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; the baseline covers it.
        ticker.tick().await;

        info!("Polling every {:?}", period);

        loop {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    debug!(
                        "Tick finished: fetched={} admitted={} published={} failed={}",
                        report.fetched, report.admitted, report.published, report.failed
                    );
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Polling loop stopped");
    }

    async fn fetch(&self) -> Option<Vec<Lobby>> {
        match self.listing.fetch_lobbies().await {
            Ok(lobbies) => {
                self.update_stats(|stats| stats.consecutive_fetch_failures = 0);
                Some(lobbies)
            }
            Err(e) => {
                warn!("Failed to fetch lobby listing: {:#}", e);
                self.update_stats(|stats| {
                    stats.fetch_failures += 1;
                    stats.consecutive_fetch_failures += 1;
                });
                if let Some(metrics) = &self.metrics_collector {
                    metrics.record_fetch_failure();
                }
                None
            }
        }
    }

    /// Resolve the target channel; a missing channel is `ChannelNotFound`
    async fn ensure_channel(&self) -> Result<ChannelInfo> {
        match self.sink.resolve_channel(&self.channel_id).await? {
            Some(channel) => Ok(channel),
            None => Err(HeraldError::ChannelNotFound {
                channel_id: self.channel_id.clone(),
            }
            .into()),
        }
    }

    async fn announce(&self, lobby: &Lobby) -> Result<()> {
        let renderer = self.renderer.clone();
        let snapshot = lobby.clone();
        let started = Instant::now();

        let png = tokio::task::spawn_blocking(move || renderer.render_card(&snapshot))
            .await
            .map_err(|e| HeraldError::InternalError {
                message: format!("Render task failed: {}", e),
            })??;

        if let Some(metrics) = &self.metrics_collector {
            metrics.record_render(started.elapsed());
        }

        let notification =
            Notification::text(self.template.render(lobby)).with_png(CARD_FILE_NAME, png);
        self.sink.publish(&self.channel_id, notification).await
    }

    fn finish_tick(&self, report: &TickReport, duration: Duration, channel_available: bool) {
        let seen_size = self.seen.len();
        self.update_stats(|stats| {
            stats.ticks += 1;
            stats.lobbies_fetched += report.fetched as u64;
            stats.lobbies_admitted += report.admitted as u64;
            stats.notifications_published += report.published as u64;
            stats.publish_failures += report.failed as u64;
            stats.channel_available = Some(channel_available);
            stats.seen_size = seen_size;
            stats.last_tick_at = Some(Utc::now());
            stats.last_report = Some(report.clone());
        });

        if let Some(metrics) = &self.metrics_collector {
            metrics.record_tick(report, duration);
            metrics.set_seen_size(seen_size);
        }
    }

    fn update_stats(&self, update: impl FnOnce(&mut TrackerStats)) {
        match self.stats.write() {
            Ok(mut stats) => update(&mut stats),
            Err(_) => warn!("Tracker stats lock poisoned, dropping update"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::sink::MockNotificationSink;
    use crate::tracker::pacing::NoDelayPacer;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Listing that replays one scripted response per call; `None` is a failure
    struct ScriptedListing {
        responses: Mutex<VecDeque<Option<Vec<Lobby>>>>,
    }

    impl ScriptedListing {
        fn new(responses: Vec<Option<Vec<Lobby>>>) -> Self {
            Self {
                responses: Mutex::new(responses.into()),
            }
        }
    }

    #[async_trait]
    impl LobbyListing for ScriptedListing {
        async fn fetch_lobbies(&self) -> Result<Vec<Lobby>> {
            match self.responses.lock().unwrap().pop_front().flatten() {
                Some(lobbies) => Ok(lobbies),
                None => Err(HeraldError::ListingFailed {
                    message: "scripted failure".to_string(),
                }
                .into()),
            }
        }
    }

    struct StubRenderer;

    impl CardRenderer for StubRenderer {
        fn render_card(&self, _lobby: &Lobby) -> Result<Vec<u8>> {
            Ok(vec![0x89, b'P', b'N', b'G'])
        }
    }

    #[derive(Default)]
    struct CountingPacer {
        pauses: AtomicUsize,
    }

    #[async_trait]
    impl PublishPacer for CountingPacer {
        async fn pause(&self) {
            self.pauses.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn lobby(id: &str, uptime: i64, name: &str) -> Lobby {
        Lobby {
            id: id.to_string(),
            name: name.to_string(),
            map: "Legion TD".to_string(),
            uptime_seconds: uptime,
            server: "eu".to_string(),
            host: "host".to_string(),
            slots_taken: 2,
            slots_total: 8,
            is_official: false,
        }
    }

    fn options() -> TrackerOptions {
        TrackerOptions {
            channel_id: "chan".to_string(),
            filter: AdmissionFilter::new(300, "obs").unwrap(),
            template: MessageTemplate::default(),
            seen_capacity: 500,
        }
    }

    fn resolving_sink() -> MockNotificationSink {
        let mut sink = MockNotificationSink::new();
        sink.expect_resolve_channel().returning(|id| {
            Ok(Some(ChannelInfo {
                id: id.clone(),
                name: Some("games".to_string()),
            }))
        });
        sink
    }

    fn tracker(
        listing: ScriptedListing,
        sink: MockNotificationSink,
        pacer: Arc<CountingPacer>,
    ) -> LobbyTracker {
        LobbyTracker::new(
            Arc::new(listing),
            Arc::new(sink),
            Arc::new(StubRenderer),
            pacer,
            options(),
        )
    }

    #[tokio::test]
    async fn test_initialize_marks_everything_seen_without_publishing() {
        let listing = ScriptedListing::new(vec![Some(vec![
            lobby("a", 10, "obs test"),
            lobby("b", 400, "obs arena"),
        ])]);
        let mut sink = MockNotificationSink::new();
        sink.expect_publish().never();
        sink.expect_resolve_channel().never();

        let mut tracker = tracker(listing, sink, Arc::new(CountingPacer::default()));
        assert_eq!(tracker.initialize().await, 2);
        assert!(tracker.seen().contains("a"));
        assert!(tracker.seen().contains("b"));
        assert!(tracker.stats().unwrap().initialized);
    }

    #[tokio::test]
    async fn test_tick_announces_new_matching_lobby_and_paces() {
        let listing = ScriptedListing::new(vec![Some(vec![]), Some(vec![lobby("d", 50, "OBS Game")])]);
        let mut sink = resolving_sink();
        sink.expect_publish()
            .withf(|channel, notification| {
                channel == "chan"
                    && notification.content.starts_with("**New Game Hosted!**")
                    && notification
                        .attachment
                        .as_ref()
                        .map(|a| a.file_name == CARD_FILE_NAME)
                        .unwrap_or(false)
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let pacer = Arc::new(CountingPacer::default());
        let mut tracker = tracker(listing, sink, pacer.clone());
        tracker.initialize().await;

        let report = tracker.tick().await;
        assert_eq!(report.published, 1);
        assert_eq!(report.outcome, TickOutcome::Completed);
        assert!(tracker.seen().contains("d"));
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_tick_counts_filter_reasons() {
        let listing = ScriptedListing::new(vec![Some(vec![
            lobby("a", 10, "obs test"),
            lobby("b", 400, "obs arena"),
            lobby("c", 5, "noobs only"),
            lobby("a", 10, "obs test"),
        ])]);
        let mut sink = resolving_sink();
        sink.expect_publish().times(1).returning(|_, _| Ok(()));

        let mut tracker = tracker(listing, sink, Arc::new(CountingPacer::default()));
        let report = tracker.tick().await;

        assert_eq!(report.fetched, 4);
        assert_eq!(report.admitted, 1);
        assert_eq!(report.stale, 1);
        assert_eq!(report.keyword_mismatch, 1);
        assert_eq!(report.already_seen, 1);
    }

    #[tokio::test]
    async fn test_missing_channel_aborts_without_marking_seen() {
        let listing = ScriptedListing::new(vec![Some(vec![lobby("d", 50, "OBS Game")])]);
        let mut sink = MockNotificationSink::new();
        sink.expect_resolve_channel().returning(|_| Ok(None));
        sink.expect_publish().never();

        let mut tracker = tracker(listing, sink, Arc::new(CountingPacer::default()));
        let report = tracker.tick().await;

        assert_eq!(report.outcome, TickOutcome::ChannelUnavailable);
        assert!(tracker.seen().is_empty());
        assert_eq!(tracker.stats().unwrap().channel_available, Some(false));

        let err = tracker.ensure_channel().await.unwrap_err();
        match err.downcast_ref::<HeraldError>() {
            Some(HeraldError::ChannelNotFound { channel_id }) => assert_eq!(channel_id, "chan"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_channel_lookup_error_also_skips_tick() {
        let listing = ScriptedListing::new(vec![Some(vec![lobby("d", 50, "OBS Game")])]);
        let mut sink = MockNotificationSink::new();
        sink.expect_resolve_channel().returning(|_| {
            Err(HeraldError::SinkRejected {
                status: 403,
                body: "Missing Access".to_string(),
            }
            .into())
        });
        sink.expect_publish().never();

        let mut tracker = tracker(listing, sink, Arc::new(CountingPacer::default()));
        let report = tracker.tick().await;

        assert_eq!(report.outcome, TickOutcome::ChannelUnavailable);
        assert!(tracker.seen().is_empty());
    }

    #[tokio::test]
    async fn test_publish_failure_continues_without_pacing() {
        let listing = ScriptedListing::new(vec![Some(vec![
            lobby("x", 5, "obs one"),
            lobby("y", 5, "obs two"),
        ])]);
        let mut sink = resolving_sink();
        let mut calls = 0;
        sink.expect_publish().times(2).returning(move |_, _| {
            calls += 1;
            if calls == 1 {
                Err(HeraldError::SinkRejected {
                    status: 500,
                    body: "boom".to_string(),
                }
                .into())
            } else {
                Ok(())
            }
        });

        let pacer = Arc::new(CountingPacer::default());
        let mut tracker = tracker(listing, sink, pacer.clone());
        let report = tracker.tick().await;

        assert_eq!(report.failed, 1);
        assert_eq!(report.published, 1);
        assert_eq!(pacer.pauses.load(Ordering::SeqCst), 1);
        assert!(tracker.seen().contains("x"));
    }

    #[tokio::test]
    async fn test_fetch_failure_is_an_empty_tick() {
        let listing = ScriptedListing::new(vec![None]);
        let mut sink = resolving_sink();
        sink.expect_publish().never();

        let mut tracker = tracker(listing, sink, Arc::new(CountingPacer::default()));
        let report = tracker.tick().await;

        assert_eq!(report.fetched, 0);
        assert_eq!(report.outcome, TickOutcome::Completed);
        let stats = tracker.stats().unwrap();
        assert_eq!(stats.fetch_failures, 1);
        assert_eq!(stats.consecutive_fetch_failures, 1);
    }

    #[tokio::test]
    async fn test_tick_trims_to_capacity() {
        let lobbies = (0..5).map(|i| lobby(&i.to_string(), 900, "old")).collect();
        let listing = ScriptedListing::new(vec![Some(lobbies)]);
        let mut sink = resolving_sink();
        sink.expect_publish().never();

        let mut tracker = LobbyTracker::new(
            Arc::new(listing),
            Arc::new(sink),
            Arc::new(StubRenderer),
            Arc::new(NoDelayPacer),
            TrackerOptions {
                seen_capacity: 3,
                ..options()
            },
        );
        let report = tracker.tick().await;

        assert_eq!(report.trimmed, 2);
        assert_eq!(tracker.seen().len(), 3);
        assert!(!tracker.seen().contains("0"));
        assert!(tracker.seen().contains("4"));
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let listing = ScriptedListing::new(vec![]);
        let sink = MockNotificationSink::new();
        let tracker = tracker(listing, sink, Arc::new(CountingPacer::default()));

        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(tracker.run(rx, Duration::from_secs(3600)));
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("run did not stop")
            .unwrap();
    }
}
