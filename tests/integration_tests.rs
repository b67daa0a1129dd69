//! Integration tests for the lobby herald
//!
//! These tests drive the poll-filter-dedup loop end to end against fake
//! collaborators:
//! - Startup baseline and idempotent initialization
//! - Freshness and keyword admission
//! - Seen-set deduplication and trimming
//! - Error handling for fetch, channel and publish failures
//! - Service start and graceful shutdown

mod fixtures;

use fixtures::{
    lobby, test_tracker, CountingPacer, Event, RecordingSink, ScriptedListing, StubRenderer, CHANNEL,
};
use lobby_herald::config::AppConfig;
use lobby_herald::service::{AppState, Components, HealthCheck, HealthStatus};
use lobby_herald::tracker::TickOutcome;
use std::sync::Arc;
use tokio::time::Duration;

#[tokio::test]
async fn test_initialize_twice_is_idempotent() {
    let snapshot = vec![lobby("1", 10, "obs test"), lobby("2", 400, "obs arena")];
    let mut harness = test_tracker(vec![Some(snapshot.clone()), Some(snapshot)], 500);

    let first = harness.tracker.initialize().await;
    let second = harness.tracker.initialize().await;

    assert_eq!(first, 2);
    assert_eq!(first, second);
    assert_eq!(harness.sink.attempts(), 0);
}

#[tokio::test]
async fn test_baseline_then_only_known_or_rejected_lobbies() {
    let a = lobby("A", 10, "obs test");
    let b = lobby("B", 400, "obs arena");
    let c = lobby("C", 5, "noobs only");
    let mut harness = test_tracker(
        vec![Some(vec![a.clone(), b.clone()]), Some(vec![a, b, c])],
        500,
    );

    harness.tracker.initialize().await;
    assert!(harness.tracker.seen().contains("A"));
    assert!(harness.tracker.seen().contains("B"));
    assert_eq!(harness.sink.attempts(), 0);

    let report = harness.tracker.tick().await;
    assert_eq!(report.already_seen, 2);
    assert_eq!(report.keyword_mismatch, 1);
    assert_eq!(report.published, 0);
    assert_eq!(harness.sink.attempts(), 0);
}

#[tokio::test]
async fn test_new_matching_lobby_is_published_once_with_card() {
    let d = lobby("D", 50, "OBS Game");
    let mut harness = test_tracker(vec![Some(vec![]), Some(vec![d.clone()]), Some(vec![d])], 500);

    harness.tracker.initialize().await;
    let report = harness.tracker.tick().await;
    assert_eq!(report.published, 1);
    assert!(harness.tracker.seen().contains("D"));

    // Still listed on the next tick, not announced again
    let report = harness.tracker.tick().await;
    assert_eq!(report.already_seen, 1);
    assert_eq!(report.published, 0);

    let published = harness.sink.published();
    assert_eq!(published.len(), 1);
    let (channel, notification) = &published[0];
    assert_eq!(channel, CHANNEL);
    assert_eq!(
        notification.content,
        "**New Game Hosted!**\n<@&111> <@&222>"
    );
    let attachment = notification.attachment.as_ref().unwrap();
    assert_eq!(attachment.file_name, "game.png");
    assert_eq!(attachment.png, b"D".to_vec());
}

#[tokio::test]
async fn test_pause_follows_every_successful_publish() {
    let mut harness = test_tracker(
        vec![
            Some(vec![]),
            Some(vec![
                lobby("1", 5, "obs one"),
                lobby("2", 5, "2v2 obs"),
                lobby("3", 5, "not this one"),
            ]),
        ],
        500,
    );

    harness.tracker.initialize().await;
    let report = harness.tracker.tick().await;

    assert_eq!(report.published, 2);
    assert_eq!(
        harness.events.events(),
        vec![
            Event::Publish("1".to_string()),
            Event::Pause,
            Event::Publish("2".to_string()),
            Event::Pause,
        ]
    );
}

#[tokio::test]
async fn test_no_pause_after_a_failed_publish() {
    let mut harness = test_tracker(
        vec![
            Some(vec![]),
            Some(vec![
                lobby("1", 5, "obs one"),
                lobby("2", 5, "obs two"),
                lobby("3", 5, "obs three"),
            ]),
        ],
        500,
    );

    harness.tracker.initialize().await;
    harness.sink.fail_next(1);
    harness.tracker.tick().await;

    assert_eq!(
        harness.events.events(),
        vec![
            Event::PublishFailed("1".to_string()),
            Event::Publish("2".to_string()),
            Event::Pause,
            Event::Publish("3".to_string()),
            Event::Pause,
        ]
    );
}

#[tokio::test]
async fn test_stale_lobbies_are_never_published() {
    let lobbies = vec![
        lobby("1", 300, "obs"),
        lobby("2", 301, "OBS Game"),
        lobby("3", 86_400, "obs 1v1"),
    ];
    let mut harness = test_tracker(vec![Some(vec![]), Some(lobbies)], 500);

    harness.tracker.initialize().await;
    let report = harness.tracker.tick().await;

    assert_eq!(report.stale, 3);
    assert_eq!(harness.sink.attempts(), 0);
}

#[tokio::test]
async fn test_keyword_must_be_a_whole_word() {
    let lobbies = vec![
        lobby("1", 5, "noobs"),
        lobby("2", 5, "obsidian league"),
        lobby("3", 5, "OBS game 1v1"),
        lobby("4", 5, "[obs] ranked"),
    ];
    let mut harness = test_tracker(vec![Some(vec![]), Some(lobbies)], 500);

    harness.tracker.initialize().await;
    let report = harness.tracker.tick().await;

    assert_eq!(report.keyword_mismatch, 2);
    assert_eq!(report.published, 2);
    let cards: Vec<Vec<u8>> = harness
        .sink
        .published()
        .into_iter()
        .map(|(_, n)| n.attachment.unwrap().png)
        .collect();
    assert_eq!(cards, vec![b"3".to_vec(), b"4".to_vec()]);
}

#[tokio::test]
async fn test_rejected_lobby_is_not_reevaluated() {
    // Too old on the first sighting, then reported fresh again
    let mut harness = test_tracker(
        vec![
            Some(vec![]),
            Some(vec![lobby("R", 500, "obs rehost")]),
            Some(vec![lobby("R", 5, "obs rehost")]),
        ],
        500,
    );

    harness.tracker.initialize().await;
    assert_eq!(harness.tracker.tick().await.stale, 1);
    assert_eq!(harness.tracker.tick().await.already_seen, 1);
    assert_eq!(harness.sink.attempts(), 0);
}

#[tokio::test]
async fn test_seen_set_keeps_most_recent_ids() {
    let first: Vec<_> = (0..4).map(|i| lobby(&format!("old{}", i), 900, "x")).collect();
    let second: Vec<_> = (0..3).map(|i| lobby(&format!("new{}", i), 900, "x")).collect();
    let mut harness = test_tracker(vec![Some(first), Some(second)], 5);

    harness.tracker.initialize().await;
    let report = harness.tracker.tick().await;

    assert_eq!(report.trimmed, 2);
    assert_eq!(harness.tracker.seen().len(), 5);
    assert!(!harness.tracker.seen().contains("old0"));
    assert!(!harness.tracker.seen().contains("old1"));
    assert!(harness.tracker.seen().contains("old2"));
    assert!(harness.tracker.seen().contains("new2"));
}

#[tokio::test]
async fn test_missing_channel_skips_tick_and_retries_later() {
    let d = lobby("D", 50, "OBS Game");
    let mut harness = test_tracker(vec![Some(vec![]), Some(vec![d.clone()]), Some(vec![d])], 500);

    harness.tracker.initialize().await;
    harness.sink.set_channel_missing(true);
    let report = harness.tracker.tick().await;
    assert_eq!(report.outcome, TickOutcome::ChannelUnavailable);
    assert!(!harness.tracker.seen().contains("D"));

    harness.sink.set_channel_missing(false);
    let report = harness.tracker.tick().await;
    assert_eq!(report.outcome, TickOutcome::Completed);
    assert_eq!(report.published, 1);
}

#[tokio::test]
async fn test_failed_publish_is_not_retried() {
    let lobbies = vec![lobby("1", 5, "obs one"), lobby("2", 5, "obs two")];
    let mut harness = test_tracker(vec![Some(vec![]), Some(lobbies.clone()), Some(lobbies)], 500);

    harness.tracker.initialize().await;
    harness.sink.fail_next(1);

    let report = harness.tracker.tick().await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.published, 1);
    assert_eq!(harness.pacer.pauses(), 1);

    let report = harness.tracker.tick().await;
    assert_eq!(report.already_seen, 2);
    assert_eq!(harness.sink.attempts(), 2);

    let stats = harness.tracker.stats().unwrap();
    assert_eq!(stats.publish_failures, 1);
    assert_eq!(stats.notifications_published, 1);
}

#[tokio::test]
async fn test_fetch_failures_do_not_stop_the_loop() {
    let mut harness = test_tracker(
        vec![None, None, Some(vec![lobby("1", 5, "obs")])],
        500,
    );

    // Baseline fetch fails: start from an empty seen-set
    assert_eq!(harness.tracker.initialize().await, 0);

    let report = harness.tracker.tick().await;
    assert_eq!(report.fetched, 0);
    assert_eq!(harness.tracker.stats().unwrap().consecutive_fetch_failures, 2);

    let report = harness.tracker.tick().await;
    assert_eq!(report.published, 1);
    let stats = harness.tracker.stats().unwrap();
    assert_eq!(stats.fetch_failures, 2);
    assert_eq!(stats.consecutive_fetch_failures, 0);
    assert_eq!(harness.listing.calls(), 3);
}

fn service_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.discord.token = "test-token".to_string();
    config.discord.channel_id = CHANNEL.to_string();
    config.service.enable_health_server = false;
    config.service.shutdown_timeout_seconds = 2;
    config.tracker.poll_interval_seconds = 1;
    config
}

#[tokio::test]
async fn test_service_start_and_shutdown() {
    let listing = Arc::new(ScriptedListing::new(vec![Some(vec![lobby(
        "1", 5, "obs",
    )])]));
    let sink = Arc::new(RecordingSink::new());

    let mut app = AppState::with_components(
        service_config(),
        Components {
            listing: listing.clone(),
            sink: sink.clone(),
            renderer: Arc::new(StubRenderer),
            pacer: Arc::new(CountingPacer::default()),
        },
    )
    .unwrap();

    app.start().await.unwrap();
    assert!(app.is_running().await);

    let stats = app.tracker_stats().unwrap();
    assert!(stats.initialized);
    assert_eq!(stats.seen_size, 1);

    let health = HealthCheck::check(&app.view()).await.unwrap();
    assert_eq!(health.status, HealthStatus::Healthy);

    tokio::time::timeout(Duration::from_secs(5), app.shutdown())
        .await
        .expect("shutdown timed out")
        .unwrap();
    assert!(!app.is_running().await);
    assert_eq!(sink.attempts(), 0);

    // A second start is refused
    assert!(app.start().await.is_err());
}

#[test]
fn test_blank_keyword_is_a_configuration_error() {
    let mut config = service_config();
    config.tracker.keyword = "   ".to_string();

    let result = AppState::with_components(
        config,
        Components {
            listing: Arc::new(ScriptedListing::new(vec![])),
            sink: Arc::new(RecordingSink::new()),
            renderer: Arc::new(StubRenderer),
            pacer: Arc::new(CountingPacer::default()),
        },
    );
    assert!(result.is_err());
}
