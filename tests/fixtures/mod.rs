//! Test fixtures and fake collaborators for integration testing

#![allow(dead_code)]

use async_trait::async_trait;
use lobby_herald::error::{HeraldError, Result};
use lobby_herald::listing::LobbyListing;
use lobby_herald::notify::{MessageTemplate, NotificationSink};
use lobby_herald::render::CardRenderer;
use lobby_herald::tracker::{AdmissionFilter, LobbyTracker, PublishPacer, TrackerOptions};
use lobby_herald::types::{ChannelId, ChannelInfo, Lobby, Notification};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const CHANNEL: &str = "123456789";

/// Build a lobby with the fields the filter looks at
pub fn lobby(id: &str, uptime_seconds: i64, name: &str) -> Lobby {
    Lobby {
        id: id.to_string(),
        name: name.to_string(),
        map: "Legion TD".to_string(),
        uptime_seconds,
        server: "eu".to_string(),
        host: "Grubby".to_string(),
        slots_taken: 4,
        slots_total: 12,
        is_official: false,
    }
}

/// Listing replaying scripted snapshots; `None` is a failed fetch. The last
/// snapshot repeats once the script runs out.
pub struct ScriptedListing {
    responses: Mutex<VecDeque<Option<Vec<Lobby>>>>,
    last: Mutex<Option<Vec<Lobby>>>,
    calls: AtomicUsize,
}

impl ScriptedListing {
    pub fn new(responses: Vec<Option<Vec<Lobby>>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            last: Mutex::new(Some(Vec::new())),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LobbyListing for ScriptedListing {
    async fn fetch_lobbies(&self) -> Result<Vec<Lobby>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let next = self.responses.lock().unwrap().pop_front();
        let response = match next {
            Some(response) => {
                *self.last.lock().unwrap() = response.clone();
                response
            }
            None => self.last.lock().unwrap().clone(),
        };

        response.ok_or_else(|| {
            HeraldError::ListingFailed {
                message: "scripted listing failure".to_string(),
            }
            .into()
        })
    }
}

/// Sink and pacer activity in call order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Successful publish of the card for this lobby id
    Publish(String),
    /// Rejected publish of the card for this lobby id
    PublishFailed(String),
    Pause,
}

/// Event log shared between a sink and a pacer
#[derive(Clone, Default)]
pub struct EventLog {
    events: Arc<Mutex<Vec<Event>>>,
}

impl EventLog {
    pub fn push(&self, event: Event) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }
}

/// Lobby id carried by a card from `StubRenderer`
fn card_id(notification: &Notification) -> String {
    notification
        .attachment
        .as_ref()
        .map(|attachment| String::from_utf8_lossy(&attachment.png).to_string())
        .unwrap_or_default()
}

/// Sink recording every published notification
#[derive(Default)]
pub struct RecordingSink {
    published: Mutex<Vec<(ChannelId, Notification)>>,
    channel_missing: AtomicBool,
    failures_left: AtomicUsize,
    attempts: AtomicUsize,
    log: EventLog,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    /// Make channel lookups report the channel as missing
    pub fn set_channel_missing(&self, missing: bool) {
        self.channel_missing.store(missing, Ordering::SeqCst);
    }

    /// Reject the next `count` publish attempts
    pub fn fail_next(&self, count: usize) {
        self.failures_left.store(count, Ordering::SeqCst);
    }

    pub fn published(&self) -> Vec<(ChannelId, Notification)> {
        self.published.lock().unwrap().clone()
    }

    pub fn published_count(&self) -> usize {
        self.published.lock().unwrap().len()
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn resolve_channel(&self, channel_id: &ChannelId) -> Result<Option<ChannelInfo>> {
        if self.channel_missing.load(Ordering::SeqCst) {
            return Ok(None);
        }
        Ok(Some(ChannelInfo {
            id: channel_id.clone(),
            name: Some("new-games".to_string()),
        }))
    }

    async fn publish(&self, channel_id: &ChannelId, notification: Notification) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);

        let failures_left = self.failures_left.load(Ordering::SeqCst);
        if failures_left > 0 {
            self.failures_left.store(failures_left - 1, Ordering::SeqCst);
            self.log.push(Event::PublishFailed(card_id(&notification)));
            return Err(HeraldError::SinkRejected {
                status: 500,
                body: "scripted rejection".to_string(),
            }
            .into());
        }

        self.log.push(Event::Publish(card_id(&notification)));
        self.published
            .lock()
            .unwrap()
            .push((channel_id.clone(), notification));
        Ok(())
    }
}

/// Renderer returning the lobby id as the "image" so tests can tell cards apart
pub struct StubRenderer;

impl CardRenderer for StubRenderer {
    fn render_card(&self, lobby: &Lobby) -> Result<Vec<u8>> {
        Ok(lobby.id.as_bytes().to_vec())
    }
}

/// Pacer counting pauses instead of sleeping
#[derive(Default)]
pub struct CountingPacer {
    pauses: AtomicUsize,
    log: EventLog,
}

impl CountingPacer {
    pub fn with_log(log: EventLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn pauses(&self) -> usize {
        self.pauses.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PublishPacer for CountingPacer {
    async fn pause(&self) {
        self.pauses.fetch_add(1, Ordering::SeqCst);
        self.log.push(Event::Pause);
    }
}

/// Tracker wired to fakes with the production filter and message defaults
pub struct TestTracker {
    pub tracker: LobbyTracker,
    pub listing: Arc<ScriptedListing>,
    pub sink: Arc<RecordingSink>,
    pub pacer: Arc<CountingPacer>,
    pub events: EventLog,
}

pub fn test_tracker(responses: Vec<Option<Vec<Lobby>>>, seen_capacity: usize) -> TestTracker {
    let listing = Arc::new(ScriptedListing::new(responses));
    let events = EventLog::default();
    let sink = Arc::new(RecordingSink::with_log(events.clone()));
    let pacer = Arc::new(CountingPacer::with_log(events.clone()));

    let tracker = LobbyTracker::new(
        listing.clone(),
        sink.clone(),
        Arc::new(StubRenderer),
        pacer.clone(),
        TrackerOptions {
            channel_id: CHANNEL.to_string(),
            filter: AdmissionFilter::new(300, "obs").unwrap(),
            template: MessageTemplate::new(
                "**New Game Hosted!**\n{mentions}",
                &["111".to_string(), "222".to_string()],
            ),
            seen_capacity,
        },
    );

    TestTracker {
        tracker,
        listing,
        sink,
        pacer,
        events,
    }
}
