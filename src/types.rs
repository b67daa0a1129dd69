//! Common types used throughout the lobby herald

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

/// Opaque identifier of a hosted lobby, normalized to a string
pub type LobbyId = String;

/// Identifier of the chat channel notifications are sent to
pub type ChannelId = String;

/// Status value the listing API uses for a successful response
pub const LISTING_STATUS_OK: &str = "OK";

/// A hosted game lobby as reported by the listing API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lobby {
    #[serde(deserialize_with = "deserialize_lobby_id")]
    pub id: LobbyId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub map: String,
    #[serde(rename = "uptime")]
    pub uptime_seconds: i64,
    pub server: String,
    pub host: String,
    #[serde(rename = "slotsTaken")]
    pub slots_taken: u32,
    #[serde(rename = "slotsTotal")]
    pub slots_total: u32,
    #[serde(rename = "isOfficial", default)]
    pub is_official: bool,
}

impl Lobby {
    /// Fraction of slots taken, 0.0 when the lobby reports no slots
    pub fn fill_ratio(&self) -> f64 {
        if self.slots_total == 0 {
            return 0.0;
        }
        self.slots_taken as f64 / self.slots_total as f64
    }
}

impl std::fmt::Display for Lobby {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "'{}' (ID: {})", self.name, self.id)
    }
}

/// Accepts numeric or string identifiers
fn deserialize_lobby_id<'de, D>(deserializer: D) -> Result<LobbyId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(i64),
        Text(String),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response envelope returned by the listing API. Entries are kept raw so
/// one malformed lobby does not discard the rest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingEnvelope {
    pub status: String,
    #[serde(default)]
    pub body: Option<Vec<serde_json::Value>>,
}

impl ListingEnvelope {
    /// Lobbies carried by the envelope; anything but an OK status with a body
    /// is empty. Entries that do not decode are logged and skipped.
    pub fn into_lobbies(self) -> Vec<Lobby> {
        let entries = match (self.status.as_str(), self.body) {
            (LISTING_STATUS_OK, Some(entries)) => entries,
            _ => return Vec::new(),
        };

        entries
            .into_iter()
            .enumerate()
            .filter_map(|(index, entry)| match serde_json::from_value::<Lobby>(entry) {
                Ok(lobby) => Some(lobby),
                Err(e) => {
                    warn!("Skipping malformed listing entry {}: {}", index, e);
                    None
                }
            })
            .collect()
    }
}

/// Channel details returned by the notification sink
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelInfo {
    pub id: ChannelId,
    #[serde(default)]
    pub name: Option<String>,
}

/// Image attached to an outbound notification
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub png: Vec<u8>,
}

/// Outbound message with an optional image attachment
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub content: String,
    pub attachment: Option<ImageAttachment>,
}

impl Notification {
    /// Create a text-only notification
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            attachment: None,
        }
    }

    /// Attach a PNG image under the given file name
    pub fn with_png(mut self, file_name: impl Into<String>, png: Vec<u8>) -> Self {
        self.attachment = Some(ImageAttachment {
            file_name: file_name.into(),
            png,
        });
        self
    }
}

/// Map details attached to a match record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchMap {
    pub name: String,
}

/// A finished or ongoing ranked match shown on the matches board
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub winner_username: String,
    pub loser_username: String,
    pub winner_elo_before: i64,
    #[serde(default)]
    pub winner_elo_after: i64,
    pub loser_elo_before: i64,
    #[serde(default)]
    pub loser_elo_after: i64,
    #[serde(default)]
    pub elo_change: i64,
    pub played_at: DateTime<Utc>,
    #[serde(rename = "isOngoing", default)]
    pub is_ongoing: bool,
    #[serde(default)]
    pub map: Option<MatchMap>,
}
