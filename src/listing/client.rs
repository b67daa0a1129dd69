//! HTTP client for the public lobby listing API

use crate::error::{HeraldError, Result};
use crate::types::{Lobby, ListingEnvelope};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// Source of the current lobby list
#[async_trait]
pub trait LobbyListing: Send + Sync {
    /// Fetch every lobby currently listed, in listing order
    async fn fetch_lobbies(&self) -> Result<Vec<Lobby>>;
}

/// Polls a `{status, body}` JSON endpoint over HTTP
pub struct HttpLobbyListing {
    url: String,
    http: Client,
}

impl HttpLobbyListing {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("lobby-herald/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| HeraldError::ListingFailed {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            url: url.into(),
            http,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl LobbyListing for HttpLobbyListing {
    async fn fetch_lobbies(&self) -> Result<Vec<Lobby>> {
        let resp = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| HeraldError::ListingFailed {
                message: format!("Request to {} failed: {}", self.url, e),
            })?;

        if !resp.status().is_success() {
            return Err(HeraldError::ListingFailed {
                message: format!("{} returned {}", self.url, resp.status()),
            }
            .into());
        }

        let envelope: ListingEnvelope =
            resp.json().await.map_err(|e| HeraldError::InvalidListing {
                reason: format!("Failed to decode listing: {}", e),
            })?;

        if envelope.status != crate::types::LISTING_STATUS_OK {
            debug!("Listing returned status '{}', treating as empty", envelope.status);
        }

        Ok(envelope.into_lobbies())
    }
}
