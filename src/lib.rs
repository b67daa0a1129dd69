//! Lobby Herald - announces newly hosted games to a Discord channel
//!
//! This crate polls a public lobby listing, admits fresh lobbies whose name
//! carries the configured keyword, and posts each one once with a rendered
//! game card. It also renders lobby overview and match result boards.

pub mod config;
pub mod error;
pub mod listing;
pub mod metrics;
pub mod notify;
pub mod render;
pub mod service;
pub mod tracker;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{HeraldError, Result};
pub use types::*;

// Re-export key components
pub use listing::{HttpLobbyListing, LobbyListing};
pub use notify::{DiscordSink, NotificationSink};
pub use render::{CardRenderer, Renderer};
pub use tracker::{AdmissionFilter, LobbyTracker, SeenSet};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
