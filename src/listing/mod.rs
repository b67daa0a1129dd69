//! Lobby listing sources
//!
//! The tracker only depends on the `LobbyListing` trait; the HTTP client
//! polls the public game list.

pub mod client;

pub use client::{HttpLobbyListing, LobbyListing};
