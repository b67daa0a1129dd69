//! Image rendering
//!
//! Three routines turn snapshots into PNG bytes: the single-lobby card posted
//! with every announcement, the full lobby listing board and the recent
//! matches board. Each composites the shared wood texture and metal frame
//! (or their drawn fallbacks) with text and boxes. Times are supplied by the
//! caller.

pub mod assets;
pub mod canvas;
pub mod colors;
pub mod game_card;
pub mod game_list;
pub mod matches;

pub use assets::Assets;
pub use canvas::{Canvas, TextAlign, TextEngine, TextStyle};

use crate::error::{HeraldError, Result};
use crate::types::{Lobby, MatchRecord};
use chrono::{DateTime, Utc};
use std::path::Path;
use std::sync::Mutex;

/// Produces the image attached to a lobby announcement
pub trait CardRenderer: Send + Sync {
    fn render_card(&self, lobby: &Lobby) -> Result<Vec<u8>>;
}

/// Renderer holding the artwork and font state shared by all routines
pub struct Renderer {
    assets: Assets,
    text: Mutex<TextEngine>,
}

impl Renderer {
    pub fn new(assets: Assets) -> Self {
        Self {
            assets,
            text: Mutex::new(TextEngine::new()),
        }
    }

    /// Load artwork from `dir` and the system fonts
    pub fn from_assets_dir(dir: &Path) -> Self {
        Self::new(Assets::load(dir))
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    /// 800x400 card for a single lobby
    pub fn game_card(&self, lobby: &Lobby, now: DateTime<Utc>) -> Result<Vec<u8>> {
        let mut text = self.lock_text()?;
        game_card::render(&mut text, &self.assets, lobby, now)
    }

    /// 1400x900 board listing up to 15 lobbies
    pub fn game_list(&self, lobbies: &[Lobby], now: DateTime<Utc>) -> Result<Vec<u8>> {
        let mut text = self.lock_text()?;
        game_list::render(&mut text, &self.assets, lobbies, now)
    }

    /// 800x900 board of up to 5 recent or ongoing matches
    pub fn matches(&self, records: &[MatchRecord], now: DateTime<Utc>) -> Result<Vec<u8>> {
        let mut text = self.lock_text()?;
        matches::render(&mut text, &self.assets, records, now)
    }

    fn lock_text(&self) -> Result<std::sync::MutexGuard<'_, TextEngine>> {
        self.text.lock().map_err(|_| {
            HeraldError::RenderFailed {
                reason: "Text engine lock poisoned".to_string(),
            }
            .into()
        })
    }
}

impl CardRenderer for Renderer {
    fn render_card(&self, lobby: &Lobby) -> Result<Vec<u8>> {
        self.game_card(lobby, Utc::now())
    }
}
