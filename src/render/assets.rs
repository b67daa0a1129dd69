//! Background and frame artwork
//!
//! Both images are optional. A missing or undecodable file leaves the slot
//! empty and the routines fall back to drawn substitutes.

use crate::render::canvas::Canvas;
use crate::render::colors;
use std::path::Path;
use tiny_skia::Pixmap;
use tracing::debug;

/// Tiled wood texture behind every image
pub const BACKGROUND_TEXTURE: &str = "test_texture-wood-alt.png";

/// Metal frame stretched over every image
pub const FRAME_ART: &str = "war3_metal_frame_4k.png";

/// Decoded artwork, loaded once and shared across renders
#[derive(Default)]
pub struct Assets {
    background: Option<Pixmap>,
    frame: Option<Pixmap>,
}

impl Assets {
    /// Load artwork from `dir`
    pub fn load(dir: &Path) -> Self {
        Self {
            background: load_png(&dir.join(BACKGROUND_TEXTURE)),
            frame: load_png(&dir.join(FRAME_ART)),
        }
    }

    /// No artwork; every image uses the fallbacks
    pub fn none() -> Self {
        Self::default()
    }

    pub fn background(&self) -> Option<&Pixmap> {
        self.background.as_ref()
    }

    pub fn frame(&self) -> Option<&Pixmap> {
        self.frame.as_ref()
    }

    /// Paint background and frame. `server` keys the fallback gradient.
    /// Returns whether the wood texture was used.
    pub fn paint_backdrop(&self, canvas: &mut Canvas, server: Option<&str>) -> bool {
        let textured = match &self.background {
            Some(texture) => {
                canvas.tile(texture);
                true
            }
            None => {
                let [start, middle, end] = colors::server_gradient(server.unwrap_or_default());
                canvas.diagonal_gradient(&[(0.0, start), (0.5, middle), (1.0, end)]);
                false
            }
        };

        match &self.frame {
            Some(frame) => canvas.stretch(frame),
            None => {
                let (w, h) = (canvas.width(), canvas.height());
                canvas.stroke_rect(2.0, 2.0, w - 4.0, h - 4.0, 4.0, colors::gold());
                canvas.stroke_rect(6.0, 6.0, w - 12.0, h - 12.0, 2.0, colors::shade(0.5));
            }
        }

        textured
    }
}

fn load_png(path: &Path) -> Option<Pixmap> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!("Artwork {} unavailable: {}", path.display(), e);
            return None;
        }
    };

    match Pixmap::decode_png(&bytes) {
        Ok(pixmap) => {
            debug!(
                "Loaded artwork {} ({}x{})",
                path.display(),
                pixmap.width(),
                pixmap.height()
            );
            Some(pixmap)
        }
        Err(e) => {
            debug!("Artwork {} could not be decoded: {}", path.display(), e);
            None
        }
    }
}
