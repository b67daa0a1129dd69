//! Raster canvas and text engine
//!
//! `Canvas` wraps a `tiny_skia::Pixmap` with the handful of primitives the
//! image routines need. Text is shaped and rasterized by `cosmic-text`
//! through a `TextEngine`, which owns the font database and glyph cache and is
//! reused across renders.

use crate::error::{HeraldError, Result};
use cosmic_text::{Attrs, Buffer, Family, FontSystem, Metrics, Shaping, Style, SwashCache, Weight};
use tiny_skia::{
    Color, FilterQuality, GradientStop, LinearGradient, Paint, PathBuilder, Pattern, Pixmap,
    PixmapPaint, Point, Rect, SpreadMode, Stroke, Transform,
};

/// Horizontal anchoring of a text run relative to its x coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Font and paint settings for a single text run
#[derive(Debug, Clone, Copy)]
pub struct TextStyle {
    pub size: f32,
    pub color: Color,
    pub bold: bool,
    pub italic: bool,
    pub align: TextAlign,
    /// Width of the black outline drawn behind the glyphs, 0 for none
    pub outline: f32,
}

impl TextStyle {
    pub fn new(size: f32, color: Color) -> Self {
        Self {
            size,
            color,
            bold: false,
            italic: false,
            align: TextAlign::Left,
            outline: 0.0,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = TextAlign::Center;
        self
    }

    pub fn right(mut self) -> Self {
        self.align = TextAlign::Right;
        self
    }

    pub fn outlined(mut self, width: f32) -> Self {
        self.outline = width;
        self
    }
}

/// Shapes and rasterizes text with the system fonts
pub struct TextEngine {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl TextEngine {
    /// Load the system font database
    pub fn new() -> Self {
        Self {
            font_system: FontSystem::new(),
            swash_cache: SwashCache::new(),
        }
    }

    fn layout(&mut self, text: &str, style: &TextStyle) -> Buffer {
        let metrics = Metrics::new(style.size, style.size * 1.2);
        let mut buffer = Buffer::new(&mut self.font_system, metrics);
        buffer.set_size(&mut self.font_system, None, None);

        let mut attrs = Attrs::new().family(Family::SansSerif);
        if style.bold {
            attrs = attrs.weight(Weight::BOLD);
        }
        if style.italic {
            attrs = attrs.style(Style::Italic);
        }

        buffer.set_text(&mut self.font_system, text, &attrs, Shaping::Advanced, None);
        buffer.shape_until_scroll(&mut self.font_system, false);
        buffer
    }

    /// Draw text with its baseline at `y`
    pub fn draw(&mut self, pixmap: &mut Pixmap, text: &str, x: f32, y: f32, style: &TextStyle) {
        if text.is_empty() {
            return;
        }

        let buffer = self.layout(text, style);
        let (width, baseline) = extent(&buffer, style.size);

        let left = match style.align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let top = y - baseline;

        if style.outline > 0.0 {
            // Stroked glyphs are approximated by the fill drawn at 8 offsets.
            let d = (style.outline / 2.0).max(1.0);
            for &(dx, dy) in &[
                (-d, -d),
                (0.0, -d),
                (d, -d),
                (-d, 0.0),
                (d, 0.0),
                (-d, d),
                (0.0, d),
                (d, d),
            ] {
                self.rasterize(pixmap, &buffer, left + dx, top + dy, Color::BLACK);
            }
        }

        self.rasterize(pixmap, &buffer, left, top, style.color);
    }

    fn rasterize(&mut self, pixmap: &mut Pixmap, buffer: &Buffer, left: f32, top: f32, color: Color) {
        let rgba = color.to_color_u8();
        let text_color = cosmic_text::Color::rgba(rgba.red(), rgba.green(), rgba.blue(), rgba.alpha());
        let (ox, oy) = (left.round() as i32, top.round() as i32);

        buffer.draw(
            &mut self.font_system,
            &mut self.swash_cache,
            text_color,
            |x, y, w, h, glyph_color| {
                if glyph_color.a() == 0 {
                    return;
                }
                let Some(rect) = Rect::from_xywh((ox + x) as f32, (oy + y) as f32, w as f32, h as f32)
                else {
                    return;
                };
                let mut paint = Paint::default();
                paint.set_color_rgba8(
                    glyph_color.r(),
                    glyph_color.g(),
                    glyph_color.b(),
                    glyph_color.a(),
                );
                pixmap.fill_rect(rect, &paint, Transform::identity(), None);
            },
        );
    }
}

/// Widest line and the first baseline, measured from the layout top
fn extent(buffer: &Buffer, fallback_baseline: f32) -> (f32, f32) {
    let mut width: f32 = 0.0;
    let mut baseline = fallback_baseline;
    for (i, run) in buffer.layout_runs().enumerate() {
        width = width.max(run.line_w);
        if i == 0 {
            baseline = run.line_y;
        }
    }
    (width, baseline)
}

impl Default for TextEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixed-size drawing surface
pub struct Canvas {
    pixmap: Pixmap,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Result<Self> {
        let pixmap = Pixmap::new(width, height).ok_or_else(|| HeraldError::RenderFailed {
            reason: format!("Invalid canvas size {}x{}", width, height),
        })?;
        Ok(Self { pixmap })
    }

    pub fn width(&self) -> f32 {
        self.pixmap.width() as f32
    }

    pub fn height(&self) -> f32 {
        self.pixmap.height() as f32
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Fill the whole canvas with a translucent or opaque colour
    pub fn fill(&mut self, color: Color) {
        self.fill_rect(0.0, 0.0, self.width(), self.height(), color);
    }

    pub fn fill_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if let Some(rect) = Rect::from_xywh(x, y, w, h) {
            let mut paint = Paint::default();
            paint.set_color(color);
            self.pixmap
                .fill_rect(rect, &paint, Transform::identity(), None);
        }
    }

    /// Outline a rectangle; the stroke is centered on its edges
    pub fn stroke_rect(&mut self, x: f32, y: f32, w: f32, h: f32, width: f32, color: Color) {
        let Some(rect) = Rect::from_xywh(x, y, w, h) else {
            return;
        };
        let path = PathBuilder::from_rect(rect);
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    pub fn line(&mut self, from: (f32, f32), to: (f32, f32), width: f32, color: Color) {
        let mut pb = PathBuilder::new();
        pb.move_to(from.0, from.1);
        pb.line_to(to.0, to.1);
        let Some(path) = pb.finish() else {
            return;
        };
        let mut paint = Paint::default();
        paint.set_color(color);
        paint.anti_alias = true;
        let stroke = Stroke {
            width,
            ..Stroke::default()
        };
        self.pixmap
            .stroke_path(&path, &paint, &stroke, Transform::identity(), None);
    }

    /// Cover the canvas with a repeating texture
    pub fn tile(&mut self, texture: &Pixmap) {
        let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width(), self.height()) else {
            return;
        };
        let paint = Paint {
            shader: Pattern::new(
                texture.as_ref(),
                SpreadMode::Repeat,
                FilterQuality::Nearest,
                1.0,
                Transform::identity(),
            ),
            ..Paint::default()
        };
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Cover the canvas with a gradient from the top-left to the bottom-right corner
    pub fn diagonal_gradient(&mut self, stops: &[(f32, Color)]) {
        let Some(rect) = Rect::from_xywh(0.0, 0.0, self.width(), self.height()) else {
            return;
        };
        let stops = stops
            .iter()
            .map(|&(pos, color)| GradientStop::new(pos, color))
            .collect();
        let Some(shader) = LinearGradient::new(
            Point::from_xy(0.0, 0.0),
            Point::from_xy(self.width(), self.height()),
            stops,
            SpreadMode::Pad,
            Transform::identity(),
        ) else {
            return;
        };
        let paint = Paint {
            shader,
            ..Paint::default()
        };
        self.pixmap
            .fill_rect(rect, &paint, Transform::identity(), None);
    }

    /// Draw an image stretched over the whole canvas
    pub fn stretch(&mut self, image: &Pixmap) {
        if image.width() == 0 || image.height() == 0 {
            return;
        }
        let sx = self.width() / image.width() as f32;
        let sy = self.height() / image.height() as f32;
        let paint = PixmapPaint {
            quality: FilterQuality::Bilinear,
            ..PixmapPaint::default()
        };
        self.pixmap.draw_pixmap(
            0,
            0,
            image.as_ref(),
            &paint,
            Transform::from_scale(sx, sy),
            None,
        );
    }

    /// Draw text with its baseline at `y`
    pub fn text(&mut self, engine: &mut TextEngine, text: &str, x: f32, y: f32, style: &TextStyle) {
        engine.draw(&mut self.pixmap, text, x, y, style);
    }

    pub fn encode_png(&self) -> Result<Vec<u8>> {
        self.pixmap.encode_png().map_err(|e| {
            HeraldError::RenderFailed {
                reason: format!("PNG encoding failed: {}", e),
            }
            .into()
        })
    }
}
