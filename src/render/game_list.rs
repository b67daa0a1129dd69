//! Full lobby listing board

use crate::error::Result;
use crate::render::assets::Assets;
use crate::render::canvas::{Canvas, TextEngine, TextStyle};
use crate::render::colors;
use crate::types::Lobby;
use crate::utils::{format_uptime, truncate_with_ellipsis};
use chrono::{DateTime, Local, Utc};
use tiny_skia::Color;

pub const WIDTH: u32 = 1400;
pub const HEIGHT: u32 = 900;

/// Rows drawn at most; the footer still counts every lobby
pub const MAX_ROWS: usize = 15;

const HEADER_Y: f32 = 130.0;
const FIRST_ROW_Y: f32 = 180.0;
const ROW_HEIGHT: f32 = 45.0;

const COL_PLAYERS: f32 = 60.0;
const COL_NAME: f32 = 180.0;
const COL_MAP: f32 = 520.0;
const COL_REGION: f32 = 1050.0;
const COL_UPTIME: f32 = 1220.0;

/// Uptime colour, from green for brand-new lobbies to red for old ones
pub fn uptime_color(seconds: i64) -> Color {
    match seconds {
        s if s < 60 => colors::green(),
        s if s < 180 => colors::yellow(),
        s if s < 300 => colors::orange(),
        _ => colors::red(),
    }
}

pub fn footer_line(total: usize, now: DateTime<Utc>) -> String {
    format!(
        "{} games available • Updated: {}",
        total,
        now.with_timezone(&Local).format("%H:%M:%S")
    )
}

pub fn render(
    text: &mut TextEngine,
    assets: &Assets,
    lobbies: &[Lobby],
    now: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let mut canvas = Canvas::new(WIDTH, HEIGHT)?;
    let (width, height) = (canvas.width(), canvas.height());

    assets.paint_backdrop(&mut canvas, None);
    canvas.fill(colors::shade(0.4));

    canvas.text(
        text,
        "CUSTOM GAMES",
        width / 2.0,
        70.0,
        &TextStyle::new(48.0, colors::gold()).bold().centered().outlined(4.0),
    );

    let header = TextStyle::new(22.0, colors::gold()).bold().outlined(2.0);
    for (label, x) in [
        ("PLAYERS", COL_PLAYERS),
        ("GAME NAME", COL_NAME),
        ("MAP NAME", COL_MAP),
        ("REGION", COL_REGION),
        ("UPTIME", COL_UPTIME),
    ] {
        canvas.text(text, label, x, HEADER_Y, &header);
    }
    canvas.line(
        (40.0, HEADER_Y + 15.0),
        (width - 40.0, HEADER_Y + 15.0),
        2.0,
        colors::gold(),
    );

    let bold = TextStyle::new(20.0, colors::white()).bold();
    let plain = TextStyle::new(20.0, colors::white());

    for (i, lobby) in lobbies.iter().take(MAX_ROWS).enumerate() {
        let y = FIRST_ROW_Y + i as f32 * ROW_HEIGHT;

        if i % 2 == 0 {
            canvas.fill_rect(40.0, y - 25.0, width - 80.0, ROW_HEIGHT - 5.0, colors::shade(0.3));
        }

        canvas.text(
            text,
            &format!("{}/{}", lobby.slots_taken, lobby.slots_total),
            COL_PLAYERS,
            y,
            &bold,
        );
        canvas.text(
            text,
            &truncate_with_ellipsis(&lobby.name, 25, 22),
            COL_NAME,
            y,
            &plain,
        );
        canvas.text(
            text,
            &truncate_with_ellipsis(&lobby.map, 35, 32),
            COL_MAP,
            y,
            &TextStyle {
                color: colors::light_grey(),
                ..plain
            },
        );
        canvas.text(text, &lobby.server.to_uppercase(), COL_REGION, y, &bold);
        canvas.text(
            text,
            &format_uptime(lobby.uptime_seconds),
            COL_UPTIME,
            y,
            &TextStyle {
                color: uptime_color(lobby.uptime_seconds),
                ..plain
            },
        );
    }

    canvas.text(
        text,
        &footer_line(lobbies.len(), now),
        width / 2.0,
        height - 40.0,
        &TextStyle::new(18.0, colors::grey()).centered(),
    );

    canvas.encode_png()
}
