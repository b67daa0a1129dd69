//! Single-lobby announcement card

use crate::error::Result;
use crate::render::assets::Assets;
use crate::render::canvas::{Canvas, TextEngine, TextStyle};
use crate::render::colors;
use crate::types::Lobby;
use crate::utils::{format_uptime, truncate_with_ellipsis};
use chrono::{DateTime, Local, Utc};
use tiny_skia::Color;

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 400;

const BOX_Y: f32 = 180.0;
const BOX_WIDTH: f32 = 220.0;
const BOX_HEIGHT: f32 = 140.0;
const BOX_SPACING: f32 = 30.0;
const BOX_LEFT: f32 = 40.0;

/// Colour of the player count: red when at least 80% full, orange from 50%
pub fn player_color(lobby: &Lobby) -> Color {
    let ratio = lobby.fill_ratio();
    if ratio >= 0.8 {
        colors::red()
    } else if ratio >= 0.5 {
        colors::orange()
    } else {
        colors::green()
    }
}

/// Host name as shown on the card
pub fn display_host(host: &str) -> String {
    truncate_with_ellipsis(host, 18, 15)
}

pub fn render(
    text: &mut TextEngine,
    assets: &Assets,
    lobby: &Lobby,
    now: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let mut canvas = Canvas::new(WIDTH, HEIGHT)?;
    let (width, height) = (canvas.width(), canvas.height());

    let textured = assets.paint_backdrop(&mut canvas, Some(&lobby.server));
    canvas.fill(colors::shade(if textured { 0.25 } else { 0.4 }));

    canvas.text(
        text,
        &lobby.name,
        width / 2.0,
        80.0,
        &TextStyle::new(48.0, colors::gold()).bold().centered().outlined(4.0),
    );
    canvas.text(
        text,
        &format!("Map: {}", lobby.map),
        width / 2.0,
        130.0,
        &TextStyle::new(24.0, colors::white()).italic().centered().outlined(2.0),
    );

    let label = TextStyle::new(20.0, colors::gold()).bold();

    // Server and host
    let x = BOX_LEFT;
    info_box(&mut canvas, x);
    canvas.text(text, "SERVER", x + 20.0, BOX_Y + 35.0, &label);
    canvas.text(
        text,
        &lobby.server.to_uppercase(),
        x + 20.0,
        BOX_Y + 70.0,
        &TextStyle::new(28.0, colors::white()).bold(),
    );
    canvas.text(
        text,
        "Host:",
        x + 20.0,
        BOX_Y + 100.0,
        &TextStyle::new(16.0, colors::grey()),
    );
    canvas.text(
        text,
        &display_host(&lobby.host),
        x + 20.0,
        BOX_Y + 125.0,
        &TextStyle::new(18.0, colors::white()).bold(),
    );

    // Players
    let x = BOX_LEFT + BOX_WIDTH + BOX_SPACING;
    info_box(&mut canvas, x);
    canvas.text(text, "PLAYERS", x + 20.0, BOX_Y + 35.0, &label);
    canvas.text(
        text,
        &format!("{}/{}", lobby.slots_taken, lobby.slots_total),
        x + BOX_WIDTH / 2.0,
        BOX_Y + 95.0,
        &TextStyle::new(48.0, player_color(lobby)).bold().centered().outlined(3.0),
    );

    // Uptime and status
    let x = BOX_LEFT + 2.0 * (BOX_WIDTH + BOX_SPACING);
    info_box(&mut canvas, x);
    canvas.text(text, "UPTIME", x + 20.0, BOX_Y + 35.0, &label);
    canvas.text(
        text,
        &format_uptime(lobby.uptime_seconds),
        x + 20.0,
        BOX_Y + 75.0,
        &TextStyle::new(32.0, colors::white()).bold(),
    );
    let (status, status_color) = if lobby.is_official {
        ("OFFICIAL", colors::green())
    } else {
        ("CUSTOM", colors::grey())
    };
    canvas.text(
        text,
        status,
        x + 20.0,
        BOX_Y + 110.0,
        &TextStyle::new(18.0, status_color).bold(),
    );

    let footer = TextStyle::new(14.0, colors::dim_grey());
    canvas.text(
        text,
        &format!("Game ID: {}", lobby.id),
        width - 20.0,
        height - 20.0,
        &footer.right(),
    );
    canvas.text(
        text,
        &format!(
            "Posted at {}",
            now.with_timezone(&Local).format("%I:%M %p")
        ),
        20.0,
        height - 20.0,
        &footer,
    );

    canvas.encode_png()
}

fn info_box(canvas: &mut Canvas, x: f32) {
    canvas.fill_rect(x, BOX_Y, BOX_WIDTH, BOX_HEIGHT, colors::shade(0.6));
    canvas.stroke_rect(x, BOX_Y, BOX_WIDTH, BOX_HEIGHT, 2.0, colors::gold());
    canvas.stroke_rect(
        x + 2.0,
        BOX_Y + 2.0,
        BOX_WIDTH - 4.0,
        BOX_HEIGHT - 4.0,
        1.0,
        colors::gold_highlight(),
    );
}
