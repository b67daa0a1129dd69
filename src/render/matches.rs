//! Recent and ongoing matches board

use crate::error::Result;
use crate::render::assets::Assets;
use crate::render::canvas::{Canvas, TextEngine, TextStyle};
use crate::render::colors;
use crate::types::MatchRecord;
use crate::utils::time_ago;
use chrono::{DateTime, Local, Utc};

pub const WIDTH: u32 = 800;
pub const HEIGHT: u32 = 900;

/// Entries drawn at most
pub const MAX_ENTRIES: usize = 5;

const FIRST_ENTRY_Y: f32 = 180.0;
const ENTRY_HEIGHT: f32 = 170.0;

/// `<ongoing> ongoing • <completed> recent`, or a placeholder when empty
pub fn summary_line(records: &[MatchRecord]) -> String {
    if records.is_empty() {
        return "No matches yet".to_string();
    }
    let ongoing = records.iter().filter(|m| m.is_ongoing).count();
    format!("{} ongoing • {} recent", ongoing, records.len() - ongoing)
}

/// `before → after (+change)` for the winner of a completed match
pub fn winner_elo_line(record: &MatchRecord) -> String {
    format!(
        "{} → {} ({:+})",
        record.winner_elo_before, record.winner_elo_after, record.elo_change
    )
}

/// `before → after (-change)` for the loser of a completed match
pub fn loser_elo_line(record: &MatchRecord) -> String {
    format!(
        "{} → {} ({:+})",
        record.loser_elo_before,
        record.loser_elo_after,
        record.loser_elo_after - record.loser_elo_before
    )
}

pub fn render(
    text: &mut TextEngine,
    assets: &Assets,
    records: &[MatchRecord],
    now: DateTime<Utc>,
) -> Result<Vec<u8>> {
    let mut canvas = Canvas::new(WIDTH, HEIGHT)?;
    let (width, height) = (canvas.width(), canvas.height());

    assets.paint_backdrop(&mut canvas, None);

    canvas.text(
        text,
        "RECENT/ONGOING MATCHES",
        width / 2.0,
        80.0,
        &TextStyle::new(42.0, colors::gold()).bold().centered().outlined(3.0),
    );
    canvas.text(
        text,
        &summary_line(records),
        width / 2.0,
        130.0,
        &TextStyle::new(24.0, colors::white()).bold().centered().outlined(2.0),
    );

    if records.is_empty() {
        canvas.text(
            text,
            "No active matches...",
            width / 2.0,
            height / 2.0,
            &TextStyle::new(20.0, colors::light_grey()).italic().centered().outlined(2.0),
        );
    }

    for (i, record) in records.iter().take(MAX_ENTRIES).enumerate() {
        let y = FIRST_ENTRY_Y + i as f32 * ENTRY_HEIGHT;
        let ago = time_ago(record.played_at, now);

        canvas.text(
            text,
            &format!("Match #{}", i + 1),
            60.0,
            y,
            &TextStyle::new(20.0, colors::gold()).bold().outlined(2.0),
        );

        if record.is_ongoing {
            draw_ongoing(&mut canvas, text, record, &ago, y);
        } else {
            draw_completed(&mut canvas, text, record, &ago, y);
        }
    }

    canvas.text(
        text,
        &format!(
            "Updated: {}",
            now.with_timezone(&Local).format("%H:%M:%S")
        ),
        width / 2.0,
        height - 40.0,
        &TextStyle::new(16.0, colors::grey()).centered().outlined(1.5),
    );

    canvas.encode_png()
}

fn draw_ongoing(canvas: &mut Canvas, text: &mut TextEngine, record: &MatchRecord, ago: &str, y: f32) {
    canvas.text(
        text,
        &format!("IN PROGRESS - {}", ago),
        60.0,
        y + 25.0,
        &TextStyle::new(16.0, colors::orange()).bold().outlined(1.5),
    );

    let name = TextStyle::new(22.0, colors::blue_player()).bold().outlined(2.0);
    let elo = TextStyle::new(18.0, colors::blue_player_elo()).outlined(2.0);

    canvas.text(text, &record.winner_username, 60.0, y + 55.0, &name);
    canvas.text(
        text,
        &format!("{} ELO", record.winner_elo_before),
        80.0,
        y + 80.0,
        &elo,
    );

    canvas.text(
        text,
        "VS",
        400.0,
        y + 67.0,
        &TextStyle::new(20.0, colors::white()).bold().outlined(2.0),
    );

    canvas.text(
        text,
        &record.loser_username,
        480.0,
        y + 55.0,
        &TextStyle {
            color: colors::orange_player(),
            ..name
        },
    );
    canvas.text(
        text,
        &format!("{} ELO", record.loser_elo_before),
        500.0,
        y + 80.0,
        &TextStyle {
            color: colors::orange_player_elo(),
            ..elo
        },
    );

    if let Some(map) = record.map.as_ref().filter(|m| !m.name.is_empty()) {
        canvas.text(
            text,
            &format!("Map: {}", map.name),
            60.0,
            y + 110.0,
            &TextStyle::new(16.0, colors::grey()).italic().outlined(1.5),
        );
    }
}

fn draw_completed(canvas: &mut Canvas, text: &mut TextEngine, record: &MatchRecord, ago: &str, y: f32) {
    canvas.text(
        text,
        &format!("Completed - {}", ago),
        60.0,
        y + 25.0,
        &TextStyle::new(16.0, colors::grey()).outlined(1.5),
    );

    let name = TextStyle::new(22.0, colors::green()).bold().outlined(2.0);
    let elo = TextStyle::new(18.0, colors::winner_elo()).outlined(2.0);

    canvas.text(text, &record.winner_username, 60.0, y + 55.0, &name);
    canvas.text(text, &winner_elo_line(record), 80.0, y + 80.0, &elo);

    canvas.text(
        text,
        &record.loser_username,
        60.0,
        y + 105.0,
        &TextStyle {
            color: colors::loser(),
            ..name
        },
    );
    canvas.text(
        text,
        &loser_elo_line(record),
        80.0,
        y + 130.0,
        &TextStyle {
            color: colors::loser_elo(),
            ..elo
        },
    );
}
