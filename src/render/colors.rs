//! Palette shared by the image routines

use tiny_skia::Color;

pub fn gold() -> Color {
    Color::from_rgba8(255, 215, 0, 255)
}

pub fn gold_highlight() -> Color {
    Color::from_rgba8(255, 215, 0, 77)
}

pub fn white() -> Color {
    Color::from_rgba8(255, 255, 255, 255)
}

pub fn light_grey() -> Color {
    Color::from_rgba8(204, 204, 204, 255)
}

pub fn grey() -> Color {
    Color::from_rgba8(170, 170, 170, 255)
}

pub fn dim_grey() -> Color {
    Color::from_rgba8(136, 136, 136, 255)
}

pub fn green() -> Color {
    Color::from_rgba8(0, 255, 0, 255)
}

pub fn yellow() -> Color {
    Color::from_rgba8(255, 255, 0, 255)
}

pub fn orange() -> Color {
    Color::from_rgba8(255, 165, 0, 255)
}

pub fn red() -> Color {
    Color::from_rgba8(255, 68, 68, 255)
}

/// Black at the given opacity (0.0 - 1.0)
pub fn shade(alpha: f32) -> Color {
    Color::from_rgba8(0, 0, 0, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8)
}

// Match board player colours
pub fn blue_player() -> Color {
    Color::from_rgba8(85, 153, 255, 255)
}

pub fn blue_player_elo() -> Color {
    Color::from_rgba8(135, 206, 235, 255)
}

pub fn orange_player() -> Color {
    Color::from_rgba8(255, 153, 85, 255)
}

pub fn orange_player_elo() -> Color {
    Color::from_rgba8(255, 176, 136, 255)
}

pub fn winner_elo() -> Color {
    Color::from_rgba8(144, 238, 144, 255)
}

pub fn loser() -> Color {
    Color::from_rgba8(255, 102, 102, 255)
}

pub fn loser_elo() -> Color {
    Color::from_rgba8(255, 182, 182, 255)
}

/// Three-stop background gradient used when the wood texture is unavailable
pub fn server_gradient(server: &str) -> [Color; 3] {
    let hex: [u32; 3] = match server.to_lowercase().as_str() {
        "usw" => [0x2d1b1e, 0x4a1e2b, 0x6b1f3a],
        "use" => [0x2d1b1e, 0x4a2e1e, 0x6b3a1f],
        "kr" => [0x1e1a2d, 0x2e1e4a, 0x3a1f6b],
        "cn" => [0x2d2a1e, 0x4a441e, 0x6b5f1f],
        _ => [0x1a1a2e, 0x16213e, 0x0f3460],
    };
    hex.map(from_hex)
}

fn from_hex(rgb: u32) -> Color {
    Color::from_rgba8((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8, 255)
}
