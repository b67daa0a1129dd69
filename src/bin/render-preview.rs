//! Render Preview CLI Tool
//!
//! Renders the announcement card, the lobby board or the matches board to
//! PNG files so artwork and layout can be checked without posting anything.
//!
//! Usage:
//!   cargo run --bin render-preview -- card --output card.png
//!   cargo run --bin render-preview -- card --id 4242
//!   cargo run --bin render-preview -- list --output lobbies.png
//!   cargo run --bin render-preview -- matches --input matches.json

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use lobby_herald::listing::{HttpLobbyListing, LobbyListing};
use lobby_herald::render::Renderer;
use lobby_herald::types::{Lobby, MatchRecord};

#[derive(Parser)]
#[command(name = "render-preview")]
#[command(about = "Render lobby herald images to PNG files")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Directory holding the background texture and frame art
    #[arg(long, default_value = "images")]
    assets_dir: PathBuf,

    /// Lobby listing endpoint
    #[arg(long, default_value = "https://api.wc3stats.com/gamelist")]
    listing_url: String,

    /// Output file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the announcement card for a listed lobby
    Card {
        /// Lobby id, defaults to the first listed lobby
        #[arg(short, long)]
        id: Option<String>,
    },
    /// Render the board of currently listed lobbies
    List,
    /// Render the matches board from a JSON array of match records
    Matches {
        /// JSON file with match records
        #[arg(short, long)]
        input: PathBuf,
    },
}

async fn fetch_lobbies(url: &str) -> Result<Vec<Lobby>> {
    let listing = HttpLobbyListing::new(url, Duration::from_secs(30))?;
    let lobbies = listing.fetch_lobbies().await?;
    println!("📋 {} lobbies listed at {}", lobbies.len(), url);
    Ok(lobbies)
}

fn read_matches(path: &Path) -> Result<Vec<MatchRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn write_png(path: &Path, png: &[u8]) -> Result<()> {
    std::fs::write(path, png).with_context(|| format!("Failed to write {}", path.display()))?;
    println!("✅ Wrote {} ({} bytes)", path.display(), png.len());
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let renderer = Renderer::from_assets_dir(&cli.assets_dir);
    if renderer.assets().background().is_none() {
        println!("⚠️  No background texture in {}", cli.assets_dir.display());
    }
    if renderer.assets().frame().is_none() {
        println!("⚠️  No frame art in {}", cli.assets_dir.display());
    }

    let now = Utc::now();
    let (png, default_name) = match cli.command {
        Commands::Card { id } => {
            let lobbies = fetch_lobbies(&cli.listing_url).await?;
            let lobby = match id {
                Some(id) => lobbies
                    .iter()
                    .find(|lobby| lobby.id == id)
                    .ok_or_else(|| anyhow!("Lobby {} is not listed", id))?,
                None => lobbies
                    .first()
                    .ok_or_else(|| anyhow!("The listing is empty"))?,
            };
            println!("🎮 Rendering card for {}", lobby);
            (renderer.game_card(lobby, now)?, "game.png")
        }
        Commands::List => {
            let lobbies = fetch_lobbies(&cli.listing_url).await?;
            (renderer.game_list(&lobbies, now)?, "lobbies.png")
        }
        Commands::Matches { input } => {
            let records = read_matches(&input)?;
            println!("🏆 Rendering {} match records", records.len());
            (renderer.matches(&records, now)?, "matches.png")
        }
    };

    let output = cli.output.unwrap_or_else(|| PathBuf::from(default_name));
    write_png(&output, &png)
}
