//! Main entry point for the Lobby Herald service
//!
//! This is the production entry point that loads configuration, takes the
//! startup baseline and polls the lobby listing until a shutdown signal
//! arrives.

use anyhow::Result;
use clap::Parser;
use lobby_herald::config::{validate_config, AppConfig, ConfigOverrides};
use lobby_herald::service::AppState;
use std::path::PathBuf;
use tokio::signal;
use tracing::{error, info, warn};

/// Lobby Herald - announces newly hosted games to Discord
#[derive(Parser)]
#[command(
    name = "lobby-herald",
    version,
    about = "Announces newly hosted lobbies to a Discord channel",
    long_about = "Lobby Herald polls a public lobby listing, picks out freshly hosted games whose \
                 name carries a keyword, and posts each of them once to a Discord channel with a \
                 rendered game card."
)]
struct Args {
    /// Configuration file path
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "Path to configuration file (TOML format)"
    )]
    config: Option<PathBuf>,

    /// Log level override
    #[arg(
        short,
        long,
        value_name = "LEVEL",
        help = "Override log level (trace, debug, info, warn, error)"
    )]
    log_level: Option<String>,

    /// Target channel override
    #[arg(long, value_name = "ID", help = "Override the Discord channel id")]
    channel_id: Option<String>,

    /// Poll interval override
    #[arg(long, value_name = "SECONDS", help = "Override the poll interval")]
    poll_interval: Option<u64>,

    /// Keyword override
    #[arg(long, value_name = "WORD", help = "Override the lobby name keyword")]
    keyword: Option<String>,

    /// Disable the health server
    #[arg(long, help = "Do not serve health and metrics endpoints")]
    no_health_server: bool,

    /// Enable debug mode
    #[arg(short, long, help = "Enable debug mode with verbose logging")]
    debug: bool,

    /// Dry run mode (validate config and exit)
    #[arg(
        long,
        help = "Validate configuration and exit without starting service"
    )]
    dry_run: bool,
}

/// Initialize structured logging with the configured level
fn init_logging(log_level: &str) -> Result<()> {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| log_level.into()),
        )
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}

/// Route panics through tracing so they land next to the other logs
fn install_panic_hook() {
    std::panic::set_hook(Box::new(|panic_info| {
        error!("Panic: {}", panic_info);
    }));
}

/// Wait for shutdown signals (SIGINT, SIGTERM)
async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C) signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}

/// Display startup banner with service information
fn display_startup_banner(config: &AppConfig) {
    info!("🚀 Lobby Herald");
    info!("   Service: {}", config.service.name);
    info!("   Log level: {}", config.service.log_level);
    if config.service.enable_health_server {
        info!("   Health port: {}", config.service.health_port);
    }
    info!("   Listing: {}", config.listing.api_url);
    info!("   Channel: {}", config.discord.channel_id);
    info!("   Keyword: {}", config.tracker.keyword);
    info!(
        "   Poll interval: {}s",
        config.tracker.poll_interval_seconds
    );
    info!(
        "   Freshness threshold: {}s",
        config.tracker.freshness_threshold_seconds
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Load configuration from file or environment, apply CLI overrides, then validate
fn load_config(args: &Args) -> Result<AppConfig> {
    let mut config = if let Some(config_path) = &args.config {
        AppConfig::from_file(config_path)?
    } else {
        AppConfig::from_env()?
    };

    let log_level = if args.debug {
        Some("debug".to_string())
    } else {
        args.log_level.clone()
    };

    config.apply_overrides(&ConfigOverrides {
        log_level,
        channel_id: args.channel_id.clone(),
        poll_interval_seconds: args.poll_interval,
        keyword: args.keyword.clone(),
        disable_health_server: args.no_health_server,
    });

    validate_config(&config)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = load_config(&args).unwrap_or_else(|e| {
        eprintln!("Configuration error: {:#}", e);
        std::process::exit(1);
    });

    if let Err(e) = init_logging(&config.service.log_level) {
        eprintln!("Failed to initialize logging: {}", e);
        std::process::exit(1);
    }
    install_panic_hook();

    if args.dry_run {
        info!("Configuration validation successful");
        display_startup_banner(&config);
        info!("Dry run completed - exiting without starting service");
        return Ok(());
    }

    display_startup_banner(&config);

    info!("Initializing service components...");
    let mut app_state = match AppState::new(config.clone()).await {
        Ok(state) => state,
        Err(e) => {
            error!("Failed to initialize application: {}", e);
            std::process::exit(1);
        }
    };

    info!("Starting service...");
    if let Err(e) = app_state.start().await {
        error!("Failed to start service: {}", e);
        std::process::exit(1);
    }

    info!("✅ Lobby Herald is running");
    info!("Press Ctrl+C to shutdown gracefully...");

    wait_for_shutdown_signal().await;

    info!("🛑 Shutdown signal received, beginning graceful shutdown...");

    // The poll loop gets the configured timeout, leave room for the rest
    let shutdown_timeout = config.shutdown_timeout() * 2;
    match tokio::time::timeout(shutdown_timeout, app_state.shutdown()).await {
        Ok(Ok(())) => {
            info!("✅ Graceful shutdown completed successfully");
        }
        Ok(Err(e)) => {
            error!("Shutdown finished with errors: {}", e);
        }
        Err(_) => {
            warn!("⚠️  Shutdown timeout exceeded, forcing exit");
        }
    }

    info!("🛑 Lobby Herald stopped");
    Ok(())
}
