//! Main application configuration
//!
//! This module defines the primary configuration structures for the lobby
//! herald, including environment variable loading, TOML files and validation.

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub listing: ListingSettings,
    pub discord: DiscordSettings,
    pub tracker: TrackerSettings,
    pub render: RenderSettings,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Port for health check endpoint
    pub health_port: u16,
    /// Whether to serve health and metrics endpoints
    pub enable_health_server: bool,
    /// Graceful shutdown timeout in seconds
    pub shutdown_timeout_seconds: u64,
}

/// Lobby listing API settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSettings {
    /// URL returning the current lobby list
    pub api_url: String,
    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

/// Discord notification settings
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscordSettings {
    /// Bot token used to authenticate against the Discord API
    pub token: String,
    /// Channel receiving the announcements
    pub channel_id: String,
    /// Base URL of the Discord REST API
    pub api_base: String,
    /// Role ids mentioned in every announcement
    pub mention_roles: Vec<String>,
    /// Message template, see `MessageTemplate` for placeholders
    pub message_template: String,
    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

/// Poll-filter-dedup settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerSettings {
    /// Seconds between two polls of the listing API
    pub poll_interval_seconds: u64,
    /// Lobbies up for this long or longer are never announced
    pub freshness_threshold_seconds: i64,
    /// Word that must appear in a lobby name for it to be announced
    pub keyword: String,
    /// Maximum number of lobby ids remembered
    pub seen_capacity: usize,
    /// Pause after each announcement within a tick, in milliseconds
    pub publish_delay_ms: u64,
}

/// Image rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Directory holding the background texture and frame art
    pub assets_dir: PathBuf,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "lobby-herald".to_string(),
            log_level: "info".to_string(),
            health_port: 8080,
            enable_health_server: true,
            shutdown_timeout_seconds: 10,
        }
    }
}

impl Default for ListingSettings {
    fn default() -> Self {
        Self {
            api_url: "https://api.wc3stats.com/gamelist".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

impl Default for DiscordSettings {
    fn default() -> Self {
        Self {
            token: String::new(),
            channel_id: String::new(),
            api_base: "https://discord.com/api/v10".to_string(),
            mention_roles: Vec::new(),
            message_template: "**New Game Hosted!**\n{mentions}".to_string(),
            request_timeout_seconds: 30,
        }
    }
}

// Keeps the token out of logs and panic messages
impl std::fmt::Debug for DiscordSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordSettings")
            .field("token", &"<redacted>")
            .field("channel_id", &self.channel_id)
            .field("api_base", &self.api_base)
            .field("mention_roles", &self.mention_roles)
            .field("message_template", &self.message_template)
            .field("request_timeout_seconds", &self.request_timeout_seconds)
            .finish()
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30,
            freshness_threshold_seconds: 300, // 5 minutes
            keyword: "obs".to_string(),
            seen_capacity: 500,
            publish_delay_ms: 1000,
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            assets_dir: PathBuf::from("images"),
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| anyhow!("Invalid {} value: {}", name, value))
}

/// Values given on the command line, applied over file and environment settings
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub log_level: Option<String>,
    pub channel_id: Option<String>,
    pub poll_interval_seconds: Option<u64>,
    pub keyword: Option<String>,
    pub disable_health_server: bool,
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults.
    /// Not validated: apply overrides first, then call `validate_config`.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a TOML file; environment variables still override it.
    /// Not validated, same as `from_env`.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        config.apply_env()?;
        Ok(config)
    }

    /// Apply command line overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(log_level) = &overrides.log_level {
            self.service.log_level = log_level.clone();
        }
        if let Some(channel_id) = &overrides.channel_id {
            self.discord.channel_id = channel_id.clone();
        }
        if let Some(poll_interval) = overrides.poll_interval_seconds {
            self.tracker.poll_interval_seconds = poll_interval;
        }
        if let Some(keyword) = &overrides.keyword {
            self.tracker.keyword = keyword.clone();
        }
        if overrides.disable_health_server {
            self.service.enable_health_server = false;
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }
        if let Ok(port) = env::var("HEALTH_PORT") {
            self.service.health_port = parse_var("HEALTH_PORT", &port)?;
        }
        if let Ok(enabled) = env::var("ENABLE_HEALTH_SERVER") {
            self.service.enable_health_server = parse_var("ENABLE_HEALTH_SERVER", &enabled)?;
        }
        if let Ok(timeout) = env::var("SHUTDOWN_TIMEOUT_SECONDS") {
            self.service.shutdown_timeout_seconds =
                parse_var("SHUTDOWN_TIMEOUT_SECONDS", &timeout)?;
        }

        // Listing settings
        if let Ok(url) = env::var("LISTING_API_URL") {
            self.listing.api_url = url;
        }
        if let Ok(timeout) = env::var("LISTING_TIMEOUT_SECONDS") {
            self.listing.request_timeout_seconds = parse_var("LISTING_TIMEOUT_SECONDS", &timeout)?;
        }

        // Discord settings
        if let Ok(token) = env::var("DISCORD_TOKEN") {
            self.discord.token = token;
        }
        if let Ok(channel_id) = env::var("DISCORD_CHANNEL_ID") {
            self.discord.channel_id = channel_id;
        }
        if let Ok(api_base) = env::var("DISCORD_API_BASE") {
            self.discord.api_base = api_base;
        }
        if let Ok(roles) = env::var("DISCORD_MENTION_ROLES") {
            self.discord.mention_roles = roles
                .split(',')
                .map(str::trim)
                .filter(|role| !role.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(template) = env::var("MESSAGE_TEMPLATE") {
            // .env files cannot hold raw newlines
            self.discord.message_template = template.replace("\\n", "\n");
        }

        // Tracker settings
        if let Ok(interval) = env::var("POLL_INTERVAL_SECONDS") {
            self.tracker.poll_interval_seconds = parse_var("POLL_INTERVAL_SECONDS", &interval)?;
        }
        if let Ok(threshold) = env::var("FRESHNESS_THRESHOLD_SECONDS") {
            self.tracker.freshness_threshold_seconds =
                parse_var("FRESHNESS_THRESHOLD_SECONDS", &threshold)?;
        }
        if let Ok(keyword) = env::var("KEYWORD_FILTER") {
            self.tracker.keyword = keyword;
        }
        if let Ok(capacity) = env::var("SEEN_CAPACITY") {
            self.tracker.seen_capacity = parse_var("SEEN_CAPACITY", &capacity)?;
        }
        if let Ok(delay) = env::var("PUBLISH_DELAY_MS") {
            self.tracker.publish_delay_ms = parse_var("PUBLISH_DELAY_MS", &delay)?;
        }

        // Render settings
        if let Ok(dir) = env::var("ASSETS_DIR") {
            self.render.assets_dir = PathBuf::from(dir);
        }

        Ok(())
    }

    /// Get shutdown timeout as Duration
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.service.shutdown_timeout_seconds)
    }

    /// Get poll interval as Duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.tracker.poll_interval_seconds)
    }

    /// Get the in-tick publish delay as Duration
    pub fn publish_delay(&self) -> Duration {
        Duration::from_millis(self.tracker.publish_delay_ms)
    }

    /// Get listing request timeout as Duration
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing.request_timeout_seconds)
    }

    /// Get Discord request timeout as Duration
    pub fn discord_timeout(&self) -> Duration {
        Duration::from_secs(self.discord.request_timeout_seconds)
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    // Validate ports
    if config.service.enable_health_server && config.service.health_port == 0 {
        return Err(anyhow!("Health port cannot be 0"));
    }

    // Validate timeouts
    if config.service.shutdown_timeout_seconds == 0 {
        return Err(anyhow!("Shutdown timeout must be greater than 0"));
    }
    if config.listing.request_timeout_seconds == 0 {
        return Err(anyhow!("Listing request timeout must be greater than 0"));
    }
    if config.discord.request_timeout_seconds == 0 {
        return Err(anyhow!("Discord request timeout must be greater than 0"));
    }

    // Validate listing settings
    if config.listing.api_url.is_empty() {
        return Err(anyhow!("Listing API URL cannot be empty"));
    }

    // Validate Discord settings
    if config.discord.token.is_empty() {
        return Err(anyhow!("DISCORD_TOKEN must be set"));
    }
    if config.discord.channel_id.is_empty() {
        return Err(anyhow!("DISCORD_CHANNEL_ID must be set"));
    }
    if config.discord.api_base.is_empty() {
        return Err(anyhow!("Discord API base URL cannot be empty"));
    }

    // Validate tracker settings
    if config.tracker.poll_interval_seconds == 0 {
        return Err(anyhow!("Poll interval must be greater than 0"));
    }
    if config.tracker.freshness_threshold_seconds <= 0 {
        return Err(anyhow!("Freshness threshold must be positive"));
    }
    if config.tracker.keyword.trim().is_empty() {
        return Err(anyhow!("Keyword filter cannot be empty"));
    }
    if config.tracker.seen_capacity == 0 {
        return Err(anyhow!("Seen capacity must be greater than 0"));
    }

    Ok(())
}
