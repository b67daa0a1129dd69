//! Configuration management for the lobby herald
//!
//! This module handles all configuration loading from environment variables
//! and TOML files, validation, and default values for the service.

pub mod app;

// Re-export commonly used types
pub use app::{
    validate_config, AppConfig, ConfigOverrides, DiscordSettings, ListingSettings, RenderSettings,
    ServiceSettings, TrackerSettings,
};
