//! Error types for the lobby herald
//!
//! This module defines all error types using anyhow for consistent error handling
//! throughout the application.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Custom error types for specific herald scenarios
#[derive(Debug, thiserror::Error)]
pub enum HeraldError {
    #[error("Lobby listing request failed: {message}")]
    ListingFailed { message: String },

    #[error("Unexpected listing response: {reason}")]
    InvalidListing { reason: String },

    #[error("Notification sink request failed: {message}")]
    SinkRequestFailed { message: String },

    #[error("Notification sink rejected request with status {status}: {body}")]
    SinkRejected { status: u16, body: String },

    #[error("Channel not found: {channel_id}")]
    ChannelNotFound { channel_id: String },

    #[error("Rendering failed: {reason}")]
    RenderFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
