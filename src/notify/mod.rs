//! Outbound notifications
//!
//! The tracker publishes through the `NotificationSink` trait. The Discord
//! implementation talks to the REST API directly; `MessageTemplate` builds the
//! text that accompanies each rendered card.

pub mod discord;
pub mod message;
pub mod sink;

pub use discord::DiscordSink;
pub use message::MessageTemplate;
pub use sink::NotificationSink;
