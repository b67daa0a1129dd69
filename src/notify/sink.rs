//! Notification sink interface

use crate::error::Result;
use crate::types::{ChannelId, ChannelInfo, Notification};
use async_trait::async_trait;

/// Destination for lobby announcements
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Look up a channel; `Ok(None)` when it does not exist or is not visible
    async fn resolve_channel(&self, channel_id: &ChannelId) -> Result<Option<ChannelInfo>>;

    /// Send a message, with its attachment if any, to a channel
    async fn publish(&self, channel_id: &ChannelId, notification: Notification) -> Result<()>;
}
