//! Reminder delivery channels
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0

use crate::core::chunk_for_message;
use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::http::Http;
use serenity::model::id::ChannelId;
use std::sync::Arc;

/// Somewhere reminder text can be sent.
///
/// `Ok` means the destination accepted the message; only then is the
/// reminder recorded as sent.
#[async_trait]
pub trait ReminderSink: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Posts reminders to a single Discord channel over the REST API
pub struct DiscordChannelSink {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordChannelSink {
    pub fn new(http: Arc<Http>, channel_id: u64) -> Self {
        Self {
            http,
            channel_id: ChannelId(channel_id),
        }
    }
}

#[async_trait]
impl ReminderSink for DiscordChannelSink {
    async fn send(&self, text: &str) -> Result<()> {
        for chunk in chunk_for_message(text) {
            self.channel_id.say(&self.http, chunk).await?;
        }
        debug!("Delivered reminder to channel {}", self.channel_id);
        Ok(())
    }
}
