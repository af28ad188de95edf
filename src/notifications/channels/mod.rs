//! Push delivery channels
//!
//! A channel takes one batch of already addressed messages and hands it to a
//! gateway. Batching, recipient lookup and error swallowing live in
//! [`crate::notifications::Notifier`].

pub mod expo;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::notifications::PushMessage;

pub use expo::{ExpoChannel, ExpoConfig};

/// Result type for channel operations
pub type ChannelResult<T> = Result<T, ChannelError>;

/// Errors that can occur during channel operations
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The gateway answered with a non-success status
    #[error("Gateway rejected batch (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Generic error
    #[error("Channel error: {0}")]
    Other(String),
}

/// Outcome of delivering one batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryStatus {
    /// Whether the gateway accepted the batch
    pub success: bool,
    /// Channel that delivered (or failed to deliver) the batch
    pub channel: String,
    /// Number of messages in the batch
    pub messages: usize,
    /// Optional message about the delivery
    pub message: Option<String>,
    /// Timestamp of delivery attempt
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl DeliveryStatus {
    /// Create a successful delivery status
    pub fn success(channel: impl Into<String>, messages: usize) -> Self {
        Self {
            success: true,
            channel: channel.into(),
            messages,
            message: None,
            timestamp: chrono::Utc::now(),
        }
    }

    /// Create a successful delivery status with a message
    pub fn success_with_message(
        channel: impl Into<String>,
        messages: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            message: Some(message.into()),
            ..Self::success(channel, messages)
        }
    }

    /// Create a failed delivery status
    pub fn failure(channel: impl Into<String>, messages: usize, message: impl Into<String>) -> Self {
        Self {
            success: false,
            channel: channel.into(),
            messages,
            message: Some(message.into()),
            timestamp: chrono::Utc::now(),
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = if self.success { "SUCCESS" } else { "FAILED" };
        write!(f, "[{status}] {} ({} messages)", self.channel, self.messages)?;
        if let Some(msg) = &self.message {
            write!(f, ": {msg}")?;
        }
        Ok(())
    }
}

/// A push gateway
#[async_trait]
pub trait PushChannel: Send + Sync {
    /// Get the channel name
    fn name(&self) -> &str;

    /// Deliver one batch; a single attempt, no retries
    async fn send_batch(&self, messages: &[PushMessage]) -> ChannelResult<DeliveryStatus>;

    /// Get channel configuration as JSON
    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
        })
    }
}

/// Channel used when push delivery is disabled: logs and drops every batch
#[derive(Debug, Clone, Copy, Default)]
pub struct LogChannel;

#[async_trait]
impl PushChannel for LogChannel {
    fn name(&self) -> &str {
        "log"
    }

    async fn send_batch(&self, messages: &[PushMessage]) -> ChannelResult<DeliveryStatus> {
        for message in messages {
            tracing::info!(to = %message.to, title = %message.title, "Push disabled, not sent");
        }
        Ok(DeliveryStatus::success_with_message(
            "log",
            messages.len(),
            "push delivery disabled",
        ))
    }
}
