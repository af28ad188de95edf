//! Expo push gateway channel
//!
//! Posts message batches as a JSON array to the Expo push API.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{ChannelError, ChannelResult, DeliveryStatus, PushChannel};
use crate::notifications::PushMessage;

/// Public Expo push endpoint
pub const DEFAULT_EXPO_ENDPOINT: &str = "https://exp.host/--/api/v2/push/send";

/// Expo channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpoConfig {
    /// Push endpoint URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Optional access token (sent as Bearer token)
    #[serde(default)]
    pub access_token: Option<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_endpoint() -> String {
    DEFAULT_EXPO_ENDPOINT.to_string()
}

fn default_timeout() -> u64 {
    10
}

impl Default for ExpoConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            access_token: None,
            timeout_secs: default_timeout(),
        }
    }
}

impl ExpoConfig {
    /// Create a configuration for a custom endpoint
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    /// Set access token
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// Set request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("Push endpoint cannot be empty".to_string());
        }

        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err("Push endpoint must start with http:// or https://".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        Ok(())
    }
}

/// Per-message ticket returned by the gateway
#[derive(Debug, Clone, Deserialize)]
struct PushTicket {
    status: String,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct PushResponse {
    #[serde(default)]
    data: Vec<PushTicket>,
}

/// Expo push channel
///
/// Each call sends exactly one HTTP request. A non-2xx answer is an error;
/// a 2xx answer whose tickets report per-message errors is a success with a
/// note, since the rest of the batch went through.
pub struct ExpoChannel {
    config: ExpoConfig,
    client: Client,
}

impl ExpoChannel {
    /// Create a new Expo channel
    pub fn new(config: ExpoConfig) -> ChannelResult<Self> {
        config.validate().map_err(ChannelError::InvalidConfig)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ChannelError::Other(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { config, client })
    }

    /// Channel on the public Expo endpoint
    pub fn public() -> ChannelResult<Self> {
        Self::new(ExpoConfig::default())
    }

    /// Get the endpoint URL
    pub fn endpoint(&self) -> &str {
        &self.config.endpoint
    }
}

#[async_trait]
impl PushChannel for ExpoChannel {
    fn name(&self) -> &str {
        "expo"
    }

    async fn send_batch(&self, messages: &[PushMessage]) -> ChannelResult<DeliveryStatus> {
        if messages.is_empty() {
            return Ok(DeliveryStatus::success("expo", 0));
        }

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .header(reqwest::header::ACCEPT, "application/json");

        if let Some(token) = &self.config.access_token {
            request = request.bearer_auth(token);
        }

        let response = request.json(messages).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read response body".to_string());
            return Err(ChannelError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let tickets = response
            .json::<PushResponse>()
            .await
            .map(|r| r.data)
            .unwrap_or_default();
        let rejected: Vec<&PushTicket> = tickets.iter().filter(|t| t.status == "error").collect();

        tracing::debug!(
            endpoint = %self.config.endpoint,
            messages = messages.len(),
            rejected = rejected.len(),
            "Push batch delivered"
        );

        if rejected.is_empty() {
            Ok(DeliveryStatus::success("expo", messages.len()))
        } else {
            let first = rejected
                .iter()
                .find_map(|t| t.message.clone())
                .unwrap_or_default();
            Ok(DeliveryStatus::success_with_message(
                "expo",
                messages.len(),
                format!("{} tickets rejected: {first}", rejected.len()),
            ))
        }
    }

    fn config(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name(),
            "endpoint": self.config.endpoint,
            "timeout_secs": self.config.timeout_secs,
            "has_auth": self.config.access_token.is_some(),
        })
    }
}
