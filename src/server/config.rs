//! HTTP server configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 8080))
}

fn default_true() -> bool {
    true
}

/// Configuration for the roster HTTP API
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Server bind address
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for API
    #[serde(default = "default_true")]
    pub enable_cors: bool,

    /// Enable request logging
    #[serde(default = "default_true")]
    pub enable_request_logging: bool,

    /// Bearer tokens accepted by the API, mapped to the user id they act as
    #[serde(default)]
    pub api_keys: HashMap<String, String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            enable_cors: true,
            enable_request_logging: true,
            api_keys: HashMap::new(),
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }

    /// User id a bearer token acts as
    pub fn user_for_token(&self, token: &str) -> Option<&str> {
        self.api_keys.get(token).map(String::as_str)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (token, user) in &self.api_keys {
            if token.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "api_keys".to_string(),
                    reason: "API key cannot be empty".to_string(),
                });
            }
            if user.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "api_keys".to_string(),
                    reason: format!("API key {}… has no user id", token_prefix(token)),
                });
            }
        }

        Ok(())
    }
}

fn token_prefix(token: &str) -> &str {
    match token.char_indices().nth(4) {
        Some((idx, _)) => &token[..idx],
        None => token,
    }
}

/// Builder for ServerConfig
#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    bind_address: Option<SocketAddr>,
    enable_cors: Option<bool>,
    enable_request_logging: Option<bool>,
    api_keys: HashMap<String, String>,
}

impl ServerConfigBuilder {
    /// Set bind address
    pub fn bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = Some(addr);
        self
    }

    /// Set bind address from string
    pub fn bind_address_str(mut self, addr: &str) -> Result<Self, ConfigError> {
        self.bind_address = Some(addr.parse().map_err(|_| ConfigError::InvalidValue {
            field: "bind_address".to_string(),
            reason: format!("Invalid address: {}", addr),
        })?);
        Ok(self)
    }

    /// Enable/disable CORS
    pub fn enable_cors(mut self, enable: bool) -> Self {
        self.enable_cors = Some(enable);
        self
    }

    /// Enable/disable request logging
    pub fn enable_request_logging(mut self, enable: bool) -> Self {
        self.enable_request_logging = Some(enable);
        self
    }

    /// Accept `token` as acting for `user_id`
    pub fn api_key(mut self, token: impl Into<String>, user_id: impl Into<String>) -> Self {
        self.api_keys.insert(token.into(), user_id.into());
        self
    }

    /// Build the config
    pub fn build(self) -> Result<ServerConfig, ConfigError> {
        let config = ServerConfig {
            bind_address: self.bind_address.unwrap_or_else(default_bind_address),
            enable_cors: self.enable_cors.unwrap_or(true),
            enable_request_logging: self.enable_request_logging.unwrap_or(true),
            api_keys: self.api_keys,
        };

        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Clone)]
pub enum ConfigError {
    InvalidValue { field: String, reason: String },
    MissingField { field: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            Self::MissingField { field } => {
                write!(f, "Missing required field: {}", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address.port(), 8080);
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn test_config_builder() {
        let config = ServerConfig::builder()
            .enable_cors(false)
            .api_key("secret-token", "admin-1")
            .build()
            .unwrap();

        assert!(!config.enable_cors);
        assert_eq!(config.user_for_token("secret-token"), Some("admin-1"));
        assert_eq!(config.user_for_token("other"), None);
    }

    #[test]
    fn test_config_validation_fails() {
        let result = ServerConfig::builder().api_key("token", " ").build();
        assert!(result.is_err());

        let result = ServerConfig::builder().api_key("", "admin").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_config_builder_with_address() {
        let config = ServerConfig::builder()
            .bind_address_str("127.0.0.1:9000")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(config.bind_address.port(), 9000);
        assert!(ServerConfig::builder().bind_address_str("nope").is_err());
    }
}
