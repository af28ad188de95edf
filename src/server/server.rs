//! Roster HTTP server

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::publish::PublishService;

use super::api::create_router;
use super::config::ServerConfig;

// ============================================================================
// App State
// ============================================================================

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Publishing and editing service
    pub service: Arc<PublishService>,

    /// Server configuration (API keys)
    pub config: Arc<ServerConfig>,

    /// Server start time
    pub start_time: Instant,
}

// ============================================================================
// Roster Server
// ============================================================================

/// HTTP front end of the roster service
pub struct RosterServer {
    config: ServerConfig,
    state: AppState,
}

impl RosterServer {
    /// Create a new server
    pub fn new(config: ServerConfig, service: PublishService) -> Result<Self, ServerError> {
        config
            .validate()
            .map_err(|e| ServerError::ConfigError(e.to_string()))?;

        if config.api_keys.is_empty() {
            tracing::warn!("No API keys configured, every request will be rejected");
        }

        let state = AppState {
            service: Arc::new(service),
            config: Arc::new(config.clone()),
            start_time: Instant::now(),
        };

        Ok(Self { config, state })
    }

    /// Get the application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let mut router = create_router(self.state.clone());

        if self.config.enable_cors {
            router = router.layer(
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            );
        }

        if self.config.enable_request_logging {
            router = router.layer(TraceLayer::new_for_http());
        }

        router
    }

    /// Start the server
    pub async fn start(&self) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!("Starting roster server on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        Ok(())
    }

    /// Start with graceful shutdown
    pub async fn start_with_shutdown(
        &self,
        shutdown_signal: impl std::future::Future<Output = ()> + Send + 'static,
    ) -> Result<(), ServerError> {
        let router = self.build_router();
        let addr = self.config.bind_address;

        tracing::info!("Starting roster server on {} (with graceful shutdown)", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(e.to_string()))?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal)
            .await
            .map_err(|e| ServerError::ServeError(e.to_string()))?;

        tracing::info!("Roster server shutdown complete");
        Ok(())
    }

    /// Get server info
    pub fn info(&self) -> ServerInfo {
        let service = &self.state.service;
        ServerInfo {
            bind_address: self.config.bind_address,
            api_keys: self.config.api_keys.len(),
            push_channel: service.notifier().channel_name().to_string(),
            cors_enabled: self.config.enable_cors,
            request_logging_enabled: self.config.enable_request_logging,
        }
    }
}

/// Server information
#[derive(Debug, Clone)]
pub struct ServerInfo {
    pub bind_address: SocketAddr,
    pub api_keys: usize,
    pub push_channel: String,
    pub cors_enabled: bool,
    pub request_logging_enabled: bool,
}

impl ServerInfo {
    /// Format as display string
    pub fn display(&self) -> String {
        format!(
            "Tour Roster Server\n\
             {:-<40}\n\
             Bind Address: {}\n\
             API Keys: {}\n\
             Push Channel: {}\n\
             CORS: {}\n\
             Request Logging: {}",
            "",
            self.bind_address,
            self.api_keys,
            self.push_channel,
            if self.cors_enabled { "enabled" } else { "disabled" },
            if self.request_logging_enabled { "enabled" } else { "disabled" }
        )
    }
}

// ============================================================================
// Server Errors
// ============================================================================

/// Server errors
#[derive(Debug, Clone)]
pub enum ServerError {
    /// Configuration error
    ConfigError(String),

    /// Failed to bind to address
    BindError(String),

    /// Server error
    ServeError(String),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Self::BindError(msg) => write!(f, "Failed to bind: {}", msg),
            Self::ServeError(msg) => write!(f, "Server error: {}", msg),
        }
    }
}

impl std::error::Error for ServerError {}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::Notifier;
    use crate::storage::create_memory_store;

    fn service() -> PublishService {
        PublishService::new(create_memory_store(), Notifier::disabled())
    }

    #[test]
    fn test_server_creation() {
        let server = RosterServer::new(ServerConfig::default(), service());
        assert!(server.is_ok());
    }

    #[test]
    fn test_server_info() {
        let config = ServerConfig::builder()
            .api_key("secret-token", "admin-1")
            .enable_cors(false)
            .build()
            .unwrap();

        let server = RosterServer::new(config, service()).unwrap();
        let info = server.info();

        assert_eq!(info.api_keys, 1);
        assert_eq!(info.push_channel, "log");
        assert!(!info.cors_enabled);
        assert!(info.display().contains("CORS: disabled"));
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = ServerConfig::default();
        config.api_keys.insert("token".into(), " ".into());

        let err = RosterServer::new(config, service()).err().unwrap();
        assert!(matches!(err, ServerError::ConfigError(_)));
    }
}
