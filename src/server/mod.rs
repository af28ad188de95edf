//! HTTP API for publishing and editing the roster
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │              Roster Server               │
//! │                                          │
//! │  ┌────────────────────────────────────┐  │
//! │  │  auth: bearer token → user id →    │  │
//! │  │        admin check → RequestContext│  │
//! │  └────────────────────────────────────┘  │
//! │                                          │
//! │  ┌────────────────────────────────────┐  │
//! │  │              REST API              │  │
//! │  │  GET  /api/health                  │  │
//! │  │  GET  /api/publish/availability    │  │
//! │  │  POST /api/publish/preview         │  │
//! │  │  POST /api/publish/commit          │  │
//! │  │  GET  /api/edit-schedule/current   │  │
//! │  │  POST /api/edit-schedule/update    │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use tour_roster::server::{RosterServer, ServerConfig};
//!
//! let server = RosterServer::new(ServerConfig::default(), service)?;
//! server.start().await?;
//! ```

pub mod api;
pub mod auth;
pub mod config;
pub mod server;

pub use config::{ConfigError, ServerConfig, ServerConfigBuilder};
pub use server::{AppState, RosterServer, ServerError, ServerInfo};
