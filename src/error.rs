//! Unified error handling for the tour-roster crate
//!
//! Service entry points return [`Error`]. Storage failures are wrapped with
//! what was being loaded or written, scheduler preconditions are carried
//! through unchanged so their message reaches the admin verbatim.
//!
//! # Usage
//!
//! ```rust,ignore
//! use tour_roster::error::{Error, ErrorCategory};
//!
//! fn report(err: &Error) {
//!     match err.category() {
//!         ErrorCategory::Scheduler => println!("fix and retry: {err}"),
//!         _ => eprintln!("failed: {err}"),
//!     }
//! }
//! ```

use thiserror::Error;

pub use crate::scheduler::error::SchedulerError;
pub use crate::storage::StoreError;

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input or payloads
    Parsing,
    /// Storage reads and writes
    Storage,
    /// Scheduling preconditions and validation
    Scheduler,
    /// Missing or rejected credentials
    Auth,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Parsing => "parsing",
            Self::Storage => "storage",
            Self::Scheduler => "scheduler",
            Self::Auth => "auth",
        }
    }
}

/// Unified error type for the tour-roster crate
#[derive(Error, Debug)]
pub enum Error {
    /// An upstream read failed
    #[error("Failed to load {what}: {source}")]
    Load {
        what: &'static str,
        #[source]
        source: StoreError,
    },

    /// Precondition or validation failure
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// A write failed
    #[error("Failed to {action}: {source}")]
    Write {
        action: &'static str,
        #[source]
        source: StoreError,
    },

    /// Missing or unknown credentials
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated, but not an admin
    #[error("{0}")]
    Forbidden(String),

    /// The admin lookup itself failed
    #[error("Admin check failed: {0}")]
    AdminCheck(#[source] StoreError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Wrap a failed read of `what`
    pub fn load(what: &'static str, source: StoreError) -> Self {
        Self::Load { what, source }
    }

    /// Wrap a failed write while trying to `action`
    pub fn write(action: &'static str, source: StoreError) -> Self {
        Self::Write { action, source }
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    /// Get the error category for handling strategies
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Load { .. } | Self::Write { .. } | Self::AdminCheck(_) => ErrorCategory::Storage,
            Self::Scheduler(_) => ErrorCategory::Scheduler,
            Self::Unauthorized(_) | Self::Forbidden(_) => ErrorCategory::Auth,
            Self::Json(_) => ErrorCategory::Parsing,
        }
    }

    /// HTTP status code this error is reported with
    pub fn http_status(&self) -> u16 {
        match self {
            Self::Scheduler(_) | Self::Json(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::Load { .. } | Self::Write { .. } | Self::AdminCheck(_) => 500,
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
