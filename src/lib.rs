//! tour-roster - Monthly tour publishing for a tour-guiding business
//!
//! Builds next month's roster from guide availability with a deterministic
//! fair-share assignment, lets an admin override individual slots, commits
//! the batch idempotently and notifies the affected guides by push.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`config`] - Configuration management and settings
//! - [`models`] - Guides, slots and availability rows
//! - [`scheduler`] - Slot enumeration, fair-share assignment, overrides
//! - [`publish`] - Preview, commit and edit flows behind an admin context
//! - [`notifications`] - Expo push fan-out in bounded batches
//! - [`storage`] - Store traits with PostgreSQL and in-memory backends
//! - [`server`] - JSON HTTP API
//!
//! # Example
//!
//! ```no_run
//! use tour_roster::notifications::Notifier;
//! use tour_roster::publish::{PublishService, RequestContext};
//! use tour_roster::scheduler::Overrides;
//! use tour_roster::storage::create_memory_store;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let service = PublishService::new(create_memory_store(), Notifier::disabled());
//!     let ctx = RequestContext::cli(chrono::Local::now().date_naive());
//!     let preview = service.preview(&ctx, false, &Overrides::new()).await?;
//!     println!("{} unassigned", preview.effective.unassigned);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod models;
pub mod notifications;
pub mod publish;
pub mod scheduler;
pub mod server;
pub mod storage;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result};
    pub use crate::models::{Guide, GuideId, GuideSummary, Slot, SlotKey, SlotRecord};
    pub use crate::notifications::Notifier;
    pub use crate::publish::{PublishService, RequestContext};
    pub use crate::scheduler::{FairShareAssigner, Overrides, SchedulerError};
    pub use crate::storage::{RosterStore, SharedRosterStore};
}

// Direct re-exports for convenience
pub use models::{Guide, GuideId, SlotKey};
