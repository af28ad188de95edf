//! Data access for guides, availability, slots and push tokens
//!
//! The roster logic only ever talks to the narrow traits defined here, so
//! the same service code runs against PostgreSQL in production and against
//! the in-memory store in tests and demo mode.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │               PublishService / HTTP handlers                │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     RosterStore traits                      │
//! │  AvailabilitySource, GuideDirectory, HistorySource,         │
//! │  SlotStore, PushTokenStore, AdminDirectory                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!     ┌─────────────────┐           ┌─────────────────┐
//!     │   PostgreSQL    │           │    In-memory    │
//!     │  PgRosterStore  │           │MemoryRosterStore│
//!     └─────────────────┘           └─────────────────┘
//! ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{AvailabilityEntry, Guide, GuideId, HistoryRow, Slot, SlotRecord};

pub use memory::MemoryRosterStore;
pub use postgres::PgRosterStore;

// ============================================================================
// Errors
// ============================================================================

/// Errors raised by a storage backend
#[derive(Error, Debug)]
pub enum StoreError {
    /// No pooled connection could be obtained
    #[error("connection pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// The database rejected a statement
    #[error("database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A referenced row does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Backend-specific failure without a richer type
    #[error("{0}")]
    Other(String),
}

impl StoreError {
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }
}

/// Result type for storage operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

// ============================================================================
// Collaborator Traits
// ============================================================================

/// Source of guide availability
#[async_trait]
pub trait AvailabilitySource: Send + Sync {
    /// Rows marked available with `start <= date < end`
    async fn available_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<AvailabilityEntry>>;
}

/// Guide directory lookups
#[async_trait]
pub trait GuideDirectory: Send + Sync {
    /// Guides with the given ids; unknown ids are simply absent
    async fn guides_by_ids(&self, ids: &[GuideId]) -> StoreResult<Vec<Guide>>;

    /// Every guide
    async fn all_guides(&self) -> StoreResult<Vec<Guide>>;
}

/// Past slot assignments
#[async_trait]
pub trait HistorySource: Send + Sync {
    /// Assigned slots of `ids` with `start <= date <= end_inclusive`
    async fn history_for(
        &self,
        ids: &[GuideId],
        start: NaiveDate,
        end_inclusive: NaiveDate,
    ) -> StoreResult<Vec<HistoryRow>>;
}

/// Persistent slot table
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Insert or update all rows keyed by (date, time), atomically
    ///
    /// Returns the number of rows written.
    async fn upsert_slots(&self, rows: &[SlotRecord]) -> StoreResult<usize>;

    /// Slots with the given ids
    async fn slots_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Slot>>;

    /// Set (or clear) the guide of one slot
    async fn update_slot_guide(&self, id: Uuid, guide: Option<&GuideId>) -> StoreResult<()>;

    /// Planned slots with `start <= date < end`, ordered by date then time
    async fn planned_slots_between(&self, start: NaiveDate, end: NaiveDate)
        -> StoreResult<Vec<Slot>>;
}

/// Registered device push tokens
#[async_trait]
pub trait PushTokenStore: Send + Sync {
    /// Raw tokens registered by any of `user_ids`
    async fn tokens_for_users(&self, user_ids: &[String]) -> StoreResult<Vec<String>>;
}

/// Authorization lookups
#[async_trait]
pub trait AdminDirectory: Send + Sync {
    async fn is_admin(&self, user_id: &str) -> StoreResult<bool>;
}

/// Everything the roster services need from a backend
pub trait RosterStore:
    AvailabilitySource + GuideDirectory + HistorySource + SlotStore + PushTokenStore + AdminDirectory
{
}

impl<T> RosterStore for T where
    T: AvailabilitySource
        + GuideDirectory
        + HistorySource
        + SlotStore
        + PushTokenStore
        + AdminDirectory
{
}

/// Shared store handle
pub type SharedRosterStore = Arc<dyn RosterStore>;

/// Create an empty in-memory store
pub fn create_memory_store() -> SharedRosterStore {
    Arc::new(MemoryRosterStore::new())
}
