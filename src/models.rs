//! Core data models for tour-roster
//!
//! This module defines the guide, availability and slot types shared by the
//! scheduler, the storage backends and the HTTP API.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Number of id characters kept in the placeholder name of an unnamed guide
const PLACEHOLDER_ID_CHARS: usize = 6;

// ============================================================================
// Guide
// ============================================================================

/// Opaque guide identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GuideId(String);

impl GuideId {
    /// Create a guide id from any string-like value
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Short, stable prefix of the id used in placeholder names
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(PLACEHOLDER_ID_CHARS) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// Placeholder display name for a guide without a usable name
    pub fn placeholder_name(&self) -> String {
        format!("Guide {}", self.short())
    }
}

impl fmt::Display for GuideId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for GuideId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for GuideId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A guide as stored in the guide directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Guide {
    pub id: GuideId,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Linked account id, used to route push notifications
    pub user_id: Option<String>,
}

impl Guide {
    /// Create a guide with a name and no linked account
    pub fn new(id: impl Into<GuideId>, first_name: &str, last_name: &str) -> Self {
        Self {
            id: id.into(),
            first_name: Some(first_name.to_string()),
            last_name: Some(last_name.to_string()),
            user_id: None,
        }
    }

    /// Link the guide to an external account
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    /// Full name, or `None` when both name parts are blank
    pub fn full_name(&self) -> Option<String> {
        let first = self.first_name.as_deref().unwrap_or("").trim();
        let last = self.last_name.as_deref().unwrap_or("").trim();
        let full = format!("{first} {last}").trim().to_string();
        (!full.is_empty()).then_some(full)
    }

    /// Name shown to admins, falling back to the id-derived placeholder
    pub fn display_name(&self) -> String {
        self.full_name().unwrap_or_else(|| self.id.placeholder_name())
    }

    pub fn summary(&self) -> GuideSummary {
        GuideSummary {
            id: self.id.clone(),
            name: self.display_name(),
        }
    }
}

/// Guide id plus resolved display name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GuideSummary {
    pub id: GuideId,
    pub name: String,
}

impl GuideSummary {
    pub fn new(id: impl Into<GuideId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

// ============================================================================
// Availability & History
// ============================================================================

/// A guide's self-reported availability for one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityEntry {
    pub guide_id: GuideId,
    pub date: NaiveDate,
    pub available: bool,
}

impl AvailabilityEntry {
    pub fn available(guide_id: impl Into<GuideId>, date: NaiveDate) -> Self {
        Self {
            guide_id: guide_id.into(),
            date,
            available: true,
        }
    }
}

/// One historical assignment of a guide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    pub guide_id: GuideId,
    pub date: NaiveDate,
}

// ============================================================================
// Slots
// ============================================================================

/// Fixed time-of-day a tour can start at
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SlotTime {
    /// The daily morning tour
    Morning,
    /// The optional afternoon tour
    Afternoon,
}

impl SlotTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
        }
    }
}

impl fmt::Display for SlotTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Compound key identifying one logical slot
///
/// Ordering is chronological: by date, then by clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub date: NaiveDate,
    pub time: NaiveTime,
}

impl SlotKey {
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.date, self.time.format("%H:%M"))
    }
}

/// Lifecycle status of a stored slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SlotStatus {
    Planned,
    Completed,
    /// Payment related and other states this crate does not interpret
    Other(String),
}

impl SlotStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Planned => "planned",
            Self::Completed => "completed",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for SlotStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "planned" => Self::Planned,
            "completed" => Self::Completed,
            _ => Self::Other(s),
        }
    }
}

impl From<SlotStatus> for String {
    fn from(status: SlotStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for SlotStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A slot row as persisted in the slot store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    pub id: Uuid,
    #[serde(rename = "slot_date")]
    pub date: NaiveDate,
    #[serde(rename = "slot_time")]
    pub time: NaiveTime,
    pub guide_id: Option<GuideId>,
    pub status: SlotStatus,
}

impl Slot {
    pub fn key(&self) -> SlotKey {
        SlotKey::new(self.date, self.time)
    }
}

/// A row handed to the slot store's upsert, keyed by (date, time)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    pub key: SlotKey,
    pub guide_id: GuideId,
    pub status: SlotStatus,
}

impl SlotRecord {
    /// A freshly published, planned slot
    pub fn planned(key: SlotKey, guide_id: GuideId) -> Self {
        Self {
            key,
            guide_id,
            status: SlotStatus::Planned,
        }
    }
}
