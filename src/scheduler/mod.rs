//! Monthly tour roster scheduling
//!
//! This module holds the pure part of the publishing pipeline: turning
//! availability into candidate lists, expanding a month into slots, proposing
//! a fair assignment and layering manual overrides on top of it. Nothing here
//! touches storage or the network.
//!
//! # Pipeline
//!
//! ```text
//! availability rows ──┐
//! guide rows ─────────┼─► CandidateMap ──┐
//! history rows ───────┴─► HistoryCounts  │
//!                                        ▼
//! DateRange ─► enumerate_slots ─► FairShareAssigner ─► AssignmentProposal
//!                                                            │
//!                                             Overrides ─► reconcile
//!                                                            │
//!                                                            ▼
//!                                                  EffectiveAssignment
//! ```
//!
//! # Modules
//!
//! - [`aggregate`] - Candidate lists per date and trailing history counts
//! - [`slots`] - Slot times, calendar windows and slot enumeration
//! - [`assignment`] - Greedy least-loaded assignment with name tie-break
//! - [`overrides`] - Manual override reconciliation
//! - [`error`] - Precondition and validation errors
//!
//! # Quick Start
//!
//! ```ignore
//! use tour_roster::scheduler::{
//!     enumerate_slots, reconcile, CandidateMap, DateRange, FairShareAssigner, Overrides,
//!     SlotTimes,
//! };
//!
//! let range = DateRange::next_month(today);
//! let slots = enumerate_slots(&range, true, &SlotTimes::default());
//! let candidates = CandidateMap::build(&availability, &guides);
//!
//! let baseline = FairShareAssigner::new().propose(&slots, &candidates);
//! let effective = reconcile(&slots, &candidates, &baseline, &Overrides::new());
//! assert!(effective.is_complete());
//! ```

pub mod aggregate;
pub mod assignment;
pub mod error;
pub mod overrides;
pub mod slots;

// Re-export main types
pub use aggregate::{by_name, CandidateMap, HistoryCounts};
pub use assignment::{AssignmentProposal, FairShareAssigner};
pub use error::{SchedulerError, SchedulerResult};
pub use overrides::{
    reconcile, AssignmentSource, EffectiveAssignment, EffectiveSlot, GuideLoad, Overrides,
};
pub use slots::{enumerate_slots, DateRange, HistoryWindow, PlannedSlot, SlotTimes};
