//! Publishing and editing the tour roster
//!
//! [`PublishService`] ties the pure scheduler to storage and notifications:
//!
//! - [`PublishService::load_availability`] - candidates and history for next month
//! - [`PublishService::preview`] - baseline proposal with overrides applied
//! - [`PublishService::publish`] / [`PublishService::commit_slots`] - upsert and notify
//! - [`PublishService::current_schedule`] / [`PublishService::update_schedule`] -
//!   the current month's planned slots and incremental edits
//!
//! Every entry point takes a [`RequestContext`] and rejects non-admin callers.

mod commit;
pub mod context;
mod edit;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::config::RosterConfig;
use crate::error::{Error, Result};
use crate::models::GuideId;
use crate::notifications::Notifier;
use crate::scheduler::{
    enumerate_slots, reconcile, AssignmentProposal, CandidateMap, DateRange, EffectiveAssignment,
    FairShareAssigner, GuideLoad, HistoryCounts, HistoryWindow, Overrides, PlannedSlot, SlotTimes,
};
use crate::storage::SharedRosterStore;

pub use commit::{CommitRow, PublishOutcome};
pub use context::{Principal, RequestContext};
pub use edit::{CurrentSchedule, SlotUpdate, UpdateOutcome};

/// Inputs of a publishing round: who can work when, and recent load
#[derive(Debug, Clone, Serialize)]
pub struct AvailabilitySnapshot {
    pub range: DateRange,
    pub history_window: HistoryWindow,
    pub candidates: CandidateMap,
    pub history: HistoryCounts,
}

/// A computed, not yet committed, roster
#[derive(Debug, Clone)]
pub struct Preview {
    pub snapshot: AvailabilitySnapshot,
    pub include_afternoon: bool,
    pub slots: Vec<PlannedSlot>,
    pub baseline: AssignmentProposal,
    pub effective: EffectiveAssignment,
    /// Per-guide assigned and history counts, sorted by name
    pub loads: Vec<GuideLoad>,
}

impl Preview {
    /// Enumerate, assign and reconcile against a snapshot
    pub fn compute(
        snapshot: AvailabilitySnapshot,
        include_afternoon: bool,
        times: &SlotTimes,
        overrides: &Overrides,
    ) -> Self {
        let slots = enumerate_slots(&snapshot.range, include_afternoon, times);
        let baseline = FairShareAssigner::new().propose(&slots, &snapshot.candidates);
        let effective = reconcile(&slots, &snapshot.candidates, &baseline, overrides);
        let loads = effective.loads(&snapshot.candidates, &snapshot.history);

        Self {
            snapshot,
            include_afternoon,
            slots,
            baseline,
            effective,
            loads,
        }
    }

    pub fn is_publishable(&self) -> bool {
        !self.slots.is_empty() && self.effective.is_complete()
    }
}

/// Roster publishing service
#[derive(Clone)]
pub struct PublishService {
    store: SharedRosterStore,
    notifier: Notifier,
    times: SlotTimes,
    history_months: u32,
}

impl PublishService {
    /// Create a service with the default slot times and a 6-month history
    pub fn new(store: SharedRosterStore, notifier: Notifier) -> Self {
        Self {
            store,
            notifier,
            times: SlotTimes::default(),
            history_months: 6,
        }
    }

    /// Create a service using the configured roster rules
    pub fn from_config(store: SharedRosterStore, notifier: Notifier, roster: &RosterConfig) -> Self {
        Self::new(store, notifier)
            .with_slot_times(roster.slot_times())
            .with_history_months(roster.history_months)
    }

    pub fn with_slot_times(mut self, times: SlotTimes) -> Self {
        self.times = times;
        self
    }

    pub fn with_history_months(mut self, months: u32) -> Self {
        self.history_months = months;
        self
    }

    pub fn store(&self) -> &SharedRosterStore {
        &self.store
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn slot_times(&self) -> &SlotTimes {
        &self.times
    }

    /// Candidates per date for next month, plus trailing history counts
    pub async fn load_availability(&self, ctx: &RequestContext) -> Result<AvailabilitySnapshot> {
        ctx.require_admin()?;

        let range = DateRange::next_month(ctx.today());
        let history_window = HistoryWindow::trailing(ctx.today(), self.history_months);

        let rows = self
            .store
            .available_between(range.start, range.end)
            .await
            .map_err(|e| Error::load("availability", e))?;

        let ids: Vec<GuideId> = rows
            .iter()
            .map(|r| r.guide_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let (guides, history_rows) = if ids.is_empty() {
            (Vec::new(), Vec::new())
        } else {
            futures::try_join!(
                async {
                    self.store
                        .guides_by_ids(&ids)
                        .await
                        .map_err(|e| Error::load("guides", e))
                },
                async {
                    self.store
                        .history_for(&ids, history_window.start, history_window.end_inclusive)
                        .await
                        .map_err(|e| Error::load("history", e))
                },
            )?
        };

        let candidates = CandidateMap::build(&rows, &guides);
        let history = HistoryCounts::from_rows(&history_rows);

        tracing::info!(
            start = %range.start,
            end = %range.end,
            rows = rows.len(),
            guides = ids.len(),
            "Availability loaded"
        );

        Ok(AvailabilitySnapshot {
            range,
            history_window,
            candidates,
            history,
        })
    }

    /// Propose next month's roster with `overrides` applied
    pub async fn preview(
        &self,
        ctx: &RequestContext,
        include_afternoon: bool,
        overrides: &Overrides,
    ) -> Result<Preview> {
        let snapshot = self.load_availability(ctx).await?;
        let preview = Preview::compute(snapshot, include_afternoon, &self.times, overrides);

        tracing::info!(
            slots = preview.slots.len(),
            unassigned = preview.effective.unassigned,
            overrides = overrides.len(),
            ignored = preview.effective.ignored_overrides.len(),
            "Preview computed"
        );

        Ok(preview)
    }
}
