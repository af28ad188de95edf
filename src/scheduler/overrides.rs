//! Manual override reconciliation
//!
//! Layers admin-chosen guides on top of the greedy baseline. An override is
//! honored only when its guide is a candidate for the slot's date; anything
//! else falls back to the baseline without an error, since candidate lists
//! can change between two loads of the same month.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;

use super::aggregate::{CandidateMap, HistoryCounts};
use super::assignment::AssignmentProposal;
use super::slots::PlannedSlot;
use crate::models::{GuideId, GuideSummary, SlotKey, SlotRecord};

/// Sparse per-slot overrides entered by an admin
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides(BTreeMap<SlotKey, GuideId>);

impl Overrides {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the override for a slot
    pub fn set(&mut self, key: SlotKey, guide: impl Into<GuideId>) {
        self.0.insert(key, guide.into());
    }

    /// Builder form of [`Overrides::set`]
    pub fn with(mut self, key: SlotKey, guide: impl Into<GuideId>) -> Self {
        self.set(key, guide);
        self
    }

    /// Drop the override for a slot
    pub fn clear(&mut self, key: &SlotKey) {
        self.0.remove(key);
    }

    pub fn get(&self, key: &SlotKey) -> Option<&GuideId> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SlotKey, &GuideId)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(SlotKey, GuideId)> for Overrides {
    fn from_iter<I: IntoIterator<Item = (SlotKey, GuideId)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Where a slot's effective guide came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSource {
    Baseline,
    Override,
    Unassigned,
}

/// One slot of the effective assignment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EffectiveSlot {
    pub slot: PlannedSlot,
    pub baseline: Option<GuideSummary>,
    pub guide: Option<GuideSummary>,
    pub source: AssignmentSource,
    /// Everyone available that day, for the admin's picker
    pub candidates: Vec<GuideSummary>,
}

/// Per-guide row of the distribution table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuideLoad {
    pub guide: GuideSummary,
    pub assigned: usize,
    pub history: usize,
}

/// Baseline with overrides applied; what a publish would commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EffectiveAssignment {
    pub slots: Vec<EffectiveSlot>,
    pub counts: HashMap<GuideId, usize>,
    pub unassigned: usize,
    pub applied_overrides: usize,
    pub ignored_overrides: Vec<(SlotKey, GuideId)>,
}

impl EffectiveAssignment {
    /// Assigned count for a guide, zero when absent
    pub fn count_for(&self, guide: &GuideId) -> usize {
        self.counts.get(guide).copied().unwrap_or(0)
    }

    /// Effective guide for a slot
    pub fn guide_for(&self, key: &SlotKey) -> Option<&GuideSummary> {
        self.slots
            .iter()
            .find(|s| &s.slot.key == key)
            .and_then(|s| s.guide.as_ref())
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned == 0
    }

    /// Rows to upsert, one per assigned slot, in slot order
    pub fn records(&self) -> Vec<SlotRecord> {
        self.slots
            .iter()
            .filter_map(|s| {
                s.guide
                    .as_ref()
                    .map(|g| SlotRecord::planned(s.slot.key, g.id.clone()))
            })
            .collect()
    }

    /// Distribution table: every candidate guide with assigned and history counts
    pub fn loads(&self, candidates: &CandidateMap, history: &HistoryCounts) -> Vec<GuideLoad> {
        candidates
            .all_guides()
            .into_iter()
            .map(|guide| GuideLoad {
                assigned: self.count_for(&guide.id),
                history: history.get(&guide.id),
                guide,
            })
            .collect()
    }
}

/// Apply `overrides` on top of `baseline`
///
/// Counts and the unassigned total are recomputed from the effective guides,
/// not copied from the baseline. Overrides for slots outside `slots` are
/// reported as ignored.
pub fn reconcile(
    slots: &[PlannedSlot],
    candidates: &CandidateMap,
    baseline: &AssignmentProposal,
    overrides: &Overrides,
) -> EffectiveAssignment {
    let mut effective = EffectiveAssignment::default();

    for slot in slots {
        let eligible = candidates.candidates(slot.date());
        let base = baseline.guide_for(&slot.key).cloned();

        let chosen_override = overrides.get(&slot.key).and_then(|id| {
            let found = eligible.iter().find(|g| &g.id == id).cloned();
            if found.is_none() {
                tracing::debug!(slot = %slot.key, guide = %id, "Ignoring override for unavailable guide");
                effective.ignored_overrides.push((slot.key, id.clone()));
            }
            found
        });

        let (guide, source) = match (chosen_override, base.clone()) {
            (Some(g), _) => {
                effective.applied_overrides += 1;
                (Some(g), AssignmentSource::Override)
            }
            (None, Some(g)) => (Some(g), AssignmentSource::Baseline),
            (None, None) => (None, AssignmentSource::Unassigned),
        };

        match &guide {
            Some(g) => *effective.counts.entry(g.id.clone()).or_insert(0) += 1,
            None => effective.unassigned += 1,
        }

        effective.slots.push(EffectiveSlot {
            slot: *slot,
            baseline: base,
            guide,
            source,
            candidates: eligible.to_vec(),
        });
    }

    let planned: BTreeSet<SlotKey> = slots.iter().map(|s| s.key).collect();
    for (key, id) in overrides.iter().filter(|(key, _)| !planned.contains(*key)) {
        tracing::debug!(slot = %key, guide = %id, "Ignoring override for unplanned slot");
        effective.ignored_overrides.push((*key, id.clone()));
    }

    effective
}
