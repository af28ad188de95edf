//! Greedy fair-share guide assignment
//!
//! Walks the slots of a batch in chronological order and gives each one to
//! the eligible guide with the fewest assignments so far in this batch.
//! Ties go to the guide whose display name sorts first. Trailing history is
//! carried along for display but never weighs in the choice.

use std::collections::{BTreeMap, HashMap};

use super::aggregate::{by_name, CandidateMap};
use super::slots::PlannedSlot;
use crate::models::{GuideId, GuideSummary, SlotKey};

// ============================================================================
// Assignment Proposal
// ============================================================================

/// Result of one greedy pass over a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AssignmentProposal {
    /// Chosen guide per slot; unassigned slots are absent
    pub assignments: BTreeMap<SlotKey, GuideSummary>,

    /// Slots assigned per guide in this batch
    pub counts: HashMap<GuideId, usize>,

    /// Slots whose date had no candidates
    pub unassigned: usize,
}

impl AssignmentProposal {
    /// Guide proposed for a slot
    pub fn guide_for(&self, key: &SlotKey) -> Option<&GuideSummary> {
        self.assignments.get(key)
    }

    /// Assigned count for a guide, zero when absent
    pub fn count_for(&self, guide: &GuideId) -> usize {
        self.counts.get(guide).copied().unwrap_or(0)
    }

    /// Difference between the busiest and the least busy guide among `guides`
    pub fn spread(&self, guides: &[GuideId]) -> usize {
        let counts: Vec<usize> = guides.iter().map(|g| self.count_for(g)).collect();
        match (counts.iter().max(), counts.iter().min()) {
            (Some(max), Some(min)) => max - min,
            _ => 0,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.unassigned == 0
    }
}

// ============================================================================
// Fair-Share Assigner
// ============================================================================

/// Stateless greedy least-loaded assigner
#[derive(Debug, Clone, Copy, Default)]
pub struct FairShareAssigner;

impl FairShareAssigner {
    pub fn new() -> Self {
        Self
    }

    /// Produce the baseline proposal for `slots`
    ///
    /// Running counts start at zero for every guide. The result depends only
    /// on the slots and the candidate lists.
    pub fn propose(&self, slots: &[PlannedSlot], candidates: &CandidateMap) -> AssignmentProposal {
        let mut proposal = AssignmentProposal::default();

        for slot in slots {
            let eligible = candidates.candidates(slot.date());

            let Some(chosen) = Self::least_loaded(eligible, &proposal.counts) else {
                proposal.unassigned += 1;
                tracing::debug!(slot = %slot.key, "No available guide for slot");
                continue;
            };

            *proposal.counts.entry(chosen.id.clone()).or_insert(0) += 1;
            proposal.assignments.insert(slot.key, chosen.clone());
        }

        tracing::debug!(
            slots = slots.len(),
            assigned = proposal.assignments.len(),
            unassigned = proposal.unassigned,
            "Baseline proposal computed"
        );

        proposal
    }

    /// Candidate with the lowest running count; ties by name, then id
    fn least_loaded<'a>(
        eligible: &'a [GuideSummary],
        counts: &HashMap<GuideId, usize>,
    ) -> Option<&'a GuideSummary> {
        let load = |g: &GuideSummary| counts.get(&g.id).copied().unwrap_or(0);

        eligible
            .iter()
            .min_by(|a, b| load(*a).cmp(&load(*b)).then_with(|| by_name(*a, *b)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::slots::{enumerate_slots, DateRange, SlotTimes};
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 11, d).unwrap()
    }

    fn guides(names: &[&str]) -> Vec<GuideSummary> {
        names
            .iter()
            .map(|n| GuideSummary::new(n.to_lowercase(), *n))
            .collect()
    }

    fn same_every_day(first: u32, last: u32, names: &[&str]) -> CandidateMap {
        CandidateMap::from_lists((first..=last).map(|d| (day(d), guides(names))))
    }

    #[test]
    fn test_cycles_alphabetically() {
        let range = DateRange::new(day(1), day(6)).unwrap();
        let slots = enumerate_slots(&range, false, &SlotTimes::default());
        let candidates = same_every_day(1, 5, &["Carol", "Alice", "Bob"]);

        let proposal = FairShareAssigner::new().propose(&slots, &candidates);

        let order: Vec<_> = slots
            .iter()
            .map(|s| proposal.guide_for(&s.key).unwrap().name.as_str())
            .collect();
        assert_eq!(order, vec!["Alice", "Bob", "Carol", "Alice", "Bob"]);
        assert_eq!(proposal.count_for(&"alice".into()), 2);
        assert_eq!(proposal.count_for(&"bob".into()), 2);
        assert_eq!(proposal.count_for(&"carol".into()), 1);
        assert!(proposal.is_complete());
    }

    #[test]
    fn test_single_candidate_always_assigned() {
        let range = DateRange::new(day(1), day(4)).unwrap();
        let slots = enumerate_slots(&range, true, &SlotTimes::default());
        let candidates = same_every_day(1, 3, &["Dana"]);

        let proposal = FairShareAssigner::new().propose(&slots, &candidates);
        assert_eq!(proposal.count_for(&"dana".into()), 6);
        assert_eq!(proposal.unassigned, 0);
    }

    #[test]
    fn test_empty_date_is_unassigned() {
        let range = DateRange::new(day(1), day(4)).unwrap();
        let slots = enumerate_slots(&range, false, &SlotTimes::default());
        let candidates =
            CandidateMap::from_lists([(day(1), guides(&["Alice"])), (day(3), guides(&["Bob"]))]);

        let proposal = FairShareAssigner::new().propose(&slots, &candidates);
        assert_eq!(proposal.unassigned, 1);
        assert_eq!(proposal.assignments.len(), 2);
        assert!(proposal.guide_for(&slots[1].key).is_none());
        assert!(!proposal.is_complete());
    }

    #[test]
    fn test_least_loaded_beats_name() {
        // Alice is alone on day 1, so Bob takes day 2 despite sorting later
        let range = DateRange::new(day(1), day(3)).unwrap();
        let slots = enumerate_slots(&range, false, &SlotTimes::default());
        let candidates = CandidateMap::from_lists([
            (day(1), guides(&["Alice"])),
            (day(2), guides(&["Alice", "Bob"])),
        ]);

        let proposal = FairShareAssigner::new().propose(&slots, &candidates);
        assert_eq!(proposal.guide_for(&slots[1].key).unwrap().name, "Bob");
    }

    #[test]
    fn test_equal_names_fall_back_to_id() {
        let candidates = CandidateMap::from_lists([(
            day(1),
            vec![GuideSummary::new("z-id", "Sam"), GuideSummary::new("a-id", "Sam")],
        )]);
        let range = DateRange::new(day(1), day(2)).unwrap();
        let slots = enumerate_slots(&range, false, &SlotTimes::default());

        let proposal = FairShareAssigner::new().propose(&slots, &candidates);
        assert_eq!(proposal.guide_for(&slots[0].key).unwrap().id.as_str(), "a-id");
    }

    #[test]
    fn test_spread() {
        let range = DateRange::new(day(1), day(8)).unwrap();
        let slots = enumerate_slots(&range, true, &SlotTimes::default());
        let candidates = same_every_day(1, 7, &["Alice", "Bob", "Carol"]);

        let proposal = FairShareAssigner::new().propose(&slots, &candidates);
        let ids = candidates.guide_ids();
        assert!(proposal.spread(&ids) <= 1);
    }
}
