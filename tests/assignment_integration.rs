//! Integration tests for the assignment pipeline
//!
//! These tests verify:
//! - Greedy fair-share assignment over whole batches
//! - Override precedence and rejection of unavailable guides
//! - The fairness bound for identical candidate lists

mod common;

use chrono::Duration;
use proptest::prelude::*;

use common::{morning_of, nov, summary};
use tour_roster::models::GuideId;
use tour_roster::scheduler::{
    enumerate_slots, reconcile, AssignmentSource, CandidateMap, DateRange, FairShareAssigner,
    Overrides, SlotTimes,
};

fn trio() -> Vec<tour_roster::models::GuideSummary> {
    vec![
        summary("c", "Carol"),
        summary("a", "Alice"),
        summary("b", "Bob"),
    ]
}

fn same_candidates(days: u32, guides: Vec<tour_roster::models::GuideSummary>) -> CandidateMap {
    CandidateMap::from_lists((1..=days).map(|d| (nov(d), guides.clone())))
}

// ============================================================================
// Baseline Scenarios
// ============================================================================

#[test]
fn test_three_guides_five_days_morning_only() {
    let range = DateRange::new(nov(1), nov(6)).unwrap();
    let slots = enumerate_slots(&range, false, &SlotTimes::default());
    let proposal = FairShareAssigner::new().propose(&slots, &same_candidates(5, trio()));

    let names: Vec<&str> = slots
        .iter()
        .map(|s| proposal.guide_for(&s.key).unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["Alice", "Bob", "Carol", "Alice", "Bob"]);

    assert_eq!(proposal.count_for(&"a".into()), 2);
    assert_eq!(proposal.count_for(&"b".into()), 2);
    assert_eq!(proposal.count_for(&"c".into()), 1);
    assert!(proposal.is_complete());
}

#[test]
fn test_afternoon_slots_follow_morning_slots() {
    let range = DateRange::new(nov(1), nov(3)).unwrap();
    let slots = enumerate_slots(&range, true, &SlotTimes::default());
    let candidates = same_candidates(2, vec![summary("a", "Alice"), summary("b", "Bob")]);
    let proposal = FairShareAssigner::new().propose(&slots, &candidates);

    let names: Vec<&str> = slots
        .iter()
        .map(|s| proposal.guide_for(&s.key).unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["Alice", "Bob", "Alice", "Bob"]);
}

#[test]
fn test_day_without_guides_is_unassigned() {
    let range = DateRange::new(nov(1), nov(4)).unwrap();
    let slots = enumerate_slots(&range, false, &SlotTimes::default());
    let candidates = CandidateMap::from_lists(vec![
        (nov(1), vec![summary("a", "Alice")]),
        (nov(3), vec![summary("a", "Alice")]),
    ]);

    let proposal = FairShareAssigner::new().propose(&slots, &candidates);
    assert_eq!(proposal.unassigned, 1);
    assert!(proposal.guide_for(&morning_of(nov(2))).is_none());
    assert_eq!(proposal.count_for(&"a".into()), 2);
}

#[test]
fn test_restricted_availability_shifts_load() {
    // Bob only works on the 1st; the others absorb the rest
    let range = DateRange::new(nov(1), nov(5)).unwrap();
    let slots = enumerate_slots(&range, false, &SlotTimes::default());
    let candidates = CandidateMap::from_lists(vec![
        (nov(1), vec![summary("a", "Alice"), summary("b", "Bob")]),
        (nov(2), vec![summary("a", "Alice"), summary("c", "Carol")]),
        (nov(3), vec![summary("a", "Alice"), summary("c", "Carol")]),
        (nov(4), vec![summary("a", "Alice"), summary("c", "Carol")]),
    ]);

    let proposal = FairShareAssigner::new().propose(&slots, &candidates);
    let names: Vec<&str> = slots
        .iter()
        .map(|s| proposal.guide_for(&s.key).unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["Alice", "Carol", "Alice", "Carol"]);
    assert_eq!(proposal.count_for(&"b".into()), 0);
}

#[test]
fn test_proposal_is_deterministic() {
    let range = DateRange::new(nov(1), nov(30)).unwrap();
    let slots = enumerate_slots(&range, true, &SlotTimes::default());
    let candidates = same_candidates(29, trio());

    let first = FairShareAssigner::new().propose(&slots, &candidates);
    for _ in 0..5 {
        assert_eq!(FairShareAssigner::new().propose(&slots, &candidates), first);
    }
}

// ============================================================================
// Overrides
// ============================================================================

#[test]
fn test_override_takes_precedence_and_counts_follow() {
    let range = DateRange::new(nov(1), nov(6)).unwrap();
    let slots = enumerate_slots(&range, false, &SlotTimes::default());
    let candidates = same_candidates(5, trio());
    let baseline = FairShareAssigner::new().propose(&slots, &candidates);

    let overrides = Overrides::new().with(morning_of(nov(2)), "c");
    let effective = reconcile(&slots, &candidates, &baseline, &overrides);

    let slot = &effective.slots[1];
    assert_eq!(slot.source, AssignmentSource::Override);
    assert_eq!(slot.guide.as_ref().unwrap().name, "Carol");
    assert_eq!(slot.baseline.as_ref().unwrap().name, "Bob");

    // Baseline slots are not re-run: the rest of the month stays as proposed
    assert_eq!(effective.count_for(&"a".into()), 2);
    assert_eq!(effective.count_for(&"b".into()), 1);
    assert_eq!(effective.count_for(&"c".into()), 2);
    assert_eq!(effective.applied_overrides, 1);
}

#[test]
fn test_override_for_unavailable_guide_is_ignored() {
    let range = DateRange::new(nov(1), nov(3)).unwrap();
    let slots = enumerate_slots(&range, false, &SlotTimes::default());
    let candidates = CandidateMap::from_lists(vec![
        (nov(1), vec![summary("a", "Alice")]),
        (nov(2), vec![summary("b", "Bob")]),
    ]);
    let baseline = FairShareAssigner::new().propose(&slots, &candidates);

    let overrides = Overrides::new()
        .with(morning_of(nov(2)), "a")
        .with(morning_of(nov(1)), "nobody");
    let effective = reconcile(&slots, &candidates, &baseline, &overrides);

    assert_eq!(effective.guide_for(&morning_of(nov(1))).unwrap().name, "Alice");
    assert_eq!(effective.guide_for(&morning_of(nov(2))).unwrap().name, "Bob");
    assert_eq!(effective.applied_overrides, 0);
    assert_eq!(effective.ignored_overrides.len(), 2);
    assert!(effective
        .slots
        .iter()
        .all(|s| s.source == AssignmentSource::Baseline));
}

#[test]
fn test_override_fills_nothing_on_empty_day() {
    let range = DateRange::new(nov(1), nov(2)).unwrap();
    let slots = enumerate_slots(&range, false, &SlotTimes::default());
    let candidates = CandidateMap::default();
    let baseline = FairShareAssigner::new().propose(&slots, &candidates);

    let overrides = Overrides::new().with(morning_of(nov(1)), "a");
    let effective = reconcile(&slots, &candidates, &baseline, &overrides);

    assert_eq!(effective.unassigned, 1);
    assert!(effective.records().is_empty());
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_identical_candidates_spread_at_most_one(
        guide_count in 1usize..8,
        days in 1i64..60,
        include_afternoon in any::<bool>(),
    ) {
        let guides: Vec<_> = (0..guide_count)
            .map(|i| summary(&format!("g{i}"), &format!("Guide {i:02}")))
            .collect();
        let start = nov(1);
        let end = start + Duration::days(days);
        let range = DateRange::new(start, end).unwrap();
        let candidates = CandidateMap::from_lists(range.dates().map(|d| (d, guides.clone())));

        let slots = enumerate_slots(&range, include_afternoon, &SlotTimes::default());
        let proposal = FairShareAssigner::new().propose(&slots, &candidates);

        let ids: Vec<GuideId> = guides.iter().map(|g| g.id.clone()).collect();
        prop_assert!(proposal.spread(&ids) <= 1);
        prop_assert!(proposal.is_complete());
        prop_assert_eq!(proposal.assignments.len(), slots.len());
    }

    #[test]
    fn prop_every_assignment_is_a_candidate(
        mask in proptest::collection::vec(0u8..8, 1..40),
    ) {
        let guides = [summary("a", "Alice"), summary("b", "Bob"), summary("c", "Carol")];
        let start = nov(1);
        let lists: Vec<_> = mask
            .iter()
            .enumerate()
            .map(|(i, bits)| {
                let day = start + Duration::days(i as i64);
                let available = guides
                    .iter()
                    .enumerate()
                    .filter(|(g, _)| bits & (1 << g) != 0)
                    .map(|(_, s)| s.clone())
                    .collect::<Vec<_>>();
                (day, available)
            })
            .collect();
        let candidates = CandidateMap::from_lists(lists);
        let range = DateRange::new(start, start + Duration::days(mask.len() as i64)).unwrap();
        let slots = enumerate_slots(&range, false, &SlotTimes::default());

        let proposal = FairShareAssigner::new().propose(&slots, &candidates);
        let empty_days = mask.iter().filter(|bits| **bits == 0).count();

        prop_assert_eq!(proposal.unassigned, empty_days);
        for (key, guide) in &proposal.assignments {
            prop_assert!(candidates.is_candidate(key.date, &guide.id));
        }
    }
}
