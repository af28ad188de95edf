//! Availability and history aggregation
//!
//! Turns raw availability, guide and history rows into the per-date
//! candidate lists and the per-guide trailing tour counts used by the
//! assignment engine.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{AvailabilityEntry, Guide, GuideId, GuideSummary, HistoryRow};

/// Ordering used wherever guides are listed or tie-broken: name, then id
pub fn by_name(a: &GuideSummary, b: &GuideSummary) -> Ordering {
    a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id))
}

/// Candidate guides per date, each list sorted by display name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CandidateMap {
    by_date: BTreeMap<NaiveDate, Vec<GuideSummary>>,
}

impl CandidateMap {
    /// Build from availability rows and the guide rows they reference
    ///
    /// Rows not marked available are skipped. A guide is listed at most once
    /// per date. Guides missing from `guides` get their placeholder name.
    pub fn build(rows: &[AvailabilityEntry], guides: &[Guide]) -> Self {
        let guide_by_id: HashMap<&GuideId, &Guide> = guides.iter().map(|g| (&g.id, g)).collect();
        let mut by_date: BTreeMap<NaiveDate, Vec<GuideSummary>> = BTreeMap::new();

        for row in rows.iter().filter(|r| r.available) {
            let summary = match guide_by_id.get(&row.guide_id) {
                Some(guide) => guide.summary(),
                None => GuideSummary::new(row.guide_id.clone(), row.guide_id.placeholder_name()),
            };

            let list = by_date.entry(row.date).or_default();
            if !list.iter().any(|g| g.id == summary.id) {
                list.push(summary);
            }
        }

        for list in by_date.values_mut() {
            list.sort_by(by_name);
        }

        Self { by_date }
    }

    /// Build directly from already-resolved lists (sorted on the way in)
    pub fn from_lists(lists: impl IntoIterator<Item = (NaiveDate, Vec<GuideSummary>)>) -> Self {
        let mut by_date = BTreeMap::new();
        for (date, mut guides) in lists {
            guides.sort_by(by_name);
            guides.dedup_by(|a, b| a.id == b.id);
            by_date.insert(date, guides);
        }
        Self { by_date }
    }

    /// Candidates for a date; empty when nobody is available
    pub fn candidates(&self, date: NaiveDate) -> &[GuideSummary] {
        self.by_date.get(&date).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether `guide` is a candidate on `date`
    pub fn is_candidate(&self, date: NaiveDate, guide: &GuideId) -> bool {
        self.candidates(date).iter().any(|g| &g.id == guide)
    }

    /// Dates with at least one candidate, chronologically
    pub fn iter(&self) -> impl Iterator<Item = (&NaiveDate, &Vec<GuideSummary>)> {
        self.by_date.iter()
    }

    /// Every distinct guide appearing on any date, sorted by name
    pub fn all_guides(&self) -> Vec<GuideSummary> {
        let mut seen: HashMap<&GuideId, &GuideSummary> = HashMap::new();
        for guide in self.by_date.values().flatten() {
            seen.entry(&guide.id).or_insert(guide);
        }
        let mut all: Vec<GuideSummary> = seen.into_values().cloned().collect();
        all.sort_by(by_name);
        all
    }

    /// Distinct guide ids referenced by the map
    pub fn guide_ids(&self) -> Vec<GuideId> {
        self.all_guides().into_iter().map(|g| g.id).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}

/// Trailing assignment count per guide; informational only
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HistoryCounts(HashMap<GuideId, usize>);

impl HistoryCounts {
    /// Count one per history row
    pub fn from_rows(rows: &[HistoryRow]) -> Self {
        let mut counts = HashMap::new();
        for row in rows {
            *counts.entry(row.guide_id.clone()).or_insert(0) += 1;
        }
        Self(counts)
    }

    /// Count for a guide, zero when absent
    pub fn get(&self, guide: &GuideId) -> usize {
        self.0.get(guide).copied().unwrap_or(0)
    }

    pub fn as_map(&self) -> &HashMap<GuideId, usize> {
        &self.0
    }
}
