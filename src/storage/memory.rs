//! In-memory roster store
//!
//! Used by the test suite and by the `memory` database backend. Any
//! operation can be made to fail on demand to exercise error paths.

use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Datelike, Months, NaiveDate};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    AdminDirectory, AvailabilitySource, GuideDirectory, HistorySource, PushTokenStore, SlotStore,
    StoreError, StoreResult,
};
use crate::models::{AvailabilityEntry, Guide, GuideId, HistoryRow, Slot, SlotRecord, SlotStatus};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Availability,
    Guides,
    History,
    Upsert,
    SlotLookup,
    SlotUpdate,
    PlannedSlots,
    PushTokens,
    Admins,
}

#[derive(Debug, Default)]
struct MemoryState {
    guides: BTreeMap<GuideId, Guide>,
    availability: Vec<AvailabilityEntry>,
    slots: Vec<Slot>,
    push_tokens: Vec<(String, String)>,
    admins: HashSet<String>,
}

/// Roster store kept entirely in process memory
#[derive(Debug, Default)]
pub struct MemoryRosterStore {
    state: RwLock<MemoryState>,
    failures: RwLock<HashSet<StoreOp>>,
    upsert_calls: AtomicUsize,
}

impl MemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small seeded roster for local runs: four guides available on most
    /// days of the month after `today`, and a `demo-admin` user
    pub fn demo(today: NaiveDate) -> Self {
        let guides = [
            Guide::new("a1f3c9d2-demo", "Alice", "Martin").with_user_id("user-alice"),
            Guide::new("b7e2a410-demo", "Bob", "Durand").with_user_id("user-bob"),
            Guide::new("c4d8f6e1-demo", "Carol", "Petit").with_user_id("user-carol"),
            Guide::new("d9b1e3a7-demo", "", "").with_user_id("user-dana"),
        ];

        let start = today
            .with_day(1)
            .map(|d| d + Months::new(1))
            .unwrap_or(today);
        let end = start + Months::new(1);

        let mut store = Self::new().with_admin("demo-admin");
        for (i, date) in start.iter_days().take_while(|d| *d < end).enumerate() {
            for (j, guide) in guides.iter().enumerate() {
                // Every guide skips one day in four, staggered
                if (i + j) % 4 != 0 {
                    store = store.with_availability(guide.id.clone(), date);
                }
            }
        }
        for guide in guides {
            if let Some(user) = guide.user_id.clone() {
                store = store.with_push_token(user.clone(), format!("ExponentPushToken[{user}]"));
            }
            store = store.with_guide(guide);
        }
        store
    }

    // ------------------------------------------------------------------------
    // Builder
    // ------------------------------------------------------------------------

    pub fn with_guide(mut self, guide: Guide) -> Self {
        self.state.get_mut().guides.insert(guide.id.clone(), guide);
        self
    }

    pub fn with_guides(mut self, guides: impl IntoIterator<Item = Guide>) -> Self {
        let state = self.state.get_mut();
        for guide in guides {
            state.guides.insert(guide.id.clone(), guide);
        }
        self
    }

    pub fn with_availability(mut self, guide: impl Into<GuideId>, date: NaiveDate) -> Self {
        self.state
            .get_mut()
            .availability
            .push(AvailabilityEntry::available(guide, date));
        self
    }

    /// Add a raw availability row, including unavailable ones
    pub fn with_availability_entry(mut self, entry: AvailabilityEntry) -> Self {
        self.state.get_mut().availability.push(entry);
        self
    }

    pub fn with_slot(mut self, slot: Slot) -> Self {
        self.state.get_mut().slots.push(slot);
        self
    }

    pub fn with_push_token(mut self, user_id: impl Into<String>, token: impl Into<String>) -> Self {
        self.state
            .get_mut()
            .push_tokens
            .push((user_id.into(), token.into()));
        self
    }

    pub fn with_admin(mut self, user_id: impl Into<String>) -> Self {
        self.state.get_mut().admins.insert(user_id.into());
        self
    }

    // ------------------------------------------------------------------------
    // Failure injection & inspection
    // ------------------------------------------------------------------------

    /// Make every subsequent call of `op` fail
    pub async fn fail_on(&self, op: StoreOp) {
        self.failures.write().await.insert(op);
    }

    pub async fn clear_failures(&self) {
        self.failures.write().await.clear();
    }

    /// All stored slots, ordered by date then time
    pub async fn slots(&self) -> Vec<Slot> {
        let mut slots = self.state.read().await.slots.clone();
        slots.sort_by_key(Slot::key);
        slots
    }

    /// Number of successful upsert calls so far
    pub fn upsert_calls(&self) -> usize {
        self.upsert_calls.load(Ordering::SeqCst)
    }

    async fn check(&self, op: StoreOp) -> StoreResult<()> {
        if self.failures.read().await.contains(&op) {
            return Err(StoreError::other(format!("injected failure on {op:?}")));
        }
        Ok(())
    }
}

#[async_trait]
impl AvailabilitySource for MemoryRosterStore {
    async fn available_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<AvailabilityEntry>> {
        self.check(StoreOp::Availability).await?;

        let state = self.state.read().await;
        Ok(state
            .availability
            .iter()
            .filter(|e| e.available && e.date >= start && e.date < end)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl GuideDirectory for MemoryRosterStore {
    async fn guides_by_ids(&self, ids: &[GuideId]) -> StoreResult<Vec<Guide>> {
        self.check(StoreOp::Guides).await?;

        let state = self.state.read().await;
        Ok(ids
            .iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|id| state.guides.get(id).cloned())
            .collect())
    }

    async fn all_guides(&self) -> StoreResult<Vec<Guide>> {
        self.check(StoreOp::Guides).await?;
        Ok(self.state.read().await.guides.values().cloned().collect())
    }
}

#[async_trait]
impl HistorySource for MemoryRosterStore {
    async fn history_for(
        &self,
        ids: &[GuideId],
        start: NaiveDate,
        end_inclusive: NaiveDate,
    ) -> StoreResult<Vec<HistoryRow>> {
        self.check(StoreOp::History).await?;

        let wanted: HashSet<&GuideId> = ids.iter().collect();
        let state = self.state.read().await;
        Ok(state
            .slots
            .iter()
            .filter(|s| s.date >= start && s.date <= end_inclusive)
            .filter_map(|s| {
                let guide = s.guide_id.as_ref()?;
                wanted.contains(guide).then(|| HistoryRow {
                    guide_id: guide.clone(),
                    date: s.date,
                })
            })
            .collect())
    }
}

#[async_trait]
impl SlotStore for MemoryRosterStore {
    async fn upsert_slots(&self, rows: &[SlotRecord]) -> StoreResult<usize> {
        self.check(StoreOp::Upsert).await?;

        let mut state = self.state.write().await;
        for row in rows {
            match state.slots.iter().position(|s| s.key() == row.key) {
                Some(idx) => {
                    let existing = &mut state.slots[idx];
                    existing.guide_id = Some(row.guide_id.clone());
                    existing.status = row.status.clone();
                }
                None => state.slots.push(Slot {
                    id: Uuid::new_v4(),
                    date: row.key.date,
                    time: row.key.time,
                    guide_id: Some(row.guide_id.clone()),
                    status: row.status.clone(),
                }),
            }
        }

        self.upsert_calls.fetch_add(1, Ordering::SeqCst);
        Ok(rows.len())
    }

    async fn slots_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Slot>> {
        self.check(StoreOp::SlotLookup).await?;

        let state = self.state.read().await;
        Ok(state
            .slots
            .iter()
            .filter(|s| ids.contains(&s.id))
            .cloned()
            .collect())
    }

    async fn update_slot_guide(&self, id: Uuid, guide: Option<&GuideId>) -> StoreResult<()> {
        self.check(StoreOp::SlotUpdate).await?;

        let mut state = self.state.write().await;
        let slot = state
            .slots
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "slot",
                id: id.to_string(),
            })?;
        slot.guide_id = guide.cloned();
        Ok(())
    }

    async fn planned_slots_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Slot>> {
        self.check(StoreOp::PlannedSlots).await?;

        let state = self.state.read().await;
        let mut slots: Vec<Slot> = state
            .slots
            .iter()
            .filter(|s| s.status == SlotStatus::Planned && s.date >= start && s.date < end)
            .cloned()
            .collect();
        slots.sort_by_key(Slot::key);
        Ok(slots)
    }
}

#[async_trait]
impl PushTokenStore for MemoryRosterStore {
    async fn tokens_for_users(&self, user_ids: &[String]) -> StoreResult<Vec<String>> {
        self.check(StoreOp::PushTokens).await?;

        let state = self.state.read().await;
        Ok(state
            .push_tokens
            .iter()
            .filter(|(user, _)| user_ids.contains(user))
            .map(|(_, token)| token.clone())
            .collect())
    }
}

#[async_trait]
impl AdminDirectory for MemoryRosterStore {
    async fn is_admin(&self, user_id: &str) -> StoreResult<bool> {
        self.check(StoreOp::Admins).await?;
        Ok(self.state.read().await.admins.contains(user_id))
    }
}
