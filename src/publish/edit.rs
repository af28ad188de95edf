//! Editing the current month's published schedule

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{PublishService, RequestContext};
use crate::error::{Error, Result};
use crate::models::{GuideId, GuideSummary, Slot};
use crate::notifications::{Notification, NotifyReport};
use crate::scheduler::{by_name, DateRange, SchedulerError};

/// Planned slots of the current month with the guides they can be given to
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentSchedule {
    pub start_date: chrono::NaiveDate,
    /// Exclusive
    pub end_date: chrono::NaiveDate,
    pub slots: Vec<Slot>,
    pub guides: Vec<GuideSummary>,
}

/// Reassign one slot; `None` clears its guide
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotUpdate {
    pub id: Uuid,
    #[serde(default, alias = "guideId")]
    pub guide_id: Option<GuideId>,
}

impl SlotUpdate {
    pub fn new(id: Uuid, guide_id: Option<&str>) -> Self {
        Self {
            id,
            guide_id: guide_id
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(GuideId::from),
        }
    }
}

/// Result of an edit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOutcome {
    /// Updates applied
    pub count: usize,
    /// Guides whose assignment changed
    pub changed_guides: Vec<GuideId>,
    pub notify: NotifyReport,
}

impl UpdateOutcome {
    pub fn notified_users(&self) -> usize {
        self.notify.users
    }

    pub fn tokens(&self) -> usize {
        self.notify.tokens
    }
}

impl PublishService {
    /// Planned slots of the current calendar month, plus every guide
    pub async fn current_schedule(&self, ctx: &RequestContext) -> Result<CurrentSchedule> {
        ctx.require_admin()?;

        let range = DateRange::current_month(ctx.today());
        let (slots, guides) = futures::try_join!(
            async {
                self.store
                    .planned_slots_between(range.start, range.end)
                    .await
                    .map_err(|e| Error::load("slots", e))
            },
            async {
                self.store
                    .all_guides()
                    .await
                    .map_err(|e| Error::load("guides", e))
            },
        )?;

        let mut guides: Vec<GuideSummary> = guides.iter().map(|g| g.summary()).collect();
        guides.sort_by(by_name);

        tracing::debug!(slots = slots.len(), guides = guides.len(), "Current schedule loaded");

        Ok(CurrentSchedule {
            start_date: range.start,
            end_date: range.end,
            slots,
            guides,
        })
    }

    /// Apply slot reassignments in order and notify the guides affected
    ///
    /// Updates are not transactional: the first failing update aborts, and
    /// the ones before it stay applied. Both the previous and the new guide
    /// of every changed slot are notified.
    pub async fn update_schedule(
        &self,
        ctx: &RequestContext,
        updates: &[SlotUpdate],
    ) -> Result<UpdateOutcome> {
        ctx.require_admin()?;

        if updates.is_empty() {
            return Err(SchedulerError::empty_batch("updates").into());
        }

        let ids: Vec<Uuid> = updates.iter().map(|u| u.id).collect();
        let before: HashMap<Uuid, Option<GuideId>> = self
            .store
            .slots_by_ids(&ids)
            .await
            .map_err(|e| Error::load("current slots", e))?
            .into_iter()
            .map(|s| (s.id, s.guide_id))
            .collect();

        let mut changed = BTreeSet::new();
        for update in updates {
            self.store
                .update_slot_guide(update.id, update.guide_id.as_ref())
                .await
                .map_err(|e| Error::write("update slots", e))?;

            let previous = before.get(&update.id).cloned().flatten();
            if previous != update.guide_id {
                changed.extend(previous);
                changed.extend(update.guide_id.clone());
            }
        }

        let changed_guides: Vec<GuideId> = changed.into_iter().collect();
        tracing::info!(
            updates = updates.len(),
            changed = changed_guides.len(),
            "Schedule updated"
        );

        let notify = if changed_guides.is_empty() {
            NotifyReport::default()
        } else {
            self.notifier
                .notify_guides(
                    self.store.as_ref(),
                    &changed_guides,
                    &Notification::schedule_updated(),
                )
                .await
        };

        Ok(UpdateOutcome {
            count: updates.len(),
            changed_guides,
            notify,
        })
    }
}
