//! Committing a roster batch

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{Preview, PublishService, RequestContext};
use crate::config::parse_clock_time;
use crate::error::{Error, Result};
use crate::models::{GuideId, SlotKey, SlotRecord};
use crate::notifications::{month_label, Notification, NotifyReport};
use crate::scheduler::{EffectiveAssignment, SchedulerError};

/// One submitted row of a publish request
///
/// Fields are optional on the wire so a malformed row is reported by
/// position instead of failing the whole body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRow {
    #[serde(default, alias = "slot_date")]
    pub date: Option<String>,
    #[serde(default, alias = "slot_time")]
    pub time: Option<String>,
    #[serde(default, alias = "guideId")]
    pub guide_id: Option<String>,
}

impl CommitRow {
    pub fn new(date: NaiveDate, time: &str, guide_id: Option<&str>) -> Self {
        Self {
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            guide_id: guide_id.map(str::to_string),
        }
    }

    /// Parse into a slot key and, when present and non-blank, a guide
    pub(crate) fn parse(&self, index: usize) -> Result<(SlotKey, Option<GuideId>)> {
        let date = self
            .date
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SchedulerError::invalid_slot(index, "missing date"))?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| SchedulerError::invalid_slot(index, format!("bad date '{date}'")))?;

        let time = self
            .time
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| SchedulerError::invalid_slot(index, "missing time"))?;
        let time = parse_clock_time(time)
            .ok_or_else(|| SchedulerError::invalid_slot(index, format!("bad time '{time}'")))?;

        let guide = self
            .guide_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(GuideId::from);

        Ok((SlotKey::new(date, time), guide))
    }
}

/// Result of a successful commit
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishOutcome {
    /// Rows written
    pub count: usize,
    /// Label of the published month, e.g. "November 2026"
    pub month: String,
    /// Distinct guides in the batch
    pub guides: usize,
    pub notify: NotifyReport,
}

impl PublishService {
    /// Publish a previewed roster
    pub async fn publish(&self, ctx: &RequestContext, preview: &Preview) -> Result<PublishOutcome> {
        self.publish_assignment(ctx, &preview.effective).await
    }

    /// Publish an effective assignment; every slot must have a guide
    pub async fn publish_assignment(
        &self,
        ctx: &RequestContext,
        effective: &EffectiveAssignment,
    ) -> Result<PublishOutcome> {
        ctx.require_admin()?;

        if effective.slots.is_empty() {
            return Err(SchedulerError::empty_batch("slots").into());
        }
        if !effective.is_complete() {
            return Err(SchedulerError::unassigned(effective.unassigned).into());
        }

        self.write_batch(effective.records()).await
    }

    /// Publish rows submitted by a client
    ///
    /// Rows repeating a (date, time) keep the last guide given. The whole
    /// batch is rejected before any write when it is empty, when a row is
    /// malformed, when a slot ends up without a guide or when a guide is
    /// unknown to the directory.
    pub async fn commit_slots(&self, ctx: &RequestContext, rows: &[CommitRow]) -> Result<PublishOutcome> {
        ctx.require_admin()?;

        if rows.is_empty() {
            return Err(SchedulerError::empty_batch("slots").into());
        }

        let mut by_key: BTreeMap<SlotKey, (usize, Option<GuideId>)> = BTreeMap::new();
        for (i, row) in rows.iter().enumerate() {
            let (key, guide) = row.parse(i)?;
            by_key.insert(key, (i, guide));
        }

        let unassigned = by_key.values().filter(|(_, g)| g.is_none()).count();
        if unassigned > 0 {
            return Err(SchedulerError::unassigned(unassigned).into());
        }

        let records: Vec<(usize, SlotRecord)> = by_key
            .into_iter()
            .filter_map(|(key, (i, guide))| guide.map(|g| (i, SlotRecord::planned(key, g))))
            .collect();
        self.check_guides_known(&records).await?;

        self.write_batch(records.into_iter().map(|(_, r)| r).collect())
            .await
    }

    /// Every guide in `records` must exist in the directory
    async fn check_guides_known(&self, records: &[(usize, SlotRecord)]) -> Result<()> {
        let ids: Vec<GuideId> = records
            .iter()
            .map(|(_, r)| r.guide_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let known: BTreeSet<GuideId> = self
            .store
            .guides_by_ids(&ids)
            .await
            .map_err(|e| Error::load("guides", e))?
            .into_iter()
            .map(|g| g.id)
            .collect();

        match records.iter().find(|(_, r)| !known.contains(&r.guide_id)) {
            Some((i, r)) => {
                tracing::warn!(guide = %r.guide_id, position = i, "Commit names an unknown guide");
                Err(SchedulerError::invalid_slot(*i, format!("unknown guide '{}'", r.guide_id)).into())
            }
            None => Ok(()),
        }
    }

    /// Upsert `records` (sorted, non-empty, unique keys), then notify
    async fn write_batch(&self, records: Vec<SlotRecord>) -> Result<PublishOutcome> {
        let count = self
            .store
            .upsert_slots(&records)
            .await
            .map_err(|e| Error::write("publish", e))?;

        let month = records
            .iter()
            .map(|r| r.key.date)
            .min()
            .map(month_label)
            .unwrap_or_default();
        let guides: Vec<GuideId> = records
            .iter()
            .map(|r| r.guide_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        tracing::info!(count, month = %month, guides = guides.len(), "Roster published");

        let notification = Notification::tours_published(&month, count);
        let notify = self
            .notifier
            .notify_guides(self.store.as_ref(), &guides, &notification)
            .await;

        Ok(PublishOutcome {
            count,
            month,
            guides: guides.len(),
            notify,
        })
    }
}
