//! Slot enumeration and calendar windows
//!
//! Expands a date range into the concrete (date, time) slots to fill, and
//! computes the publishing, current-month and history windows relative to a
//! given day.

use chrono::{Datelike, Months, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::error::{SchedulerError, SchedulerResult};
use crate::models::{SlotKey, SlotTime};

// ============================================================================
// Slot Times
// ============================================================================

/// Clock times of the daily tours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotTimes {
    pub morning: NaiveTime,
    pub afternoon: NaiveTime,
}

impl Default for SlotTimes {
    fn default() -> Self {
        Self {
            morning: NaiveTime::from_hms_opt(10, 30, 0).unwrap_or_default(),
            afternoon: NaiveTime::from_hms_opt(14, 0, 0).unwrap_or_default(),
        }
    }
}

impl SlotTimes {
    /// Clock time for a time-of-day
    pub fn time_of(&self, slot: SlotTime) -> NaiveTime {
        match slot {
            SlotTime::Morning => self.morning,
            SlotTime::Afternoon => self.afternoon,
        }
    }

    /// Map a clock time back to its time-of-day, if it is one of ours
    pub fn classify(&self, time: NaiveTime) -> Option<SlotTime> {
        if time == self.morning {
            Some(SlotTime::Morning)
        } else if time == self.afternoon {
            Some(SlotTime::Afternoon)
        } else {
            None
        }
    }

    /// Validate the configured times
    pub fn validate(&self) -> Result<(), String> {
        if self.morning >= self.afternoon {
            return Err(format!(
                "morning slot ({}) must be earlier than afternoon slot ({})",
                self.morning, self.afternoon
            ));
        }
        Ok(())
    }
}

/// One slot to fill in a publishing batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedSlot {
    pub key: SlotKey,
    pub time_of_day: SlotTime,
}

impl PlannedSlot {
    pub fn date(&self) -> NaiveDate {
        self.key.date
    }
}

// ============================================================================
// Date Range
// ============================================================================

/// Half-open date range `[start, end)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// Create a range, rejecting an end before the start
    pub fn new(start: NaiveDate, end: NaiveDate) -> SchedulerResult<Self> {
        if end < start {
            return Err(SchedulerError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// The calendar month following the one containing `today`
    pub fn next_month(today: NaiveDate) -> Self {
        let this_month = first_of_month(today);
        let start = this_month + Months::new(1);
        Self {
            start,
            end: start + Months::new(1),
        }
    }

    /// The calendar month containing `today`
    pub fn current_month(today: NaiveDate) -> Self {
        let start = first_of_month(today);
        Self {
            start,
            end: start + Months::new(1),
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    /// Every date in the range, in order
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d < end)
    }

    pub fn len_days(&self) -> usize {
        (self.end - self.start).num_days().max(0) as usize
    }
}

/// Inclusive history window ending at `today`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryWindow {
    pub start: NaiveDate,
    pub end_inclusive: NaiveDate,
}

impl HistoryWindow {
    /// `months` calendar months back from `today`, through `today`
    ///
    /// Day-of-month overflow clamps to the end of the target month.
    pub fn trailing(today: NaiveDate, months: u32) -> Self {
        let start = today
            .checked_sub_months(Months::new(months))
            .unwrap_or(NaiveDate::MIN);
        Self {
            start,
            end_inclusive: today,
        }
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

// ============================================================================
// Enumeration
// ============================================================================

/// Expand a date range into its slots
///
/// One morning slot per date, plus an afternoon slot when
/// `include_afternoon` is set. Output is chronological.
pub fn enumerate_slots(
    range: &DateRange,
    include_afternoon: bool,
    times: &SlotTimes,
) -> Vec<PlannedSlot> {
    let per_day = if include_afternoon { 2 } else { 1 };
    let mut slots = Vec::with_capacity(range.len_days() * per_day);

    for date in range.dates() {
        slots.push(PlannedSlot {
            key: SlotKey::new(date, times.morning),
            time_of_day: SlotTime::Morning,
        });
        if include_afternoon {
            slots.push(PlannedSlot {
                key: SlotKey::new(date, times.afternoon),
                time_of_day: SlotTime::Afternoon,
            });
        }
    }

    slots
}
