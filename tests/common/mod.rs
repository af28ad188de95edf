//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tokio::sync::Mutex;

use tour_roster::models::{Guide, GuideSummary, SlotKey};
use tour_roster::notifications::channels::{ChannelError, ChannelResult};
use tour_roster::notifications::{DeliveryStatus, Notifier, PushChannel, PushMessage};
use tour_roster::publish::{PublishService, RequestContext};
use tour_roster::storage::MemoryRosterStore;

/// Planning day used across tests: rosters are built for November 2026
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()
}

pub fn nov(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 11, day).unwrap()
}

pub fn morning() -> NaiveTime {
    NaiveTime::from_hms_opt(10, 30, 0).unwrap()
}

pub fn afternoon() -> NaiveTime {
    NaiveTime::from_hms_opt(14, 0, 0).unwrap()
}

pub fn morning_of(date: NaiveDate) -> SlotKey {
    SlotKey::new(date, morning())
}

pub fn admin() -> RequestContext {
    RequestContext::cli(today())
}

pub fn summary(id: &str, name: &str) -> GuideSummary {
    GuideSummary::new(id, name)
}

/// Alice, Bob and Carol with linked accounts and one Expo token each
pub fn trio_store() -> MemoryRosterStore {
    MemoryRosterStore::new()
        .with_guide(Guide::new("alice", "Alice", "Martin").with_user_id("user-alice"))
        .with_guide(Guide::new("bob", "Bob", "Durand").with_user_id("user-bob"))
        .with_guide(Guide::new("carol", "Carol", "Petit").with_user_id("user-carol"))
        .with_push_token("user-alice", "ExponentPushToken[alice]")
        .with_push_token("user-bob", "ExponentPushToken[bob]")
        .with_push_token("user-carol", "ExpoPushToken[carol]")
        .with_admin("admin-1")
}

/// All three guides available on every day of November
pub fn trio_available_all_month() -> MemoryRosterStore {
    let mut store = trio_store();
    for day in 1..=30 {
        for id in ["alice", "bob", "carol"] {
            store = store.with_availability(id, nov(day));
        }
    }
    store
}

/// Channel recording every batch it is handed
#[derive(Default)]
pub struct RecordingChannel {
    pub batches: Mutex<Vec<Vec<PushMessage>>>,
    pub fail: bool,
}

impl RecordingChannel {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// Every recipient token, in send order
    pub async fn recipients(&self) -> Vec<String> {
        self.batches
            .lock()
            .await
            .iter()
            .flatten()
            .map(|m| m.to.clone())
            .collect()
    }
}

#[async_trait]
impl PushChannel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send_batch(&self, messages: &[PushMessage]) -> ChannelResult<DeliveryStatus> {
        self.batches.lock().await.push(messages.to_vec());
        if self.fail {
            return Err(ChannelError::Other("gateway unavailable".to_string()));
        }
        Ok(DeliveryStatus::success("recording", messages.len()))
    }
}

/// Service over `store` notifying through a recording channel
pub fn service_with(
    store: MemoryRosterStore,
    channel: RecordingChannel,
) -> (Arc<MemoryRosterStore>, Arc<RecordingChannel>, PublishService) {
    let store = Arc::new(store);
    let channel = Arc::new(channel);
    let notifier = Notifier::new(channel.clone(), 100);
    let service = PublishService::new(store.clone(), notifier);
    (store, channel, service)
}
