//! Push notifications to guides
//!
//! Resolves guides to their linked accounts, accounts to registered Expo
//! push tokens, and hands the resulting messages to a [`PushChannel`] in
//! bounded batches.
//!
//! # Architecture
//!
//! ```text
//! guide ids ─► GuideDirectory ─► user ids ─► PushTokenStore ─► tokens
//!                                                                │
//!                                                   Expo-format filter
//!                                                                │
//!                                          ┌─────────────────────▼───┐
//!                                          │ Notifier (≤100 / batch) │
//!                                          └─────────────┬───────────┘
//!                                                        ▼
//!                                             ┌─────────────────────┐
//!                                             │ ExpoChannel / Log   │
//!                                             └─────────────────────┘
//! ```
//!
//! Delivery is best effort. Every failure after the triggering write has
//! succeeded is logged and reported in the [`NotifyReport`], never returned
//! as an error.

pub mod channels;

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::GuideId;
use crate::storage::{GuideDirectory, PushTokenStore};

pub use channels::{ChannelError, DeliveryStatus, ExpoChannel, ExpoConfig, LogChannel, PushChannel};

/// Largest batch the Expo gateway accepts
pub const MAX_BATCH_SIZE: usize = 100;

/// Token prefixes issued by Expo
const EXPO_TOKEN_PREFIXES: [&str; 2] = ["ExponentPushToken[", "ExpoPushToken["];

/// Whether a raw token looks like an Expo push token
pub fn is_expo_token(token: &str) -> bool {
    EXPO_TOKEN_PREFIXES.iter().any(|p| token.starts_with(p))
}

/// "November 2026"
pub fn month_label(date: NaiveDate) -> String {
    date.format("%B %Y").to_string()
}

// ============================================================================
// Messages
// ============================================================================

/// Content of a notification, independent of recipients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl Notification {
    /// Sent to the guides of a freshly published batch
    pub fn tours_published(month: &str, count: usize) -> Self {
        let when = if month.is_empty() {
            String::new()
        } else {
            format!(" for {month}")
        };
        Self {
            title: "New tours published".to_string(),
            body: format!(
                "New tours published{when}. You can consult your affected tour on the app."
            ),
            data: serde_json::json!({
                "type": "new_tours_published",
                "month": month,
                "count": count,
            }),
        }
    }

    /// Sent to guides whose assignment changed in an edit
    pub fn schedule_updated() -> Self {
        Self {
            title: "Schedule updated".to_string(),
            body: "Your schedule has been updated, please consult the app.".to_string(),
            data: serde_json::json!({ "type": "schedule_updated" }),
        }
    }
}

/// One addressed message in the gateway's wire format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub to: String,
    pub sound: String,
    pub title: String,
    pub body: String,
    pub data: serde_json::Value,
}

impl PushMessage {
    pub fn new(to: impl Into<String>, notification: &Notification) -> Self {
        Self {
            to: to.into(),
            sound: "default".to_string(),
            title: notification.title.clone(),
            body: notification.body.clone(),
            data: notification.data.clone(),
        }
    }
}

// ============================================================================
// Notifier
// ============================================================================

/// What a notification round did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyReport {
    /// Distinct linked accounts found for the guides
    pub users: usize,
    /// Expo tokens messages were addressed to
    pub tokens: usize,
    /// Batches handed to the channel
    pub batches: usize,
    /// Batches the channel failed to deliver
    pub failed_batches: usize,
    /// Lookup failure that ended the round early
    pub error: Option<String>,
}

/// Best-effort fan-out of one notification to a set of guides
#[derive(Clone)]
pub struct Notifier {
    channel: Arc<dyn PushChannel>,
    batch_size: usize,
}

impl Notifier {
    /// Create a notifier; `batch_size` is clamped to `1..=100`
    pub fn new(channel: Arc<dyn PushChannel>, batch_size: usize) -> Self {
        Self {
            channel,
            batch_size: batch_size.clamp(1, MAX_BATCH_SIZE),
        }
    }

    /// Notifier that only logs
    pub fn disabled() -> Self {
        Self::new(Arc::new(LogChannel), MAX_BATCH_SIZE)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn channel_name(&self) -> &str {
        self.channel.name()
    }

    /// Notify `guides`, swallowing every failure
    pub async fn notify_guides<S>(
        &self,
        store: &S,
        guides: &[GuideId],
        notification: &Notification,
    ) -> NotifyReport
    where
        S: GuideDirectory + PushTokenStore + ?Sized,
    {
        let mut report = NotifyReport::default();
        if guides.is_empty() {
            return report;
        }

        let user_ids = match store.guides_by_ids(guides).await {
            Ok(rows) => rows
                .into_iter()
                .filter_map(|g| g.user_id)
                .filter(|u| !u.trim().is_empty())
                .collect::<BTreeSet<_>>()
                .into_iter()
                .collect::<Vec<_>>(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load guides for notification");
                report.error = Some(format!("Failed to load guides: {e}"));
                return report;
            }
        };

        report.users = user_ids.len();
        if user_ids.is_empty() {
            tracing::debug!(guides = guides.len(), "No linked accounts to notify");
            return report;
        }

        let tokens = match store.tokens_for_users(&user_ids).await {
            Ok(raw) => {
                let mut seen = BTreeSet::new();
                raw.into_iter()
                    .filter(|t| is_expo_token(t))
                    .filter(|t| seen.insert(t.clone()))
                    .collect::<Vec<_>>()
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load push tokens");
                report.error = Some(format!("Failed to load push tokens: {e}"));
                return report;
            }
        };

        report.tokens = tokens.len();
        self.dispatch(&tokens, notification, &mut report).await;

        tracing::info!(
            users = report.users,
            tokens = report.tokens,
            batches = report.batches,
            failed = report.failed_batches,
            channel = self.channel.name(),
            "Notification round finished"
        );
        report
    }

    /// Send `notification` to raw tokens in batches
    async fn dispatch(&self, tokens: &[String], notification: &Notification, report: &mut NotifyReport) {
        let messages: Vec<PushMessage> = tokens
            .iter()
            .map(|t| PushMessage::new(t.as_str(), notification))
            .collect();

        for batch in messages.chunks(self.batch_size) {
            report.batches += 1;
            match self.channel.send_batch(batch).await {
                Ok(status) if status.success => {
                    tracing::debug!(%status, "Push batch accepted");
                }
                Ok(status) => {
                    report.failed_batches += 1;
                    tracing::warn!(%status, "Push batch not delivered");
                }
                Err(e) => {
                    report.failed_batches += 1;
                    tracing::warn!(error = %e, messages = batch.len(), "Push batch failed");
                }
            }
        }
    }
}
