//! Integration tests for the publish and edit flows
//!
//! These tests run the full service against the in-memory store:
//! - Preview, commit and re-commit of a month
//! - Precondition failures leave the store untouched
//! - Notification failures never fail a commit
//! - Edits notify only the guides whose assignment changed

mod common;

use std::collections::BTreeSet;

use common::{
    admin, morning, morning_of, nov, service_with, today, trio_available_all_month, trio_store,
    RecordingChannel,
};
use tour_roster::error::ErrorCategory;
use tour_roster::models::{GuideId, SlotStatus};
use tour_roster::publish::{CommitRow, Principal, RequestContext, SlotUpdate};
use tour_roster::scheduler::Overrides;
use tour_roster::storage::memory::StoreOp;

// ============================================================================
// Preview & Commit
// ============================================================================

#[tokio::test]
async fn test_preview_then_publish_full_month() {
    let (store, channel, service) =
        service_with(trio_available_all_month(), RecordingChannel::default());

    let preview = service.preview(&admin(), false, &Overrides::new()).await.unwrap();
    assert_eq!(preview.slots.len(), 30);
    assert!(preview.is_publishable());
    assert_eq!(preview.loads.len(), 3);
    assert!(preview.loads.iter().all(|l| l.assigned == 10));

    let outcome = service.publish(&admin(), &preview).await.unwrap();
    assert_eq!(outcome.count, 30);
    assert_eq!(outcome.month, "November 2026");
    assert_eq!(outcome.guides, 3);
    assert_eq!(outcome.notify.users, 3);
    assert_eq!(outcome.notify.tokens, 3);

    let slots = store.slots().await;
    assert_eq!(slots.len(), 30);
    assert!(slots.iter().all(|s| s.status == SlotStatus::Planned));

    let batches = channel.batches.lock().await;
    assert_eq!(batches.len(), 1);
    let message = &batches[0][0];
    assert_eq!(message.title, "New tours published");
    assert_eq!(
        message.body,
        "New tours published for November 2026. You can consult your affected tour on the app."
    );
    assert_eq!(message.data["count"], 30);
}

#[tokio::test]
async fn test_republish_is_idempotent_with_same_recipients() {
    let (store, channel, service) =
        service_with(trio_available_all_month(), RecordingChannel::default());
    let rows = vec![
        CommitRow::new(nov(1), "10:30", Some("alice")),
        CommitRow::new(nov(2), "10:30:00", Some("bob")),
        CommitRow::new(nov(2), "14:00", Some("carol")),
    ];

    let first = service.commit_slots(&admin(), &rows).await.unwrap();
    let first_recipients: BTreeSet<String> = channel.recipients().await.into_iter().collect();
    channel.batches.lock().await.clear();

    let second = service.commit_slots(&admin(), &rows).await.unwrap();
    let second_recipients: BTreeSet<String> = channel.recipients().await.into_iter().collect();

    assert_eq!(first.count, 3);
    assert_eq!(second.count, 3);
    assert_eq!(store.slots().await.len(), 3);
    assert_eq!(first_recipients, second_recipients);
    assert_eq!(store.upsert_calls(), 2);
}

#[tokio::test]
async fn test_republish_with_new_guide_updates_in_place() {
    let (store, _, service) = service_with(trio_store(), RecordingChannel::default());

    service
        .commit_slots(&admin(), &[CommitRow::new(nov(5), "10:30", Some("alice"))])
        .await
        .unwrap();
    let before = store.slots().await;

    service
        .commit_slots(&admin(), &[CommitRow::new(nov(5), "10:30", Some("bob"))])
        .await
        .unwrap();
    let after = store.slots().await;

    assert_eq!(after.len(), 1);
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].guide_id, Some(GuideId::from("bob")));
}

#[tokio::test]
async fn test_unassigned_day_blocks_publish_without_writes() {
    // Nobody is available on the 2nd
    let store = trio_store()
        .with_availability("alice", nov(1))
        .with_availability("bob", nov(3));
    let (store, channel, service) = service_with(store, RecordingChannel::default());

    let preview = service.preview(&admin(), false, &Overrides::new()).await.unwrap();
    assert_eq!(preview.effective.unassigned, 28);
    assert!(!preview.is_publishable());

    let err = service.publish(&admin(), &preview).await.unwrap_err();
    assert_eq!(err.to_string(), "Cannot publish: 28 unassigned slots");
    assert_eq!(err.category(), ErrorCategory::Scheduler);

    let err = service
        .commit_slots(
            &admin(),
            &[
                CommitRow::new(nov(1), "10:30", Some("alice")),
                CommitRow::new(nov(2), "10:30", None),
            ],
        )
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Cannot publish: 1 unassigned slots");

    assert_eq!(store.upsert_calls(), 0);
    assert!(store.slots().await.is_empty());
    assert!(channel.batches.lock().await.is_empty());
}

#[tokio::test]
async fn test_notification_failure_does_not_fail_commit() {
    let (store, channel, service) =
        service_with(trio_available_all_month(), RecordingChannel::failing());

    let outcome = service
        .commit_slots(&admin(), &[CommitRow::new(nov(1), "10:30", Some("alice"))])
        .await
        .unwrap();

    assert_eq!(outcome.count, 1);
    assert_eq!(outcome.notify.failed_batches, 1);
    assert_eq!(store.slots().await.len(), 1);
    assert_eq!(channel.batches.lock().await.len(), 1);
}

#[tokio::test]
async fn test_token_lookup_failure_does_not_fail_commit() {
    let (store, channel, service) =
        service_with(trio_available_all_month(), RecordingChannel::default());
    store.fail_on(StoreOp::PushTokens).await;

    let outcome = service
        .commit_slots(&admin(), &[CommitRow::new(nov(1), "10:30", Some("alice"))])
        .await
        .unwrap();

    assert_eq!(outcome.count, 1);
    assert!(outcome.notify.error.is_some());
    assert!(channel.batches.lock().await.is_empty());
}

#[tokio::test]
async fn test_upstream_failure_names_the_source() {
    let (store, _, service) = service_with(trio_available_all_month(), RecordingChannel::default());
    store.fail_on(StoreOp::Availability).await;

    let err = service
        .preview(&admin(), false, &Overrides::new())
        .await
        .unwrap_err();
    assert!(err.to_string().starts_with("Failed to load availability:"));
    assert_eq!(err.http_status(), 500);
}

#[tokio::test]
async fn test_non_admin_cannot_commit() {
    let (store, _, service) = service_with(trio_store(), RecordingChannel::default());
    let ctx = RequestContext::new(Principal::User("user-alice".into()), false, today());

    let err = service
        .commit_slots(&ctx, &[CommitRow::new(nov(1), "10:30", Some("alice"))])
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Not authorized.");
    assert_eq!(err.http_status(), 403);
    assert_eq!(store.upsert_calls(), 0);
}

// ============================================================================
// Edit Schedule
// ============================================================================

#[tokio::test]
async fn test_edit_notifies_only_changed_guides() {
    let (_, channel, service) = service_with(trio_store(), RecordingChannel::default());

    // Publish three October slots so they fall in the current month
    let october = |d| chrono::NaiveDate::from_ymd_opt(2026, 10, d).unwrap();
    service
        .commit_slots(
            &admin(),
            &[
                CommitRow::new(october(20), "10:30", Some("alice")),
                CommitRow::new(october(21), "10:30", Some("bob")),
                CommitRow::new(october(22), "10:30", Some("bob")),
            ],
        )
        .await
        .unwrap();
    channel.batches.lock().await.clear();

    let current = service.current_schedule(&admin()).await.unwrap();
    assert_eq!(current.slots.len(), 3);
    assert_eq!(current.guides.len(), 3);
    let id_of = |day: u32| {
        current
            .slots
            .iter()
            .find(|s| s.key() == tour_roster::SlotKey::new(october(day), morning()))
            .unwrap()
            .id
    };

    // 20th: alice -> carol (changed), 21st: bob -> bob (unchanged)
    let outcome = service
        .update_schedule(
            &admin(),
            &[
                SlotUpdate::new(id_of(20), Some("carol")),
                SlotUpdate::new(id_of(21), Some("bob")),
            ],
        )
        .await
        .unwrap();

    assert_eq!(outcome.count, 2);
    assert_eq!(
        outcome.changed_guides,
        vec![GuideId::from("alice"), GuideId::from("carol")]
    );
    assert_eq!(outcome.notified_users(), 2);
    assert_eq!(outcome.tokens(), 2);

    let recipients: BTreeSet<String> = channel.recipients().await.into_iter().collect();
    assert!(recipients.contains("ExponentPushToken[alice]"));
    assert!(recipients.contains("ExpoPushToken[carol]"));
    assert!(!recipients.contains("ExponentPushToken[bob]"));

    let batches = channel.batches.lock().await;
    assert_eq!(batches[0][0].title, "Schedule updated");
}

#[tokio::test]
async fn test_edit_clearing_a_slot_notifies_previous_guide() {
    let (store, channel, service) = service_with(trio_store(), RecordingChannel::default());
    service
        .commit_slots(
            &admin(),
            &[CommitRow::new(
                chrono::NaiveDate::from_ymd_opt(2026, 10, 28).unwrap(),
                "10:30",
                Some("bob"),
            )],
        )
        .await
        .unwrap();
    channel.batches.lock().await.clear();
    let slot_id = store.slots().await[0].id;

    let outcome = service
        .update_schedule(&admin(), &[SlotUpdate::new(slot_id, None)])
        .await
        .unwrap();

    assert_eq!(outcome.changed_guides, vec![GuideId::from("bob")]);
    assert_eq!(channel.recipients().await, vec!["ExponentPushToken[bob]".to_string()]);
    assert_eq!(store.slots().await[0].guide_id, None);
}

#[tokio::test]
async fn test_publish_then_next_month_is_not_current() {
    let (_, _, service) = service_with(trio_available_all_month(), RecordingChannel::default());

    service
        .commit_slots(&admin(), &[CommitRow::new(nov(3), "10:30", Some("alice"))])
        .await
        .unwrap();

    let current = service.current_schedule(&admin()).await.unwrap();
    assert!(current.slots.is_empty());

    let in_november = admin().with_today(nov(10));
    let current = service.current_schedule(&in_november).await.unwrap();
    assert_eq!(current.slots.len(), 1);
    assert_eq!(current.slots[0].key(), morning_of(nov(3)));
}
