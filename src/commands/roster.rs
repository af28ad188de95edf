use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};

use tour_roster::config::{parse_clock_time, Config, DatabaseBackend};
use tour_roster::models::{GuideId, SlotKey};
use tour_roster::publish::{Preview, PublishService, RequestContext};
use tour_roster::scheduler::{AssignmentSource, Overrides, SlotTimes};
use tour_roster::server::api::PreviewResponse;
use tour_roster::storage::PgRosterStore;

use super::serve::build_service;

/// Options shared by `preview` and `publish`
#[derive(Debug, Clone, Default)]
pub struct RosterParams {
    pub include_afternoon: bool,
    /// `YYYY-MM-DD[@HH:MM]=GUIDE_ID`
    pub assignments: Vec<String>,
    /// Plan as if today were this day
    pub today: Option<NaiveDate>,
}

/// Parse a `DATE[@TIME]=GUIDE` assignment; the time defaults to the morning slot
fn parse_assignment(raw: &str, times: &SlotTimes) -> Result<(SlotKey, GuideId)> {
    let (slot, guide) = raw
        .split_once('=')
        .with_context(|| format!("Expected DATE[@HH:MM]=GUIDE_ID, got '{raw}'"))?;

    let (date, time) = match slot.split_once('@') {
        Some((date, time)) => (
            date,
            parse_clock_time(time.trim()).with_context(|| format!("Invalid time in '{raw}'"))?,
        ),
        None => (slot, times.morning),
    };
    let date = NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date in '{raw}'"))?;

    let guide = guide.trim();
    if guide.is_empty() {
        bail!("Missing guide id in '{raw}'");
    }

    Ok((SlotKey::new(date, time), GuideId::from(guide)))
}

async fn compute(
    config: &Config,
    params: &RosterParams,
) -> Result<(Preview, PublishService, RequestContext)> {
    let service = build_service(config).await?;
    let ctx = RequestContext::cli(params.today.unwrap_or_else(|| Local::now().date_naive()));

    let overrides = params
        .assignments
        .iter()
        .map(|raw| parse_assignment(raw, service.slot_times()))
        .collect::<Result<Overrides>>()?;

    let preview = service
        .preview(&ctx, params.include_afternoon, &overrides)
        .await?;

    for (key, guide) in &preview.effective.ignored_overrides {
        println!("Ignored: {guide} is not available on {key}");
    }

    Ok((preview, service, ctx))
}

fn print_preview(preview: &Preview) {
    let range = &preview.snapshot.range;
    println!("Roster {} to {}", range.start, range.end);
    println!("================================");

    for slot in &preview.effective.slots {
        let guide = slot
            .guide
            .as_ref()
            .map(|g| g.name.as_str())
            .unwrap_or("-- unassigned --");
        let marker = match slot.source {
            AssignmentSource::Override => " (override)",
            _ => "",
        };
        println!("  {}  {:<9}  {guide}{marker}", slot.slot.key, slot.slot.time_of_day.as_str());
    }

    println!();
    println!("{:<28} {:>8} {:>8}", "Guide", "Assigned", "History");
    for load in &preview.loads {
        println!("{:<28} {:>8} {:>8}", load.guide.name, load.assigned, load.history);
    }

    println!();
    println!("Slots: {}", preview.slots.len());
    println!("Unassigned: {}", preview.effective.unassigned);
}

/// Print next month's proposal
pub async fn preview(config: Config, params: RosterParams, json: bool) -> Result<()> {
    let (preview, _, _) = compute(&config, &params).await?;

    if json {
        let body = serde_json::to_string_pretty(&PreviewResponse::from(&preview))?;
        println!("{body}");
    } else {
        print_preview(&preview);
    }
    Ok(())
}

/// Compute and commit next month's roster
pub async fn publish(config: Config, params: RosterParams) -> Result<()> {
    let (preview, service, ctx) = compute(&config, &params).await?;
    print_preview(&preview);
    println!();

    let outcome = service.publish(&ctx, &preview).await?;

    println!("Published {} slots for {}", outcome.count, outcome.month);
    println!(
        "  Notified: {} users, {} devices ({} batches, {} failed)",
        outcome.notify.users, outcome.notify.tokens, outcome.notify.batches, outcome.notify.failed_batches
    );
    if let Some(error) = &outcome.notify.error {
        println!("  Notification warning: {error}");
    }
    Ok(())
}

/// Create the PostgreSQL schema
pub async fn init_db(config: Config) -> Result<()> {
    if config.database.backend != DatabaseBackend::Postgres {
        bail!("init-db requires the postgres backend");
    }

    let store = PgRosterStore::connect(&config.database).context("Failed to create connection pool")?;
    store.create_schema().await.context("Failed to create schema")?;

    println!("Schema ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_assignment() {
        let times = SlotTimes::default();

        let (key, guide) = parse_assignment("2026-11-03=g1", &times).unwrap();
        assert_eq!(key.time, times.morning);
        assert_eq!(guide.as_str(), "g1");

        let (key, _) = parse_assignment("2026-11-03@14:00=g2", &times).unwrap();
        assert_eq!(key.time, times.afternoon);

        assert!(parse_assignment("2026-11-03", &times).is_err());
        assert!(parse_assignment("2026-11-03=", &times).is_err());
        assert!(parse_assignment("11/03=g1", &times).is_err());
    }
}
