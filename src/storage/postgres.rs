//! PostgreSQL roster store
//!
//! Backed by a deadpool connection pool. Slot upserts run inside a single
//! transaction and rely on the `(slot_date, slot_time)` unique constraint.

use async_trait::async_trait;
use chrono::NaiveDate;
use deadpool_postgres::{Config as PoolConfig, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::{NoTls, Row};
use uuid::Uuid;

use super::{
    AdminDirectory, AvailabilitySource, GuideDirectory, HistorySource, PushTokenStore, SlotStore,
    StoreError, StoreResult,
};
use crate::config::DatabaseConfig;
use crate::models::{AvailabilityEntry, Guide, GuideId, HistoryRow, Slot, SlotRecord};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS guides (
    id TEXT PRIMARY KEY,
    first_name TEXT,
    last_name TEXT,
    user_id TEXT
);

CREATE TABLE IF NOT EXISTS guide_availability (
    guide_id TEXT NOT NULL,
    date DATE NOT NULL,
    is_available BOOLEAN NOT NULL DEFAULT TRUE,
    PRIMARY KEY (guide_id, date)
);

CREATE TABLE IF NOT EXISTS schedule_slots (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    slot_date DATE NOT NULL,
    slot_time TIME NOT NULL,
    guide_id TEXT,
    status TEXT NOT NULL DEFAULT 'planned',
    UNIQUE (slot_date, slot_time)
);

CREATE TABLE IF NOT EXISTS push_tokens (
    user_id TEXT NOT NULL,
    expo_push_token TEXT NOT NULL,
    PRIMARY KEY (user_id, expo_push_token)
);

CREATE TABLE IF NOT EXISTS admins (
    user_id TEXT PRIMARY KEY
);

CREATE INDEX IF NOT EXISTS idx_guide_availability_date
    ON guide_availability(date);

CREATE INDEX IF NOT EXISTS idx_schedule_slots_guide_date
    ON schedule_slots(guide_id, slot_date);
"#;

const UPSERT_SLOT: &str = r#"
INSERT INTO schedule_slots (slot_date, slot_time, guide_id, status)
VALUES ($1, $2, $3, $4)
ON CONFLICT (slot_date, slot_time) DO UPDATE SET
    guide_id = EXCLUDED.guide_id,
    status = EXCLUDED.status
"#;

/// Roster store on top of PostgreSQL
#[derive(Clone)]
pub struct PgRosterStore {
    pool: Pool,
}

impl PgRosterStore {
    /// Create a pool from configuration
    ///
    /// No connection is opened until the first query.
    pub fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let mut pool_config = PoolConfig::new();
        pool_config.url = Some(config.url.clone());
        pool_config.manager = Some(ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        });
        pool_config.pool = Some(deadpool_postgres::PoolConfig::new(config.pool_size));

        let pool = pool_config
            .create_pool(Some(Runtime::Tokio1), NoTls)
            .map_err(|e| StoreError::other(format!("Failed to create connection pool: {e}")))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: Pool) -> Self {
        Self { pool }
    }

    /// Create tables and indexes if they do not exist yet
    pub async fn create_schema(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.batch_execute(SCHEMA).await?;

        tracing::info!("Roster schema initialized");
        Ok(())
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> StoreResult<()> {
        let client = self.pool.get().await?;
        client.simple_query("SELECT 1").await?;
        Ok(())
    }

    /// Current pool status: (size, available, max_size)
    pub fn pool_status(&self) -> (usize, usize, usize) {
        let status = self.pool.status();
        (status.size, status.available, status.max_size)
    }
}

fn id_strings(ids: &[GuideId]) -> Vec<String> {
    ids.iter().map(|id| id.as_str().to_string()).collect()
}

fn guide_from_row(row: &Row) -> StoreResult<Guide> {
    Ok(Guide {
        id: GuideId::new(row.try_get::<_, String>("id")?),
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        user_id: row.try_get("user_id")?,
    })
}

fn slot_from_row(row: &Row) -> StoreResult<Slot> {
    Ok(Slot {
        id: row.try_get("id")?,
        date: row.try_get("slot_date")?,
        time: row.try_get("slot_time")?,
        guide_id: row.try_get::<_, Option<String>>("guide_id")?.map(GuideId::new),
        status: row.try_get::<_, String>("status")?.into(),
    })
}

#[async_trait]
impl AvailabilitySource for PgRosterStore {
    async fn available_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<AvailabilityEntry>> {
        let client = self.pool.get().await?;

        let rows = client
            .query(
                r#"
                SELECT guide_id, date
                FROM guide_availability
                WHERE date >= $1 AND date < $2 AND is_available = TRUE
                ORDER BY date, guide_id
                "#,
                &[&start, &end],
            )
            .await?;

        let mut entries = Vec::with_capacity(rows.len());
        for row in &rows {
            let guide_id: Option<String> = row.try_get("guide_id")?;
            let date: Option<NaiveDate> = row.try_get("date")?;
            if let (Some(guide_id), Some(date)) = (guide_id, date) {
                entries.push(AvailabilityEntry::available(guide_id, date));
            }
        }
        Ok(entries)
    }
}

#[async_trait]
impl GuideDirectory for PgRosterStore {
    async fn guides_by_ids(&self, ids: &[GuideId]) -> StoreResult<Vec<Guide>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.pool.get().await?;
        let ids = id_strings(ids);
        let rows = client
            .query(
                "SELECT id, first_name, last_name, user_id FROM guides WHERE id = ANY($1)",
                &[&ids],
            )
            .await?;

        rows.iter().map(guide_from_row).collect()
    }

    async fn all_guides(&self) -> StoreResult<Vec<Guide>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT id, first_name, last_name, user_id FROM guides ORDER BY first_name, last_name, id",
                &[],
            )
            .await?;

        rows.iter().map(guide_from_row).collect()
    }
}

#[async_trait]
impl HistorySource for PgRosterStore {
    async fn history_for(
        &self,
        ids: &[GuideId],
        start: NaiveDate,
        end_inclusive: NaiveDate,
    ) -> StoreResult<Vec<HistoryRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.pool.get().await?;
        let ids = id_strings(ids);
        let rows = client
            .query(
                r#"
                SELECT guide_id, slot_date
                FROM schedule_slots
                WHERE guide_id = ANY($1) AND slot_date >= $2 AND slot_date <= $3
                "#,
                &[&ids, &start, &end_inclusive],
            )
            .await?;

        let mut history = Vec::with_capacity(rows.len());
        for row in &rows {
            history.push(HistoryRow {
                guide_id: GuideId::new(row.try_get::<_, String>("guide_id")?),
                date: row.try_get("slot_date")?,
            });
        }
        Ok(history)
    }
}

#[async_trait]
impl SlotStore for PgRosterStore {
    async fn upsert_slots(&self, rows: &[SlotRecord]) -> StoreResult<usize> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut client = self.pool.get().await?;
        let tx = client.transaction().await?;
        let statement = tx.prepare(UPSERT_SLOT).await?;

        for row in rows {
            tx.execute(
                &statement,
                &[
                    &row.key.date,
                    &row.key.time,
                    &row.guide_id.as_str(),
                    &row.status.as_str(),
                ],
            )
            .await?;
        }

        tx.commit().await?;

        tracing::debug!(rows = rows.len(), "Slots upserted");
        Ok(rows.len())
    }

    async fn slots_by_ids(&self, ids: &[Uuid]) -> StoreResult<Vec<Slot>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, slot_date, slot_time, guide_id, status
                FROM schedule_slots
                WHERE id = ANY($1)
                "#,
                &[&ids],
            )
            .await?;

        rows.iter().map(slot_from_row).collect()
    }

    async fn update_slot_guide(&self, id: Uuid, guide: Option<&GuideId>) -> StoreResult<()> {
        let client = self.pool.get().await?;
        let guide = guide.map(GuideId::as_str);

        let updated = client
            .execute(
                "UPDATE schedule_slots SET guide_id = $2 WHERE id = $1",
                &[&id, &guide],
            )
            .await?;

        if updated == 0 {
            return Err(StoreError::NotFound {
                entity: "slot",
                id: id.to_string(),
            });
        }
        Ok(())
    }

    async fn planned_slots_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> StoreResult<Vec<Slot>> {
        let client = self.pool.get().await?;
        let rows = client
            .query(
                r#"
                SELECT id, slot_date, slot_time, guide_id, status
                FROM schedule_slots
                WHERE slot_date >= $1 AND slot_date < $2 AND status = 'planned'
                ORDER BY slot_date, slot_time
                "#,
                &[&start, &end],
            )
            .await?;

        rows.iter().map(slot_from_row).collect()
    }
}

#[async_trait]
impl PushTokenStore for PgRosterStore {
    async fn tokens_for_users(&self, user_ids: &[String]) -> StoreResult<Vec<String>> {
        if user_ids.is_empty() {
            return Ok(Vec::new());
        }

        let client = self.pool.get().await?;
        let rows = client
            .query(
                "SELECT expo_push_token FROM push_tokens WHERE user_id = ANY($1)",
                &[&user_ids],
            )
            .await?;

        let mut tokens = Vec::with_capacity(rows.len());
        for row in &rows {
            if let Some(token) = row.try_get::<_, Option<String>>("expo_push_token")? {
                tokens.push(token);
            }
        }
        Ok(tokens)
    }
}

#[async_trait]
impl AdminDirectory for PgRosterStore {
    async fn is_admin(&self, user_id: &str) -> StoreResult<bool> {
        let client = self.pool.get().await?;
        let row = client
            .query_one(
                "SELECT EXISTS(SELECT 1 FROM admins WHERE user_id = $1)",
                &[&user_id],
            )
            .await?;

        Ok(row.try_get::<_, bool>(0)?)
    }
}
