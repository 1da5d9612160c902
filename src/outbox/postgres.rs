use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgConnection, PgPool, PgPoolOptions};
use sqlx::{Postgres, Transaction};

use super::errors::StoreError;
use super::record::OutboxRecord;
use super::store::{OutboxStore, OutboxTransaction};

pub const OUTBOX_TABLE: &str = "event_outbox";

const CREATE_OUTBOX_TABLE: &str = "CREATE TABLE IF NOT EXISTS event_outbox (
    id UUID PRIMARY KEY,
    aggregate_type TEXT NOT NULL,
    aggregate_id TEXT NOT NULL,
    type TEXT NOT NULL,
    payload BYTEA NOT NULL
)";

const INSERT_OUTBOX_ROW: &str = "INSERT INTO event_outbox
    (id, aggregate_type, aggregate_id, type, payload)
    VALUES ($1, $2, $3, $4, $5)";

// ============================================================================
// PostgreSQL Outbox Store
// ============================================================================

#[derive(Clone)]
pub struct PgOutboxStore {
    pool: PgPool,
}

impl PgOutboxStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;

        tracing::info!(max_connections = max_connections, "Connected to PostgreSQL");
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create the outbox table if it does not exist.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_OUTBOX_TABLE).execute(&self.pool).await?;
        tracing::info!(table = OUTBOX_TABLE, "Outbox table ready");
        Ok(())
    }
}

#[async_trait]
impl OutboxStore for PgOutboxStore {
    type Tx = PgOutboxTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(PgOutboxTransaction { tx })
    }
}

/// Open PostgreSQL transaction. Business writes go through
/// [`connection`](Self::connection) so they commit or roll back together
/// with the outbox rows.
pub struct PgOutboxTransaction {
    tx: Transaction<'static, Postgres>,
}

impl PgOutboxTransaction {
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut self.tx
    }
}

#[async_trait]
impl OutboxTransaction for PgOutboxTransaction {
    async fn insert(&mut self, record: &OutboxRecord) -> Result<(), StoreError> {
        sqlx::query(INSERT_OUTBOX_ROW)
            .bind(record.id)
            .bind(record.aggregate_type.as_str())
            .bind(record.aggregate_id.as_str())
            .bind(record.event_type.as_str())
            .bind(record.payload.as_slice())
            .execute(&mut *self.tx)
            .await?;
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.tx.rollback().await?;
        Ok(())
    }
}
