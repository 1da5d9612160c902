use async_trait::async_trait;

use super::errors::StoreError;
use super::record::OutboxRecord;

/// Transactional store the publisher writes into.
#[async_trait]
pub trait OutboxStore: Send + Sync {
    type Tx: OutboxTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError>;
}

/// An open transaction. Dropping it without `commit` must discard its writes.
#[async_trait]
pub trait OutboxTransaction: Send {
    async fn insert(&mut self, record: &OutboxRecord) -> Result<(), StoreError>;

    async fn commit(self) -> Result<(), StoreError>;

    async fn rollback(self) -> Result<(), StoreError>;
}
