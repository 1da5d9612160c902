use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::errors::StoreError;
use super::record::OutboxRecord;
use super::store::{OutboxStore, OutboxTransaction};

// ============================================================================
// In-Memory Outbox Store
// ============================================================================
//
// Rows are staged per transaction and become visible only on commit, which
// gives the same all-or-nothing behaviour as a database. Failures can be
// injected to exercise rollback paths.
//
// ============================================================================

#[derive(Debug, Default)]
struct State {
    rows: Vec<OutboxRecord>,
    fail_insert_at: Option<usize>,
    fail_begin: bool,
    fail_commit: bool,
    rollbacks: usize,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryOutboxStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryOutboxStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the `position`-th insert (1-based) of every transaction fail.
    pub async fn fail_insert_at(&self, position: usize) {
        self.state.lock().await.fail_insert_at = Some(position);
    }

    pub async fn fail_begin(&self) {
        self.state.lock().await.fail_begin = true;
    }

    pub async fn fail_commit(&self) {
        self.state.lock().await.fail_commit = true;
    }

    pub async fn rows(&self) -> Vec<OutboxRecord> {
        self.state.lock().await.rows.clone()
    }

    pub async fn rollbacks(&self) -> usize {
        self.state.lock().await.rollbacks
    }
}

#[async_trait]
impl OutboxStore for InMemoryOutboxStore {
    type Tx = InMemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, StoreError> {
        let state = self.state.lock().await;
        if state.fail_begin {
            return Err(StoreError::Rejected("begin refused".to_string()));
        }

        Ok(InMemoryTransaction {
            state: self.state.clone(),
            staged: Vec::new(),
            inserts: 0,
            fail_insert_at: state.fail_insert_at,
        })
    }
}

#[derive(Debug)]
pub struct InMemoryTransaction {
    state: Arc<Mutex<State>>,
    staged: Vec<OutboxRecord>,
    inserts: usize,
    fail_insert_at: Option<usize>,
}

#[async_trait]
impl OutboxTransaction for InMemoryTransaction {
    async fn insert(&mut self, record: &OutboxRecord) -> Result<(), StoreError> {
        self.inserts += 1;
        if self.fail_insert_at == Some(self.inserts) {
            return Err(StoreError::Rejected(format!("insert #{} refused", self.inserts)));
        }

        if self.staged.iter().any(|r| r.id == record.id) {
            return Err(StoreError::Rejected(format!("duplicate id {}", record.id)));
        }

        self.staged.push(record.clone());
        Ok(())
    }

    async fn commit(self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.fail_commit {
            return Err(StoreError::Rejected("commit refused".to_string()));
        }

        state.rows.extend(self.staged);
        Ok(())
    }

    async fn rollback(self) -> Result<(), StoreError> {
        self.state.lock().await.rollbacks += 1;
        Ok(())
    }
}
