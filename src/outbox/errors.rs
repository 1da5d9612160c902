use crate::schema::CodecError;

// ============================================================================
// Outbox Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store rejected write: {0}")]
    Rejected(String),
}

/// Publish failure, tagged with the phase that failed. Nothing from the
/// batch is persisted when one of these is returned.
#[derive(Debug, thiserror::Error)]
pub enum OutboxError {
    #[error("failed to serialize event {event_type}: {source}")]
    Serialize {
        event_type: String,
        #[source]
        source: CodecError,
    },

    #[error("failed to begin transaction: {0}")]
    Begin(#[source] StoreError),

    #[error("failed to insert event {event_type}: {source}")]
    Insert {
        event_type: String,
        #[source]
        source: StoreError,
    },

    #[error("failed to commit transaction: {0}")]
    Commit(#[source] StoreError),
}

impl OutboxError {
    pub fn phase(&self) -> &'static str {
        match self {
            OutboxError::Serialize { .. } => "serialize",
            OutboxError::Begin(_) => "begin",
            OutboxError::Insert { .. } => "insert",
            OutboxError::Commit(_) => "commit",
        }
    }
}
