use uuid::Uuid;

/// One row of the `event_outbox` table. Immutable once inserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboxRecord {
    pub id: Uuid,
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    /// Wire-encoded bytes: magic byte, schema id, payload.
    pub payload: Vec<u8>,
}
