// ============================================================================
// Transactional Outbox
// ============================================================================
//
// Event rows are written in the same transaction as the business mutation
// that produced them. Relaying rows to the broker is a separate process and
// is not part of this crate.
//
// ============================================================================

mod errors;
mod memory;
mod postgres;
mod publisher;
mod record;
mod store;

pub use errors::{OutboxError, StoreError};
pub use memory::{InMemoryOutboxStore, InMemoryTransaction};
pub use postgres::{PgOutboxStore, PgOutboxTransaction, OUTBOX_TABLE};
pub use publisher::OutboxPublisher;
pub use record::OutboxRecord;
pub use store::{OutboxStore, OutboxTransaction};
