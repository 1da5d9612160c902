// ============================================================================
// Messaging - consume side entry points
// ============================================================================

pub mod consumer;
pub mod processor;

pub use consumer::{RedpandaConsumer, TYPE_HEADER};
pub use processor::{EventProcessor, ProcessError};
