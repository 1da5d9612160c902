// ============================================================================
// Events - Envelopes, handlers and dispatch
// ============================================================================
//
// Payloads arrive here already decoded. Decoding happens once, in the
// codec, before the router is involved.
//
// ============================================================================

mod envelope;
mod errors;
mod handler;
mod router;

pub use envelope::{DomainEvent, EventEnvelope};
pub use errors::{HandlerError, RouterError};
pub use handler::EventHandler;
pub use router::EventRouter;
