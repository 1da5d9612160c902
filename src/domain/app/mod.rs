// ============================================================================
// App Domain - installation lifecycle events
// ============================================================================

pub mod events;
pub mod handlers;

pub use events::*;
pub use handlers::*;
