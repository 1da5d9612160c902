// ============================================================================
// Dispatch Errors
// ============================================================================

/// Failure reported by an event handler. Propagated to the caller untouched.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("event rejected: {0}")]
    Rejected(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    #[error("no handler registered for event type: {0}")]
    NoHandler(String),

    #[error("handler for {event_type} expects {expected}, got {actual}")]
    PayloadMismatch {
        event_type: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("handler for {event_type} failed: {source}")]
    Handler {
        event_type: String,
        #[source]
        source: HandlerError,
    },
}
