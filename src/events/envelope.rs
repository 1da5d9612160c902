use crate::schema::EventPayload;

// ============================================================================
// Domain Event Trait
// ============================================================================

/// Binds a payload type to its logical event name and owning aggregate.
pub trait DomainEvent: EventPayload + Default {
    fn event_type() -> &'static str;
    fn aggregate_type() -> &'static str;
}

// ============================================================================
// Event Envelope
// ============================================================================

/// Aggregate metadata wrapping a payload before it is encoded.
#[derive(Debug)]
pub struct EventEnvelope {
    pub aggregate_type: String,
    pub aggregate_id: String,
    pub event_type: String,
    pub payload: Box<dyn EventPayload>,
}

impl EventEnvelope {
    pub fn new(
        aggregate_type: impl Into<String>,
        aggregate_id: impl Into<String>,
        event_type: impl Into<String>,
        payload: Box<dyn EventPayload>,
    ) -> Self {
        Self {
            aggregate_type: aggregate_type.into(),
            aggregate_id: aggregate_id.into(),
            event_type: event_type.into(),
            payload,
        }
    }

    /// Envelope for a typed event, taking names from its `DomainEvent` impl.
    pub fn from_event<E: DomainEvent>(aggregate_id: impl Into<String>, event: E) -> Self {
        Self::new(E::aggregate_type(), aggregate_id, E::event_type(), Box::new(event))
    }
}
