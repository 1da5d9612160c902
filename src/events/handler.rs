use async_trait::async_trait;

use super::envelope::DomainEvent;
use super::errors::HandlerError;

/// One handler per event kind.
///
/// The router keys the handler by `event_type()`, which defaults to the
/// payload's `DomainEvent` name.
#[async_trait]
pub trait EventHandler: Send + Sync + 'static {
    type Payload: DomainEvent;

    fn event_type(&self) -> &str {
        <Self::Payload as DomainEvent>::event_type()
    }

    async fn handle(&self, payload: Self::Payload) -> Result<(), HandlerError>;
}
