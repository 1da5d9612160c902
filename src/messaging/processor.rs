use std::sync::Arc;
use std::time::Instant;

use crate::events::{EventRouter, RouterError};
use crate::metrics::Metrics;
use crate::schema::{Codec, CodecError};

// ============================================================================
// Event Processor - decode, then dispatch
// ============================================================================
//
// Entry point for raw broker records. The codec decodes (strict schema id
// check), the router dispatches the ready payload. The caller decides what a
// failure means for offsets and redelivery.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum ProcessError {
    #[error("failed to deserialize {event_type}: {source}")]
    Decode {
        event_type: String,
        #[source]
        source: CodecError,
    },

    #[error(transparent)]
    Dispatch(#[from] RouterError),
}

impl ProcessError {
    pub fn stage(&self) -> &'static str {
        match self {
            ProcessError::Decode { .. } => "decode",
            ProcessError::Dispatch(_) => "dispatch",
        }
    }
}

pub struct EventProcessor {
    codec: Arc<Codec>,
    router: Arc<EventRouter>,
    metrics: Option<Arc<Metrics>>,
}

impl EventProcessor {
    pub fn new(codec: Arc<Codec>, router: Arc<EventRouter>) -> Self {
        Self {
            codec,
            router,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub async fn process(&self, event_type: &str, bytes: &[u8]) -> Result<(), ProcessError> {
        let started = Instant::now();
        let result = self.decode_and_dispatch(event_type, bytes).await;

        if let Some(metrics) = &self.metrics {
            metrics.record_message(
                event_type,
                started.elapsed().as_secs_f64(),
                result.as_ref().err().map(ProcessError::stage),
            );
        }

        result
    }

    async fn decode_and_dispatch(
        &self,
        event_type: &str,
        bytes: &[u8],
    ) -> Result<(), ProcessError> {
        let payload = self
            .codec
            .deserialize(bytes, event_type)
            .map_err(|source| ProcessError::Decode {
                event_type: event_type.to_string(),
                source,
            })?;

        tracing::debug!(event_type = %event_type, size = bytes.len(), "Decoded message");

        self.router.dispatch(event_type, payload).await?;
        Ok(())
    }
}
