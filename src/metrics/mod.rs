// Private module declaration
mod server;

use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};

// Re-export for public API
pub use server::start_metrics_server;

// ============================================================================
// Metrics Module - Prometheus metrics for observability
// ============================================================================
//
// Provides metrics for:
// - Consumed messages (throughput, latency, failures by stage)
// - Outbox rows written and failed publish batches by phase
//
// All metrics are registered with Prometheus and can be scraped via /metrics
// ============================================================================

pub struct Metrics {
    registry: Registry,

    // Consumption Metrics
    pub messages_processed: IntCounterVec,
    pub messages_failed: IntCounterVec,
    pub processing_duration: HistogramVec,

    // Outbox Metrics
    pub outbox_rows_written: IntCounterVec,
    pub outbox_batches_failed: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let messages_processed = IntCounterVec::new(
            Opts::new("messages_processed_total", "Messages decoded and handled successfully"),
            &["event_type"],
        )?;
        registry.register(Box::new(messages_processed.clone()))?;

        let messages_failed = IntCounterVec::new(
            Opts::new("messages_failed_total", "Messages that failed to decode or dispatch"),
            &["event_type", "stage"],
        )?;
        registry.register(Box::new(messages_failed.clone()))?;

        let processing_duration = HistogramVec::new(
            HistogramOpts::new("message_processing_duration_seconds", "Decode + dispatch duration")
                .buckets(vec![0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["event_type"],
        )?;
        registry.register(Box::new(processing_duration.clone()))?;

        let outbox_rows_written = IntCounterVec::new(
            Opts::new("outbox_rows_written_total", "Outbox rows committed"),
            &["event_type"],
        )?;
        registry.register(Box::new(outbox_rows_written.clone()))?;

        let outbox_batches_failed = IntCounterVec::new(
            Opts::new("outbox_batches_failed_total", "Publish calls rolled back"),
            &["phase"],
        )?;
        registry.register(Box::new(outbox_batches_failed.clone()))?;

        Ok(Self {
            registry,
            messages_processed,
            messages_failed,
            processing_duration,
            outbox_rows_written,
            outbox_batches_failed,
        })
    }

    /// Get the Prometheus registry for exposing metrics via HTTP
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Record one consumed message. `failed_stage` is `None` on success.
    pub fn record_message(&self, event_type: &str, duration_secs: f64, failed_stage: Option<&str>) {
        match failed_stage {
            None => self.messages_processed.with_label_values(&[event_type]).inc(),
            Some(stage) => self.messages_failed.with_label_values(&[event_type, stage]).inc(),
        }
        self.processing_duration.with_label_values(&[event_type]).observe(duration_secs);
    }

    pub fn record_outbox_row(&self, event_type: &str) {
        self.outbox_rows_written.with_label_values(&[event_type]).inc();
    }

    pub fn record_outbox_failure(&self, phase: &str) {
        self.outbox_batches_failed.with_label_values(&[phase]).inc();
    }
}
