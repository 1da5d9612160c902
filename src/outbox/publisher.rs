use std::sync::Arc;

use uuid::Uuid;

use super::errors::OutboxError;
use super::record::OutboxRecord;
use super::store::{OutboxStore, OutboxTransaction};
use crate::events::EventEnvelope;
use crate::metrics::Metrics;
use crate::schema::Codec;

// ============================================================================
// Outbox Publisher
// ============================================================================
//
// Encodes envelopes with the registry codec and inserts one row per event.
// A call either persists every row or none of them:
//
// 1. Serialize the whole batch (no transaction is opened if any event fails)
// 2. Begin, insert each row
// 3. Commit, or roll back on the first failed insert
//
// `publish_in` skips 2-3 and writes into a transaction the caller already
// holds, so the business mutation and the event rows share one commit.
//
// ============================================================================

pub struct OutboxPublisher<S: OutboxStore> {
    store: S,
    codec: Arc<Codec>,
    metrics: Option<Arc<Metrics>>,
}

impl<S: OutboxStore> OutboxPublisher<S> {
    pub fn new(store: S, codec: Arc<Codec>) -> Self {
        Self {
            store,
            codec,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist a single event in its own transaction.
    pub async fn publish(&self, event: &EventEnvelope) -> Result<Uuid, OutboxError> {
        let ids = self.publish_all(std::slice::from_ref(event)).await?;
        Ok(ids[0])
    }

    /// Persist every event in one transaction. Returns the generated row ids
    /// in input order.
    pub async fn publish_all(&self, events: &[EventEnvelope]) -> Result<Vec<Uuid>, OutboxError> {
        if events.is_empty() {
            tracing::debug!("No events to publish");
            return Ok(Vec::new());
        }

        let result = self.write_batch(events).await;
        self.record_metrics(&result, events);
        result
    }

    /// Insert rows into a transaction owned by the caller. Nothing is
    /// committed here; the caller commits or rolls back with its own writes.
    ///
    /// Rows are not counted in `outbox_rows_written` until the caller reports
    /// its commit through [`record_committed`](Self::record_committed).
    pub async fn publish_in(
        &self,
        tx: &mut S::Tx,
        events: &[EventEnvelope],
    ) -> Result<Vec<Uuid>, OutboxError> {
        let records = match self.encode_all(events) {
            Ok(records) => records,
            Err(e) => {
                self.record_failure(&e);
                return Err(e);
            }
        };

        if let Err(e) = insert_all(tx, &records).await {
            self.record_failure(&e);
            return Err(e);
        }

        Ok(records.into_iter().map(|r| r.id).collect())
    }

    /// Count rows written with [`publish_in`](Self::publish_in) once the
    /// caller's transaction has committed.
    pub fn record_committed(&self, events: &[EventEnvelope]) {
        if let Some(metrics) = &self.metrics {
            for event in events {
                metrics.record_outbox_row(&event.event_type);
            }
        }
    }

    async fn write_batch(&self, events: &[EventEnvelope]) -> Result<Vec<Uuid>, OutboxError> {
        let records = self.encode_all(events)?;

        let mut tx = self.store.begin().await.map_err(OutboxError::Begin)?;

        if let Err(e) = insert_all(&mut tx, &records).await {
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Rollback failed after insert error");
            }
            return Err(e);
        }

        tx.commit().await.map_err(OutboxError::Commit)?;

        tracing::info!(
            event_count = records.len(),
            event_types = ?records.iter().map(|r| r.event_type.as_str()).collect::<Vec<_>>(),
            "✅ Transactionally persisted outbox events"
        );

        Ok(records.into_iter().map(|r| r.id).collect())
    }

    fn encode_all(&self, events: &[EventEnvelope]) -> Result<Vec<OutboxRecord>, OutboxError> {
        events.iter().map(|event| self.encode(event)).collect()
    }

    fn encode(&self, event: &EventEnvelope) -> Result<OutboxRecord, OutboxError> {
        let payload = self
            .codec
            .serialize(&event.event_type, event.payload.as_ref())
            .map_err(|source| OutboxError::Serialize {
                event_type: event.event_type.clone(),
                source,
            })?;

        Ok(OutboxRecord {
            id: Uuid::new_v4(),
            aggregate_type: event.aggregate_type.clone(),
            aggregate_id: event.aggregate_id.clone(),
            event_type: event.event_type.clone(),
            payload,
        })
    }

    fn record_metrics(&self, result: &Result<Vec<Uuid>, OutboxError>, events: &[EventEnvelope]) {
        match result {
            Ok(_) => self.record_committed(events),
            Err(e) => self.record_failure(e),
        }
    }

    fn record_failure(&self, error: &OutboxError) {
        if let Some(metrics) = &self.metrics {
            metrics.record_outbox_failure(error.phase());
        }
    }
}

async fn insert_all<T: OutboxTransaction>(
    tx: &mut T,
    records: &[OutboxRecord],
) -> Result<(), OutboxError> {
    for record in records {
        tx.insert(record).await.map_err(|source| OutboxError::Insert {
            event_type: record.event_type.clone(),
            source,
        })?;

        tracing::debug!(
            outbox_id = %record.id,
            event_type = %record.event_type,
            aggregate_id = %record.aggregate_id,
            "Inserted outbox row"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::app::{AppInstallEvent, AppUninstallEvent};
    use crate::outbox::InMemoryOutboxStore;
    use crate::schema::{EventPayload, StaticSchemaCatalog};

    fn codec() -> Arc<Codec> {
        let catalog = StaticSchemaCatalog::new()
            .with::<AppInstallEvent>("AppInstallEvent", 7)
            .with::<AppUninstallEvent>("AppUninstallEvent", 8);
        Arc::new(Codec::new(Arc::new(catalog)))
    }

    fn install(app_id: &str) -> EventEnvelope {
        EventEnvelope::from_event(
            app_id,
            AppInstallEvent {
                app_id: app_id.to_string(),
                channel_id: "channel456".to_string(),
                manager_id: "manager789".to_string(),
            },
        )
    }

    fn unbound(app_id: &str) -> EventEnvelope {
        EventEnvelope::new(
            "app",
            app_id,
            "AppReinstallEvent",
            Box::new(AppInstallEvent::default()),
        )
    }

    #[tokio::test]
    async fn test_publish_writes_wire_encoded_row() {
        let store = InMemoryOutboxStore::new();
        let publisher = OutboxPublisher::new(store.clone(), codec());

        let id = publisher.publish(&install("app123")).await.unwrap();

        let rows = store.rows().await;
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.id, id);
        assert_eq!(row.aggregate_type, "app");
        assert_eq!(row.aggregate_id, "app123");
        assert_eq!(row.event_type, "AppInstallEvent");
        assert_eq!(&row.payload[..5], &[0x00, 0x00, 0x00, 0x00, 0x07]);

        let decoded: AppInstallEvent = codec().deserialize_as(&row.payload).unwrap();
        assert_eq!(decoded.app_id, "app123");
    }

    #[tokio::test]
    async fn test_publish_all_persists_batch_with_unique_ids() {
        let store = InMemoryOutboxStore::new();
        let publisher = OutboxPublisher::new(store.clone(), codec());

        let events = vec![
            install("app123"),
            EventEnvelope::from_event(
                "app123",
                AppUninstallEvent {
                    app_id: "app123".to_string(),
                    reason: "user request".to_string(),
                    ..Default::default()
                },
            ),
        ];

        let ids = publisher.publish_all(&events).await.unwrap();

        let rows = store.rows().await;
        assert_eq!(rows.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert_eq!(rows[1].event_type, "AppUninstallEvent");
        assert_eq!(&rows[1].payload[..5], &[0x00, 0x00, 0x00, 0x00, 0x08]);
    }

    #[tokio::test]
    async fn test_insert_failure_at_any_position_persists_nothing() {
        const N: usize = 4;

        for position in 1..=N {
            let store = InMemoryOutboxStore::new();
            store.fail_insert_at(position).await;
            let publisher = OutboxPublisher::new(store.clone(), codec());

            let events: Vec<_> = (0..N).map(|i| install(&format!("app{i}"))).collect();
            let err = publisher.publish_all(&events).await.unwrap_err();

            assert!(matches!(err, OutboxError::Insert { .. }), "position {position}");
            assert!(store.rows().await.is_empty(), "position {position}");
            assert_eq!(store.rollbacks().await, 1);
        }
    }

    #[tokio::test]
    async fn test_encoding_failure_at_any_position_persists_nothing() {
        const N: usize = 4;

        for position in 0..N {
            let store = InMemoryOutboxStore::new();
            let publisher = OutboxPublisher::new(store.clone(), codec());

            let events: Vec<_> = (0..N)
                .map(|i| if i == position { unbound("bad") } else { install(&format!("app{i}")) })
                .collect();
            let err = publisher.publish_all(&events).await.unwrap_err();

            assert!(matches!(
                err,
                OutboxError::Serialize { ref event_type, .. } if event_type == "AppReinstallEvent"
            ));
            assert_eq!(err.phase(), "serialize");
            assert!(store.rows().await.is_empty());
        }
    }

    #[tokio::test]
    async fn test_begin_and_commit_failures_surface_their_phase() {
        let store = InMemoryOutboxStore::new();
        store.fail_begin().await;
        let publisher = OutboxPublisher::new(store.clone(), codec());
        let err = publisher.publish(&install("a")).await.unwrap_err();
        assert_eq!(err.phase(), "begin");

        let store = InMemoryOutboxStore::new();
        store.fail_commit().await;
        let publisher = OutboxPublisher::new(store.clone(), codec());
        let err = publisher.publish(&install("a")).await.unwrap_err();
        assert!(matches!(err, OutboxError::Commit(_)));
        assert!(store.rows().await.is_empty());
    }

    #[tokio::test]
    async fn test_publish_in_follows_caller_transaction() {
        let store = InMemoryOutboxStore::new();
        let publisher = OutboxPublisher::new(store.clone(), codec());

        let mut tx = store.begin().await.unwrap();
        publisher.publish_in(&mut tx, &[install("a1")]).await.unwrap();
        tx.rollback().await.unwrap();
        assert!(store.rows().await.is_empty());

        let mut tx = store.begin().await.unwrap();
        let ids = publisher
            .publish_in(&mut tx, &[install("a1"), install("a2")])
            .await
            .unwrap();
        assert!(store.rows().await.is_empty());
        tx.commit().await.unwrap();

        let rows = store.rows().await;
        assert_eq!(rows.iter().map(|r| r.id).collect::<Vec<_>>(), ids);
    }

    #[tokio::test]
    async fn test_empty_batch_is_a_no_op() {
        let store = InMemoryOutboxStore::new();
        store.fail_begin().await;
        let publisher = OutboxPublisher::new(store.clone(), codec());

        assert!(publisher.publish_all(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_metrics_count_rows_and_failed_phases() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = InMemoryOutboxStore::new();
        let publisher = OutboxPublisher::new(store.clone(), codec()).with_metrics(metrics.clone());

        publisher.publish_all(&[install("a"), install("b")]).await.unwrap();
        let _ = publisher.publish(&unbound("c")).await;

        assert_eq!(
            metrics.outbox_rows_written.with_label_values(&["AppInstallEvent"]).get(),
            2
        );
        assert_eq!(
            metrics.outbox_batches_failed.with_label_values(&["serialize"]).get(),
            1
        );
    }

    #[tokio::test]
    async fn test_publish_in_rows_counted_after_caller_commit() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = InMemoryOutboxStore::new();
        let publisher = OutboxPublisher::new(store.clone(), codec()).with_metrics(metrics.clone());
        let events = [install("a1"), install("a2")];

        let mut tx = store.begin().await.unwrap();
        publisher.publish_in(&mut tx, &events).await.unwrap();
        assert_eq!(
            metrics.outbox_rows_written.with_label_values(&["AppInstallEvent"]).get(),
            0
        );

        tx.commit().await.unwrap();
        publisher.record_committed(&events);
        assert_eq!(
            metrics.outbox_rows_written.with_label_values(&["AppInstallEvent"]).get(),
            2
        );

        let mut tx = store.begin().await.unwrap();
        assert!(publisher.publish_in(&mut tx, &[unbound("x")]).await.is_err());
        assert_eq!(
            metrics.outbox_batches_failed.with_label_values(&["serialize"]).get(),
            1
        );
    }

    #[test]
    fn test_payload_encoding_matches_codec_body() {
        let event = install("app123");
        let bytes = codec()
            .serialize(&event.event_type, event.payload.as_ref())
            .unwrap();
        assert_eq!(&bytes[5..], event.payload.encode_payload().unwrap().as_slice());
    }
}
