use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schema_outbox::config::AppConfig;
use schema_outbox::domain::app::{AppInstallEvent, AppUninstallEvent};
use schema_outbox::events::{DomainEvent, EventEnvelope};
use schema_outbox::outbox::{OutboxPublisher, OutboxStore, OutboxTransaction, PgOutboxStore};
use schema_outbox::schema::{Codec, HttpSchemaRegistry, LiveSchemaCatalog};

const CREATE_INSTALLS_TABLE: &str = "CREATE TABLE IF NOT EXISTS app_installs (
    app_id TEXT NOT NULL,
    channel_id TEXT NOT NULL,
    installed_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    PRIMARY KEY (app_id, channel_id)
)";

const INSERT_INSTALL: &str =
    "INSERT INTO app_installs (app_id, channel_id) VALUES ($1, $2) ON CONFLICT DO NOTHING";

/// Writes an install row and its outbox event in one transaction, publishes
/// an uninstall on its own, then a batch of installs in one transaction.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,schema_outbox=debug"))
        )
        .init();

    let config = AppConfig::load()?;

    let registry =
        HttpSchemaRegistry::new(&config.schema_registry.url, config.schema_registry.timeout())?;
    let mut catalog = LiveSchemaCatalog::new(registry);
    catalog.register_template::<AppInstallEvent>(AppInstallEvent::event_type());
    catalog.register_template::<AppUninstallEvent>(AppUninstallEvent::event_type());
    catalog.bind_schemas(&config.schema_registry.subjects).await?;
    let codec = Arc::new(Codec::new(Arc::new(catalog)));

    let store = PgOutboxStore::connect(
        &config.database.url,
        config.database.max_connections,
        config.database.acquire_timeout(),
    )
    .await?;
    store.ensure_schema().await?;
    sqlx::query(CREATE_INSTALLS_TABLE).execute(store.pool()).await?;

    let publisher = OutboxPublisher::new(store.clone(), codec);

    let install = AppInstallEvent {
        app_id: "app123".to_string(),
        channel_id: "channel456".to_string(),
        manager_id: "manager789".to_string(),
    };

    // Business write and outbox row share one commit
    let envelopes = [EventEnvelope::from_event(install.app_id.clone(), install.clone())];
    let mut tx = store.begin().await?;
    sqlx::query(INSERT_INSTALL)
        .bind(&install.app_id)
        .bind(&install.channel_id)
        .execute(tx.connection())
        .await?;
    let ids = publisher.publish_in(&mut tx, &envelopes).await?;
    tx.commit().await?;
    publisher.record_committed(&envelopes);
    tracing::info!(outbox_ids = ?ids, app_id = %install.app_id, "✅ Install recorded");

    let uninstall = AppUninstallEvent {
        app_id: install.app_id.clone(),
        channel_id: install.channel_id.clone(),
        manager_id: install.manager_id.clone(),
        device_id: "device001".to_string(),
        uninstalled_at: Some(prost_types::Timestamp {
            seconds: chrono::Utc::now().timestamp(),
            nanos: 0,
        }),
        reason: "user request".to_string(),
    };
    let id = publisher
        .publish(&EventEnvelope::from_event(uninstall.app_id.clone(), uninstall))
        .await?;
    tracing::info!(outbox_id = %id, "✅ Uninstall published");

    // Several events, one transaction
    let batch: Vec<EventEnvelope> = ["app124", "app125", "app126"]
        .into_iter()
        .map(|app_id| {
            EventEnvelope::from_event(
                app_id,
                AppInstallEvent {
                    app_id: app_id.to_string(),
                    channel_id: install.channel_id.clone(),
                    manager_id: install.manager_id.clone(),
                },
            )
        })
        .collect();
    let ids = publisher.publish_all(&batch).await?;
    tracing::info!(outbox_ids = ?ids, event_count = ids.len(), "✅ Batch published");

    Ok(())
}
