use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use schema_outbox::config::AppConfig;
use schema_outbox::domain::app::{
    AppInstallEvent, AppInstallHandler, AppUninstallEvent, AppUninstallHandler,
};
use schema_outbox::events::{DomainEvent, EventRouter};
use schema_outbox::messaging::{EventProcessor, RedpandaConsumer};
use schema_outbox::metrics::{self, Metrics};
use schema_outbox::schema::{Codec, HttpSchemaRegistry, LiveSchemaCatalog};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,schema_outbox=debug"))
        )
        .init();

    tracing::info!("🚀 Starting app event consumer");

    let config = AppConfig::load()?;

    // === 1. Bind event types to registry schema ids ===
    tracing::info!(url = %config.schema_registry.url, "Resolving schemas from registry");
    let registry =
        HttpSchemaRegistry::new(&config.schema_registry.url, config.schema_registry.timeout())?;
    let mut catalog = LiveSchemaCatalog::new(registry);
    catalog.register_template::<AppInstallEvent>(AppInstallEvent::event_type());
    catalog.register_template::<AppUninstallEvent>(AppUninstallEvent::event_type());
    catalog.bind_schemas(&config.schema_registry.subjects).await?;

    let codec = Arc::new(Codec::new(Arc::new(catalog)));

    // === 2. Register handlers ===
    let mut router = EventRouter::new();
    router.register_handler(AppInstallHandler);
    router.register_handler(AppUninstallHandler);
    tracing::info!(event_types = ?router.event_types().collect::<Vec<_>>(), "Handlers registered");

    let mut processor = EventProcessor::new(codec, Arc::new(router));

    // === 3. Prometheus metrics ===
    if config.metrics.enabled {
        let metrics = Arc::new(Metrics::new()?);
        processor = processor.with_metrics(metrics.clone());

        // actix-web runs on its own runtime in a background thread
        let registry = metrics.registry().clone();
        let port = config.metrics.port;
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to build metrics runtime: {}", e);
                    return;
                }
            };
            rt.block_on(async {
                let server =
                    metrics::start_metrics_server(registry, "schema-outbox-consumer", port);
                if let Err(e) = server.await {
                    tracing::error!("Metrics server error: {}", e);
                }
            });
        });
    }

    // === 4. Consume until Ctrl+C ===
    let consumer = RedpandaConsumer::new(&config.kafka, Arc::new(processor))?;

    consumer
        .run(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
        })
        .await;

    tracing::info!("👋 Consumer stopped");
    Ok(())
}
