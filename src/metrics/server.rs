use actix_web::{web, App, HttpResponse, HttpServer, Responder};
use prometheus::{Encoder, Registry, TextEncoder};

struct ServerState {
    registry: Registry,
    service: &'static str,
}

/// Serve `/metrics` (Prometheus text format) and `/health` on `port`.
///
/// actix-web wants its own runtime; run this on a dedicated thread.
pub async fn start_metrics_server(
    registry: Registry,
    service: &'static str,
    port: u16,
) -> std::io::Result<()> {
    tracing::info!("📊 Starting metrics server on http://0.0.0.0:{}/metrics", port);

    let state = web::Data::new(ServerState { registry, service });

    HttpServer::new(move || App::new().configure(routes(state.clone())))
        .bind(("0.0.0.0", port))?
        .run()
        .await
}

fn routes(state: web::Data<ServerState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(state)
            .route("/metrics", web::get().to(metrics_handler))
            .route("/health", web::get().to(health_handler));
    }
}

fn encode(registry: &Registry) -> Result<Vec<u8>, prometheus::Error> {
    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    Ok(buffer)
}

async fn metrics_handler(state: web::Data<ServerState>) -> impl Responder {
    match encode(&state.registry) {
        Ok(body) => HttpResponse::Ok()
            .content_type("text/plain; version=0.0.4")
            .body(body),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            HttpResponse::InternalServerError().finish()
        }
    }
}

async fn health_handler(state: web::Data<ServerState>) -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": state.service,
    }))
}
