//! Server wiring: state construction, router composition, and the serve
//! loop with coordinated shutdown.
//!
//! Shutdown order: stop accepting HTTP connections, stop the broadcast
//! engine (which drains already-queued messages and closes every
//! subscriber), then return.

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::api;
use crate::app_state::{AppState, ConnectionSettings};
use crate::config::RelayConfig;
use crate::domain::Registry;
use crate::service::{BroadcastEngine, broadcast};
use crate::ws::handler::ws_handler;

/// Builds the shared state and the broadcast engine that serves it.
#[must_use]
pub fn build_state(config: &RelayConfig) -> (AppState, BroadcastEngine) {
    let registry = Arc::new(Registry::new());
    let (broadcaster, engine) = broadcast::channel(
        Arc::clone(&registry),
        config.queue_capacity,
        config.submit_timeout,
    );
    let state = AppState {
        registry,
        broadcaster,
        connection: ConnectionSettings::from(config),
    };
    (state, engine)
}

/// Composes REST routes, the `/ws` endpoint and middleware.
pub fn build_app(state: AppState, config: &RelayConfig) -> Router {
    // The timeout wraps REST routes only; `/ws` is added afterwards.
    let router = api::build_router()
        .layer(TimeoutLayer::new(config.request_timeout))
        .route("/ws", get(ws_handler));

    #[cfg(feature = "swagger-ui")]
    let router = {
        use utoipa::OpenApi;
        router.merge(
            utoipa_swagger_ui::SwaggerUi::new("/swagger-ui")
                .url("/api-docs/openapi.json", api::openapi::ApiDoc::openapi()),
        )
    };

    router
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// Serves the relay on `listener` until `shutdown` resolves.
///
/// # Errors
///
/// Returns an error if the HTTP server fails.
pub async fn serve<F>(listener: TcpListener, config: &RelayConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let (state, engine) = build_state(config);
    let app = build_app(state, config);

    let (stop_tx, mut stop_rx) = watch::channel(false);
    let engine_task = tokio::spawn(engine.run(async move {
        let _ = stop_rx.wait_for(|stop| *stop).await;
    }));

    let addr = listener.local_addr()?;
    tracing::info!(%addr, "server listening");

    let result = axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown.await;
            tracing::info!("shutdown signal received");
            // Closing subscribers lets upgraded connections finish.
            stop_tx.send_replace(true);
        })
        .await;

    if let Err(e) = engine_task.await {
        tracing::error!(error = %e, "broadcast engine task failed");
    }
    result?;
    Ok(())
}
