//! HTTP server exposing a [`Library`] using axum.

use axum::Router;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::error::ServerError;
use crate::library::Library;

pub mod handlers;
pub mod pages;

/// Create HTTP router with all endpoints.
pub fn create_router(library: Arc<Library>) -> Router {
    Router::new()
        .route("/", get(handlers::handle_gallery))
        .route("/thumbnail/{archive}", get(handlers::handle_thumbnail))
        .route("/list/{archive}", get(handlers::handle_list))
        .route("/view/{archive}/{*path}", get(handlers::handle_view))
        .route("/zip_content/{archive}/{*path}", get(handlers::handle_content))
        .layer(TraceLayer::new_for_http())
        .with_state(library)
}

/// Serve `library` on `bind_addr` until Ctrl-C.
pub async fn start_server(bind_addr: SocketAddr, library: Arc<Library>) -> Result<(), ServerError> {
    let app = create_router(library);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .map_err(|source| ServerError::HttpBindFailed {
            addr: bind_addr,
            source,
        })?;

    tracing::info!("HTTP server listening on {}", bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Shutdown(format!("HTTP server error: {e}")))?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
