//! Router construction.

use crate::app::AppState;
use crate::handlers;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/chat", post(handlers::chat))
        .route("/clear_memory", post(handlers::clear_memory))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API until the process is stopped.
pub async fn run_server(address: &str, state: AppState) -> docchat_core::AppResult<()> {
    let app = create_router(state);
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("Document chatbot API listening on http://{}", address);

    axum::serve(listener, app).await?;
    Ok(())
}
