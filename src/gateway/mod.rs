pub mod handlers;
pub mod openapi;
pub mod state;
pub mod types;

use axum::{
    Json, Router,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use utoipa::OpenApi;

use state::AppState;

/// Start the HTTP gateway server.
///
/// Completed settlement CSVs are exposed as static files under
/// `/downloads`, backed by the runner's output directory.
pub async fn run_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let downloads_dir = state.out_dir.clone();
    let state = Arc::new(state);

    let app = Router::new()
        .route("/health", get(handlers::health_check))
        // Order path
        .route("/orders", post(handlers::create_order))
        .route("/orders/{id}", get(handlers::get_order))
        // Settlement job path
        .route("/jobs/settlement", post(handlers::start_settlement))
        .route("/jobs/{id}", get(handlers::get_job))
        .route("/jobs/{id}/cancel", post(handlers::cancel_job))
        // Completed CSV artifacts
        .nest_service("/downloads", ServeDir::new(downloads_dir))
        .route(
            "/api-docs/openapi.json",
            get(|| async { Json(openapi::ApiDoc::openapi()) }),
        )
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(%addr, "gateway listening");
    tracing::info!(%addr, "OpenAPI document at /api-docs/openapi.json");

    axum::serve(listener, app).await?;
    Ok(())
}
