//! Intake server library logic.

pub mod api;
pub mod api_process;
pub mod api_reports;
pub mod config;

use axum::{
    extract::{DefaultBodyLimit, Extension},
    routing::{get, post},
    Json, Router,
};
use intake_pipeline::Orchestrator;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// Maximum request body size (2 MiB) outside the upload route.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The pipeline behind every processing request.
    pub orchestrator: Arc<Orchestrator>,
    /// Where uploads are staged.
    pub temp_dir: PathBuf,
    /// Where pipeline reports are persisted.
    pub json_dir: PathBuf,
    /// Where synthesized replies are written (served under /outputs/audio).
    pub audio_dir: PathBuf,
}

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    // The upload route needs a larger body limit than the rest of the API.
    let upload_routes = Router::new()
        .route("/api/process", post(api_process::process_handler))
        .layer(DefaultBodyLimit::max(api_process::MAX_UPLOAD_BYTES));

    let router = Router::new()
        .route("/health", get(health))
        .route("/api/reports", get(api_reports::list_reports_handler))
        .route("/api/reports/{name}", get(api_reports::get_report_handler))
        .merge(upload_routes)
        .nest_service("/outputs/audio", ServeDir::new(&state.audio_dir));

    // Serve the upload form if the static directory exists.
    // Configured via INTAKE_STATIC_DIR env var; defaults to "static".
    let static_dir = std::env::var("INTAKE_STATIC_DIR").unwrap_or_else(|_| "static".to_string());
    let index = std::path::Path::new(&static_dir).join("index.html");
    let router = if index.exists() {
        tracing::info!(path = %static_dir, "serving upload form");
        router.fallback_service(ServeDir::new(&static_dir).fallback(ServeFile::new(index)))
    } else {
        tracing::info!(path = %static_dir, "static directory not found, skipping upload form");
        router
    };

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}
