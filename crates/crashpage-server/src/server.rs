//! Demo server

use crate::config::ServerConfig;
use crate::layer::{error_pages, AppError};
use anyhow::{Context, Result};
use axum::routing::get;
use axum::{Json, Router};
use crashpage_core::ErrorReporter;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the router, with error pages wired in
pub fn app(reporter: Arc<ErrorReporter>) -> Router {
    let router = Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/panic", get(panic_handler))
        .route("/fail", get(fail_handler));

    error_pages(router, reporter).layer(TraceLayer::new_for_http())
}

async fn index() -> &'static str {
    "crashpage demo: try /panic or /fail\n"
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "version": crashpage_core::VERSION }))
}

#[allow(clippy::panic)]
async fn panic_handler() -> &'static str {
    panic!("demo handler panicked");
}

async fn fail_handler() -> Result<String, AppError> {
    let settings = std::fs::read_to_string("/nonexistent/crashpage/settings.yaml")?;
    Ok(settings)
}

/// Run the demo HTTP server
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let reporter = Arc::new(ErrorReporter::new(config.reporter.clone()));
    reporter.initialize();

    let app = app(reporter);

    // Get socket address
    let addr = config.socket_addr()?;

    info!("Starting crashpage server on {}", addr);

    // Create TCP listener
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;

    // Run server
    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}
