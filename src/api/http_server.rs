// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

use super::handlers::health_handler;
use super::render_persona::render_persona_handler;
use crate::faces::ExtractionPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: Arc<ExtractionPool>,
    pub staging_dir: PathBuf,
}

impl AppState {
    pub fn new(pool: Arc<ExtractionPool>, staging_dir: PathBuf) -> Self {
        Self { pool, staging_dir }
    }
}

/// Build the router: persona rendering, health, open CORS
pub fn create_app(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/renderPersona", post(render_persona_handler))
        .route("/health", get(health_handler))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve `app` on `addr` until Ctrl+C
pub async fn start_server(addr: SocketAddr, app: Router) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("🚀 Persona render API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    info!("Persona render API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
