// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::{Context, Result};
use clap::Parser;
use persona_render::{
    api::{create_app, start_server, AppState},
    config::ServiceConfig,
    faces::{ExtractionPool, OnnxFaceEmbedder},
    version,
};
use std::{env, sync::Arc};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing subscriber for logging
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    info!("Starting {}", version::get_version_string());

    let config = ServiceConfig::parse();
    config.validate().context("Invalid configuration")?;

    let staging_dir = config.staging_dir();
    let max_concurrent = config.max_concurrent_extractions();
    info!("Staging directory: {}", staging_dir.display());
    info!(
        "Extraction pool: {} concurrent, timeout {:?}",
        max_concurrent,
        config.extraction_timeout()
    );

    let model_config = config.face_model_config();
    let embedder = OnnxFaceEmbedder::new(&model_config).with_context(|| {
        format!(
            "Failed to load face models (detector: {}, recognizer: {})",
            model_config.detector_path.display(),
            model_config.recognizer_path.display()
        )
    })?;

    let pool = ExtractionPool::new(
        Arc::new(embedder),
        max_concurrent,
        config.extraction_timeout(),
    );
    let state = AppState::new(Arc::new(pool), staging_dir);
    let app = create_app(state, config.max_body_bytes);

    start_server(config.listen_addr, app).await
}
