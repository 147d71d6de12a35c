// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Bounded pool for running the face embedder off the async runtime
//!
//! Model inference is synchronous and CPU heavy. Each call runs on tokio's
//! blocking pool behind a semaphore, so a burst of large images cannot
//! starve the request-accept path or oversubscribe the CPU.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{info, warn, Span};

use super::embedder::{extract_first_embedding, FaceEmbedder, FaceError};
use crate::vision::StagedImage;

pub struct ExtractionPool {
    embedder: Arc<dyn FaceEmbedder>,
    permits: Arc<Semaphore>,
    max_concurrent: usize,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ExtractionPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionPool")
            .field("embedder", &self.embedder.name())
            .field("max_concurrent", &self.max_concurrent)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ExtractionPool {
    /// Create a pool running at most `max_concurrent` extractions at once
    ///
    /// A zero `max_concurrent` is treated as one. `timeout` bounds the whole
    /// request, waiting for a permit included.
    pub fn new(
        embedder: Arc<dyn FaceEmbedder>,
        max_concurrent: usize,
        timeout: Option<Duration>,
    ) -> Self {
        let max_concurrent = max_concurrent.max(1);
        Self {
            embedder,
            permits: Arc::new(Semaphore::new(max_concurrent)),
            max_concurrent,
            timeout,
        }
    }

    pub fn embedder_name(&self) -> &'static str {
        self.embedder.name()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_concurrent
    }

    /// Extractions that could start right now without waiting
    pub fn available_permits(&self) -> usize {
        self.permits.available_permits()
    }

    /// Embed the first face of a staged image
    ///
    /// Takes ownership of `staged`. If the request times out while queued
    /// for a permit, the file is deleted right away. Once a worker has it,
    /// the worker deletes it when the model call returns, whatever the
    /// outcome.
    pub async fn extract(&self, uid: &str, staged: StagedImage) -> Result<Vec<f32>, FaceError> {
        let run = self.run(uid, staged);

        match self.timeout {
            Some(limit) => tokio::time::timeout(limit, run)
                .await
                .map_err(|_| FaceError::Timeout(limit))?,
            None => run.await,
        }
    }

    async fn run(&self, uid: &str, staged: StagedImage) -> Result<Vec<f32>, FaceError> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| FaceError::Worker(e.to_string()))?;

        let embedder = Arc::clone(&self.embedder);
        let uid = uid.to_string();
        let span = Span::current();

        let task = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let _entered = span.enter();
            let result = extract_first_embedding(embedder.as_ref(), staged.path());
            release_staged(&uid, staged, result)
        });

        task.await.map_err(|e| {
            if e.is_panic() {
                FaceError::Worker("face embedder panicked".to_string())
            } else {
                FaceError::Worker(e.to_string())
            }
        })?
    }
}

/// Delete the staged file and hand back the extraction result.
///
/// A failed delete fails the request only when extraction succeeded;
/// otherwise the original failure wins.
fn release_staged(
    uid: &str,
    staged: StagedImage,
    result: Result<Vec<f32>, FaceError>,
) -> Result<Vec<f32>, FaceError> {
    let path = staged.path().to_path_buf();
    match (staged.close(), result) {
        (Ok(_), result) => {
            info!("[{}] Temp image deleted: {}", uid, path.display());
            result
        }
        (Err(e), Ok(_)) => {
            warn!("[{}] Failed to delete temp image {}: {}", uid, path.display(), e);
            Err(FaceError::Io(e))
        }
        (Err(e), Err(original)) => {
            warn!("[{}] Failed to delete temp image {}: {}", uid, path.display(), e);
            Err(original)
        }
    }
}
