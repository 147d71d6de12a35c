// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! ExtractionPool driven through the public API

use persona_render::faces::{ExtractionPool, FaceError};
use persona_render::vision::StagedImage;
use std::sync::Arc;
use std::time::Duration;

use crate::common::{embedding_for, ScriptedEmbedder, MODEL_FAILURE, NO_FACE, SLOW, TWO_FACES};

fn pool(max_concurrent: usize, timeout: Option<Duration>) -> (ExtractionPool, Arc<ScriptedEmbedder>) {
    let embedder = Arc::new(ScriptedEmbedder::default());
    (
        ExtractionPool::new(embedder.clone(), max_concurrent, timeout),
        embedder,
    )
}

fn is_empty(dir: &std::path::Path) -> bool {
    std::fs::read_dir(dir).unwrap().next().is_none()
}

#[tokio::test]
async fn test_every_outcome_releases_the_staged_file() {
    let dir = tempfile::tempdir().unwrap();
    let (pool, _) = pool(2, None);

    let ok = pool
        .extract("ok", StagedImage::create(dir.path(), b"face").unwrap())
        .await;
    assert_eq!(ok.unwrap(), embedding_for(b"face"));
    assert!(is_empty(dir.path()));

    let two = pool
        .extract("two", StagedImage::create(dir.path(), TWO_FACES).unwrap())
        .await;
    assert_eq!(two.unwrap(), vec![1.0, 1.0, 1.0]);
    assert!(is_empty(dir.path()));

    let none = pool
        .extract("none", StagedImage::create(dir.path(), NO_FACE).unwrap())
        .await;
    assert!(matches!(none, Err(FaceError::NoFaceDetected)));
    assert!(is_empty(dir.path()));

    let failed = pool
        .extract("failed", StagedImage::create(dir.path(), MODEL_FAILURE).unwrap())
        .await;
    assert!(matches!(failed, Err(FaceError::Inference(_))));
    assert!(is_empty(dir.path()));
}

#[tokio::test]
async fn test_timeout_reports_and_releases_later() {
    let dir = tempfile::tempdir().unwrap();
    let (pool, _) = pool(1, Some(Duration::from_millis(30)));

    let result = pool
        .extract("slow", StagedImage::create(dir.path(), SLOW).unwrap())
        .await;
    assert!(matches!(result, Err(FaceError::Timeout(_))));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(is_empty(dir.path()));
    assert_eq!(pool.available_permits(), 1);
}

#[tokio::test]
async fn test_reports_embedder_name_and_bound() {
    let (pool, _) = pool(3, None);
    assert_eq!(pool.embedder_name(), "scripted");
    assert_eq!(pool.max_concurrent(), 3);
    assert_eq!(pool.available_permits(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_queued_request_times_out_behind_a_slow_one() {
    let dir = tempfile::tempdir().unwrap();
    let (pool, _) = pool(1, Some(Duration::from_millis(50)));
    let pool = Arc::new(pool);

    let slow = {
        let pool = Arc::clone(&pool);
        let staged = StagedImage::create(dir.path(), SLOW).unwrap();
        tokio::spawn(async move { pool.extract("slow", staged).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let started = std::time::Instant::now();
    let queued = pool
        .extract("queued", StagedImage::create(dir.path(), b"face").unwrap())
        .await;

    assert!(matches!(queued, Err(FaceError::Timeout(_))));
    assert!(started.elapsed() < Duration::from_millis(250));
    assert!(matches!(slow.await.unwrap(), Err(FaceError::Timeout(_))));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(is_empty(dir.path()));
}
