// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use persona_render::api::HealthResponse;
use persona_render::version::VERSION_NUMBER;
use tower::ServiceExt; // for `oneshot`

use crate::common::{json_body, TestApp};

#[tokio::test]
async fn test_health_reports_embedder() {
    let test = TestApp::new();
    let request = Request::builder()
        .uri("/health")
        .body(Body::empty())
        .unwrap();

    let response = test.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health: HealthResponse = serde_json::from_value(json_body(response).await).unwrap();
    assert_eq!(health.status, "healthy");
    assert_eq!(health.version, VERSION_NUMBER);
    assert_eq!(health.embedder, "scripted");
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let test = TestApp::new();
    let request = Request::builder()
        .uri("/v1/inference")
        .body(Body::empty())
        .unwrap();

    let response = test.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
