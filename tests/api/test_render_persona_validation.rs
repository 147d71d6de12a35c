// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1

//! Request validation for POST /renderPersona
//!
//! Body problems are rejected before any decoding or staging happens and
//! must surface as 422, never as a server error.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use tower::ServiceExt; // for `oneshot`

use crate::common::{encode, json_body, persona_body, render_request, TestApp};

async fn assert_unprocessable(test: &TestApp, body: String) -> serde_json::Value {
    let response = test.app.clone().oneshot(render_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = json_body(response).await;
    assert_eq!(json["errorType"], "validation_error");
    assert!(test.embedder.seen.lock().unwrap().is_empty());
    assert_eq!(test.staged_files(), 0);
    json
}

#[tokio::test]
async fn test_missing_uid() {
    let test = TestApp::new();
    let body = serde_json::json!({ "imageBase64": encode(b"face") }).to_string();

    let json = assert_unprocessable(&test, body).await;
    assert!(json["detail"].as_str().unwrap().contains("uid"));
}

#[tokio::test]
async fn test_missing_image() {
    let test = TestApp::new();
    let body = serde_json::json!({ "uid": "user-1" }).to_string();

    let json = assert_unprocessable(&test, body).await;
    assert!(json["detail"].as_str().unwrap().contains("imageBase64"));
}

#[tokio::test]
async fn test_wrong_field_type() {
    let test = TestApp::new();
    let body = serde_json::json!({ "imageBase64": 12345, "uid": "user-1" }).to_string();

    assert_unprocessable(&test, body).await;
}

#[tokio::test]
async fn test_null_uid() {
    let test = TestApp::new();
    let body = serde_json::json!({ "imageBase64": encode(b"face"), "uid": null }).to_string();

    assert_unprocessable(&test, body).await;
}

#[tokio::test]
async fn test_malformed_json() {
    let test = TestApp::new();

    assert_unprocessable(&test, "{\"imageBase64\": ".to_string()).await;
}

#[tokio::test]
async fn test_missing_content_type() {
    let test = TestApp::new();
    let request = Request::builder()
        .method("POST")
        .uri("/renderPersona")
        .body(Body::from(persona_body(&encode(b"face"), "user-1")))
        .unwrap();

    let response = test.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_unknown_fields_are_ignored() {
    let test = TestApp::new();
    let body = serde_json::json!({
        "imageBase64": encode(b"face"),
        "uid": "user-1",
        "extra": true
    })
    .to_string();

    let response = test.app.clone().oneshot(render_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_body_over_limit_is_rejected() {
    let test = TestApp::with_limits(1, None, 1024);
    let body = persona_body(&encode(&vec![0u8; 4096]), "user-1");

    let response = test.app.clone().oneshot(render_request(body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(test.staged_files(), 0);
}

#[tokio::test]
async fn test_get_is_not_allowed() {
    let test = TestApp::new();
    let request = Request::builder()
        .method("GET")
        .uri("/renderPersona")
        .body(Body::empty())
        .unwrap();

    let response = test.app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
