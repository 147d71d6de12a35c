// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

use crate::faces::FaceError;
use crate::vision::ImageError;

/// Wire shape of every failed request
///
/// `detail` is the message the client shows to the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub detail: String,
    pub error_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ApiError {
    InvalidRequest(String),
    NoFaceDetected,
    ValidationError { field: String, message: String },
    PayloadTooLarge(String),
    InternalError(String),
}

impl ApiError {
    pub fn to_response(&self, uid: Option<String>) -> ErrorResponse {
        let (error_type, detail) = match self {
            ApiError::InvalidRequest(msg) => ("invalid_request", msg.clone()),
            ApiError::NoFaceDetected => ("no_face_detected", FaceError::NoFaceDetected.to_string()),
            ApiError::ValidationError { message, .. } => ("validation_error", message.clone()),
            ApiError::PayloadTooLarge(msg) => ("payload_too_large", msg.clone()),
            ApiError::InternalError(msg) => ("internal_error", msg.clone()),
        };

        ErrorResponse {
            detail,
            error_type: error_type.to_string(),
            uid,
        }
    }

    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::InvalidRequest(_) | ApiError::NoFaceDetected => 400,
            ApiError::ValidationError { .. } => 422,
            ApiError::PayloadTooLarge(_) => 413,
            ApiError::InternalError(_) => 500,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
            ApiError::NoFaceDetected => write!(f, "{}", FaceError::NoFaceDetected),
            ApiError::ValidationError { field, message } => {
                write!(f, "Validation error for {}: {}", field, message)
            }
            ApiError::PayloadTooLarge(msg) => write!(f, "Payload too large: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<FaceError> for ApiError {
    fn from(err: FaceError) -> Self {
        match err {
            FaceError::NoFaceDetected => ApiError::NoFaceDetected,
            other => ApiError::InternalError(other.to_string()),
        }
    }
}

impl From<ImageError> for ApiError {
    fn from(err: ImageError) -> Self {
        match err {
            ImageError::InvalidBase64(e) => {
                ApiError::InvalidRequest(format!("Invalid base64 image: {}", e))
            }
            other => ApiError::InvalidRequest(other.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = rejection.body_text();
        warn!(
            "Rejected request body ({}): {}",
            rejection.status(),
            message
        );

        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge(message);
        }

        ApiError::ValidationError {
            field: rejected_field(&message).unwrap_or("body").to_string(),
            message,
        }
    }
}

/// Field name from serde's "missing field `x`" message, if that is the failure
fn rejected_field(message: &str) -> Option<&str> {
    let marker = message.find("missing field `")? + "missing field `".len();
    let rest = &message[marker..];
    rest.find('`').map(|end| &rest[..end])
}

/// An [`ApiError`] tagged with the caller's `uid` for the response body
#[derive(Debug)]
pub struct ApiErrorResponse {
    pub error: ApiError,
    pub uid: Option<String>,
}

impl ApiErrorResponse {
    pub fn new(error: impl Into<ApiError>, uid: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            uid: Some(uid.into()),
        }
    }
}

impl IntoResponse for ApiErrorResponse {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.error.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let error_response = self.error.to_response(self.uid);

        (status, Json(error_response)).into_response()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        ApiErrorResponse {
            error: self,
            uid: None,
        }
        .into_response()
    }
}
