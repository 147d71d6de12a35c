// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persona render endpoint handler

use axum::{extract::State, Json};
use std::io;
use std::path::PathBuf;
use axum_extra::extract::WithRejection;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::request::PersonaRequest;
use super::response::PersonaResponse;
use crate::api::errors::{ApiError, ApiErrorResponse};
use crate::api::http_server::AppState;
use crate::faces::FaceError;
use crate::vision::{decode_base64_payload, StagedImage};

/// POST /renderPersona - Embed the first face found in a photo
///
/// # Request
/// - `imageBase64`: Base64-encoded image (required)
/// - `uid`: Client identifier for log correlation (required)
///
/// # Response
/// - `vector`: Embedding of the first detected face
///
/// # Errors
/// - 400 Bad Request: payload is not valid base64, or no face was found
/// - 422 Unprocessable Entity: body is not JSON or misses a field
/// - 500 Internal Server Error: the face model or staging failed
pub async fn render_persona_handler(
    State(state): State<AppState>,
    WithRejection(Json(request), _): WithRejection<Json<PersonaRequest>, ApiError>,
) -> Result<Json<PersonaResponse>, ApiErrorResponse> {
    let span = info_span!(
        "render_persona",
        uid = %request.uid,
        request_id = %Uuid::new_v4()
    );

    render_persona(&state, request).instrument(span).await
}

async fn render_persona(
    state: &AppState,
    request: PersonaRequest,
) -> Result<Json<PersonaResponse>, ApiErrorResponse> {
    let PersonaRequest { image_base64, uid } = request;
    info!("[{}] Received persona render request", uid);

    // 1. Decode
    let bytes = decode_base64_payload(&image_base64).map_err(|e| {
        warn!("[{}] Failed to decode image: {}", uid, e);
        ApiErrorResponse::new(e, uid.as_str())
    })?;
    drop(image_base64);
    info!("[{}] Image decoded, size: {} bytes", uid, bytes.len());

    // 2. Stage
    let staged = stage_image(state.staging_dir.clone(), bytes)
        .await
        .map_err(|e| {
            error!("[{}] Failed to stage image: {}", uid, e);
            ApiErrorResponse::new(
                ApiError::InternalError(format!("Failed to stage image: {}", e)),
                uid.as_str(),
            )
        })?;
    info!(
        "[{}] Image staged at {} ({} bytes)",
        uid,
        staged.path().display(),
        staged.size_bytes()
    );

    // 3. Extract; the pool deletes the staged file on every path
    let vector = state.pool.extract(&uid, staged).await.map_err(|e| {
        match &e {
            FaceError::NoFaceDetected => warn!("[{}] No face detected", uid),
            other => error!("[{}] Face extraction failed: {}", uid, other),
        }
        ApiErrorResponse::new(e, uid.as_str())
    })?;

    info!("[{}] Embedding extracted, length: {}", uid, vector.len());

    Ok(Json(PersonaResponse::new(vector)))
}

/// Write the decoded upload on the blocking pool; large photos are slow to flush
async fn stage_image(staging_dir: PathBuf, bytes: Vec<u8>) -> io::Result<StagedImage> {
    tokio::task::spawn_blocking(move || StagedImage::create(&staging_dir, &bytes))
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
}
