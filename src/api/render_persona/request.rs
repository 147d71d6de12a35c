// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persona render request type

use serde::{Deserialize, Serialize};

/// Request body for POST /renderPersona
///
/// Both fields are required; a body missing either is rejected before the
/// handler runs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonaRequest {
    /// Base64-encoded photo, standard alphabet with padding
    pub image_base64: String,

    /// Client identifier, used only to correlate log lines
    pub uid: String,
}
