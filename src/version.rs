// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
// Version information for the Persona Render service

/// Full version string with feature description
pub const VERSION: &str = "v1.0.0-face-embedding-2025-10-18";

/// Semantic version number
pub const VERSION_NUMBER: &str = "1.0.0";

/// Build date
pub const BUILD_DATE: &str = "2025-10-18";

/// Supported features in this version
pub const FEATURES: &[&str] = &[
    "render-persona",
    "ultraface-detection",
    "arcface-embedding",
    "bounded-extraction-pool",
    "line-wrapped-base64",
];

/// Get formatted version string for logging
pub fn get_version_string() -> String {
    format!("Persona Render {} ({})", VERSION_NUMBER, BUILD_DATE)
}

/// Get full version info for API responses
pub fn get_version_info() -> serde_json::Value {
    serde_json::json!({
        "version": VERSION_NUMBER,
        "build": VERSION,
        "date": BUILD_DATE,
        "features": FEATURES,
    })
}
