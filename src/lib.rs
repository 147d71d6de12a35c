// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod api;
pub mod config;
pub mod faces;
pub mod version;
pub mod vision;

pub use api::{create_app, AppState, PersonaRequest, PersonaResponse};
pub use config::ServiceConfig;
pub use faces::{DetectedFace, ExtractionPool, FaceBox, FaceEmbedder, FaceError, OnnxFaceEmbedder};
