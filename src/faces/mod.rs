// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Face detection and embedding
//!
//! This module provides:
//! - The [`FaceEmbedder`] capability trait and the first-face extraction rule
//! - An ONNX implementation (UltraFace detector + ArcFace recognizer) on CPU
//! - A bounded pool that runs extractions on tokio's blocking threads

pub mod detection;
pub mod embedder;
pub mod model;
pub mod pool;
pub mod recognition;

pub use embedder::{extract_first_embedding, DetectedFace, FaceBox, FaceEmbedder, FaceError};
pub use model::{load_image_file, FaceModelConfig, OnnxFaceEmbedder};
pub use pool::ExtractionPool;
