// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! ONNX face embedder: UltraFace detection followed by ArcFace recognition

use anyhow::Result;
use image::RgbImage;
use std::path::{Path, PathBuf};
use tracing::info;

use super::detection::FaceDetectionModel;
use super::embedder::{DetectedFace, FaceEmbedder, FaceError};
use super::recognition::FaceRecognitionModel;

/// Configuration for loading the face models
#[derive(Debug, Clone)]
pub struct FaceModelConfig {
    /// Path to the detector ONNX file
    pub detector_path: PathBuf,
    /// Path to the recognizer ONNX file
    pub recognizer_path: PathBuf,
    /// Minimum detection score
    pub score_threshold: f32,
    /// NMS overlap threshold
    pub iou_threshold: f32,
    /// ONNX Runtime intra-op threads per session
    pub intra_threads: usize,
}

impl Default for FaceModelConfig {
    fn default() -> Self {
        Self {
            detector_path: PathBuf::from("./models/face-detector/version-RFB-320.onnx"),
            recognizer_path: PathBuf::from("./models/face-recognizer/arcface.onnx"),
            score_threshold: 0.7,
            iou_threshold: 0.3,
            intra_threads: 4,
        }
    }
}

/// Face embedder backed by two ONNX sessions on CPU
#[derive(Debug, Clone)]
pub struct OnnxFaceEmbedder {
    detector: FaceDetectionModel,
    recognizer: FaceRecognitionModel,
}

impl OnnxFaceEmbedder {
    /// Load both models. Fails if either file is missing or invalid.
    pub fn new(config: &FaceModelConfig) -> Result<Self> {
        let detector = FaceDetectionModel::new(
            &config.detector_path,
            config.score_threshold,
            config.iou_threshold,
            config.intra_threads,
        )?;
        let recognizer = FaceRecognitionModel::new(&config.recognizer_path, config.intra_threads)?;

        info!("✅ Face embedder ready (UltraFace + ArcFace)");

        Ok(Self {
            detector,
            recognizer,
        })
    }

    /// Detect and embed faces in an already decoded image
    pub fn encode_image(&self, image: &RgbImage) -> Result<Vec<DetectedFace>, FaceError> {
        self.detector
            .detect(image)?
            .into_iter()
            .map(|detection| {
                let embedding = self.recognizer.embed(image, &detection.bbox)?;
                Ok(DetectedFace::new(detection.bbox, detection.score, embedding))
            })
            .collect()
    }
}

impl FaceEmbedder for OnnxFaceEmbedder {
    fn name(&self) -> &'static str {
        "ultraface-arcface"
    }

    fn face_encodings(&self, image_path: &Path) -> Result<Vec<DetectedFace>, FaceError> {
        let image = load_image_file(image_path)?;
        self.encode_image(&image)
    }
}

/// Load an image from disk, sniffing the format from its content
pub fn load_image_file(path: &Path) -> Result<RgbImage, FaceError> {
    let reader = image::ImageReader::open(path)?
        .with_guessed_format()
        .map_err(FaceError::Io)?;
    let image = reader
        .decode()
        .map_err(|e| FaceError::ImageLoad(e.to_string()))?;
    Ok(image.into_rgb8())
}
