// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Face embedding capability
//!
//! The service never looks inside the model. Anything that can load an image
//! from disk and return zero or more face embeddings in a stable order can be
//! plugged in behind [`FaceEmbedder`].

use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Failures raised while turning a staged image into an embedding
#[derive(Debug, Error)]
pub enum FaceError {
    /// The image was readable but contained no face
    #[error("No face detected. Please try again.")]
    NoFaceDetected,

    #[error("Failed to load image: {0}")]
    ImageLoad(String),

    #[error("Face model inference failed: {0}")]
    Inference(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The blocking worker panicked or was cancelled
    #[error("Extraction worker failed: {0}")]
    Worker(String),

    #[error("Face extraction timed out after {0:?}")]
    Timeout(Duration),
}

/// Axis-aligned face box in source image pixels
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FaceBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
}

impl FaceBox {
    pub fn width(&self) -> f32 {
        (self.x2 - self.x1).max(0.0)
    }

    pub fn height(&self) -> f32 {
        (self.y2 - self.y1).max(0.0)
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// Intersection over union with another box
    pub fn iou(&self, other: &FaceBox) -> f32 {
        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// One face found by the capability
#[derive(Debug, Clone, PartialEq)]
pub struct DetectedFace {
    /// Where the face is in the source image
    pub bbox: FaceBox,
    /// Detection confidence (0.0-1.0)
    pub score: f32,
    /// Identity embedding for this face
    pub embedding: Vec<f32>,
}

impl DetectedFace {
    pub fn new(bbox: FaceBox, score: f32, embedding: Vec<f32>) -> Self {
        Self {
            bbox,
            score,
            embedding,
        }
    }
}

/// External face-embedding capability
///
/// Implementations are synchronous and may be CPU heavy; callers run them on
/// the blocking pool (see [`crate::faces::ExtractionPool`]).
#[cfg_attr(test, mockall::automock)]
pub trait FaceEmbedder: Send + Sync {
    /// Short identifier reported by `/health`
    fn name(&self) -> &'static str;

    /// Detect every face in the image at `image_path` and embed each one.
    ///
    /// The returned order must be deterministic for a given image. An image
    /// without faces is `Ok(vec![])`, not an error.
    fn face_encodings(&self, image_path: &Path) -> Result<Vec<DetectedFace>, FaceError>;
}

/// Run the capability and keep the first face in capability order.
///
/// Multi-face images silently drop every face but the first. No re-sorting
/// and no "best face" selection happens here.
pub fn extract_first_embedding(
    embedder: &dyn FaceEmbedder,
    image_path: &Path,
) -> Result<Vec<f32>, FaceError> {
    let faces = embedder.face_encodings(image_path)?;

    debug!(
        "{} returned {} face(s) for {}",
        embedder.name(),
        faces.len(),
        image_path.display()
    );

    faces
        .into_iter()
        .next()
        .map(|face| face.embedding)
        .ok_or(FaceError::NoFaceDetected)
}
