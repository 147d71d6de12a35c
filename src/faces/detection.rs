// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Face detection model (UltraFace RFB-320)
//!
//! Input is a 320x240 RGB tensor normalized as `(px - 127) / 128`.
//! Outputs are per-anchor class scores `[1, N, 2]` and boxes `[1, N, 4]`
//! given as normalized corners `(x1, y1, x2, y2)`.

use anyhow::{Context, Result};
use image::{imageops::FilterType, RgbImage};
use ndarray::Array4;
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

use super::embedder::{FaceBox, FaceError};

/// Detector input width
pub const DETECTION_INPUT_WIDTH: u32 = 320;
/// Detector input height
pub const DETECTION_INPUT_HEIGHT: u32 = 240;

/// A face candidate in source image pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub bbox: FaceBox,
    pub score: f32,
}

/// UltraFace detection model
#[derive(Clone)]
pub struct FaceDetectionModel {
    /// ONNX Runtime session (thread-safe)
    session: Arc<Mutex<Session>>,
    /// Model input name
    input_name: String,
    /// Minimum face score kept before NMS
    score_threshold: f32,
    /// IoU above which overlapping candidates are suppressed
    iou_threshold: f32,
}

impl std::fmt::Debug for FaceDetectionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceDetectionModel")
            .field("input_name", &self.input_name)
            .field("score_threshold", &self.score_threshold)
            .field("iou_threshold", &self.iou_threshold)
            .finish_non_exhaustive()
    }
}

impl FaceDetectionModel {
    /// Load the detector from an ONNX file
    ///
    /// # Errors
    /// Returns error if the file is missing or ONNX Runtime rejects it.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        score_threshold: f32,
        iou_threshold: f32,
        intra_threads: usize,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!("Face detection model not found: {}", model_path.display());
        }

        info!("Loading face detection model from {}", model_path.display());

        let session = Session::builder()
            .context("Failed to create session builder")?
            .with_execution_providers([CPUExecutionProvider::default().build()])
            .context("Failed to set CPU execution provider")?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .context("Failed to set optimization level")?
            .with_intra_threads(intra_threads)
            .context("Failed to set intra threads")?
            .commit_from_file(model_path)
            .context(format!(
                "Failed to load face detection model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input".to_string());

        debug!("Detection model loaded - input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
            score_threshold,
            iou_threshold,
        })
    }

    /// Detect faces, returned in descending score order
    pub fn detect(&self, image: &RgbImage) -> Result<Vec<Detection>, FaceError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Ok(Vec::new());
        }

        let input = preprocess(image);

        let mut session = self
            .session
            .lock()
            .map_err(|_| FaceError::Inference("detection session lock poisoned".to_string()))?;

        let input_value =
            Value::from_array(input).map_err(|e| FaceError::Inference(e.to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| FaceError::Inference(format!("detection run failed: {}", e)))?;

        let scores = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| FaceError::Inference(format!("bad detection scores: {}", e)))?;
        let boxes = outputs[1]
            .try_extract_array::<f32>()
            .map_err(|e| FaceError::Inference(format!("bad detection boxes: {}", e)))?;

        let anchors = anchor_count(scores.shape(), boxes.shape())?;

        let (w, h) = (width as f32, height as f32);
        let mut candidates = Vec::new();
        for anchor in 0..anchors {
            let score = scores[[0, anchor, 1]];
            if score < self.score_threshold {
                continue;
            }
            let bbox = FaceBox {
                x1: (boxes[[0, anchor, 0]] * w).clamp(0.0, w),
                y1: (boxes[[0, anchor, 1]] * h).clamp(0.0, h),
                x2: (boxes[[0, anchor, 2]] * w).clamp(0.0, w),
                y2: (boxes[[0, anchor, 3]] * h).clamp(0.0, h),
            };
            if bbox.area() > 0.0 {
                candidates.push(Detection { bbox, score });
            }
        }

        let detections = non_max_suppression(candidates, self.iou_threshold);
        debug!("Detected {} face(s) in {}x{} image", detections.len(), width, height);

        Ok(detections)
    }
}

/// Resize to the detector input and pack into NCHW
pub fn preprocess(image: &RgbImage) -> Array4<f32> {
    let resized = image::imageops::resize(
        image,
        DETECTION_INPUT_WIDTH,
        DETECTION_INPUT_HEIGHT,
        FilterType::Triangle,
    );

    let mut tensor = Array4::<f32>::zeros((
        1,
        3,
        DETECTION_INPUT_HEIGHT as usize,
        DETECTION_INPUT_WIDTH as usize,
    ));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - 127.0) / 128.0;
        }
    }
    tensor
}

/// Number of anchors in the detector outputs, once their shapes check out
///
/// Expects scores `[B, N, 2]` and boxes `[B, N, 4]` with `B >= 1`; only the
/// first batch entry is read.
pub fn anchor_count(score_shape: &[usize], box_shape: &[usize]) -> Result<usize, FaceError> {
    let valid = score_shape.len() == 3
        && box_shape.len() == 3
        && score_shape[0] >= 1
        && box_shape[0] >= 1
        && score_shape[2] == 2
        && box_shape[2] == 4
        && score_shape[1] == box_shape[1];

    if !valid {
        return Err(FaceError::Inference(format!(
            "unexpected detection output shapes: scores {:?}, boxes {:?}",
            score_shape, box_shape
        )));
    }
    Ok(score_shape[1])
}

/// Hard NMS. Output is sorted by descending score, ties by left edge.
pub fn non_max_suppression(mut candidates: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    candidates.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.bbox.x1.total_cmp(&b.bbox.x1))
    });

    let mut kept: Vec<Detection> = Vec::new();
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| k.bbox.iou(&candidate.bbox) <= iou_threshold)
        {
            kept.push(candidate);
        }
    }
    kept
}
