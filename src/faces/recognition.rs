// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Face recognition model (ArcFace-style)
//!
//! Takes a 112x112 RGB face crop and produces an identity embedding. The
//! embedding width is whatever the model outputs; it is never hard-coded.

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

/// Side of the square crop fed to the recognizer
pub const RECOGNITION_INPUT_SIZE: u32 = 112;

/// Extra context kept around the detected box, as a fraction of its size
const CROP_MARGIN: f32 = 0.1;

#[derive(Clone)]
pub struct FaceRecognitionModel {
    session: Arc<Mutex<Session>>,
    input_name: String,
}

impl std::fmt::Debug for FaceRecognitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaceRecognitionModel")
            .field("input_name", &self.input_name)
            .finish_non_exhaustive()
    }
}

impl FaceRecognitionModel {
    pub fn new<P: AsRef<Path>>(model_path: P, intra_threads: usize) -> Result<Self> {
        let model_path = model_path.as_ref();

        if !model_path.exists() {
            anyhow::bail!(
                "Face recognition model not found: {}",
                model_path.display()
            );
        }

        info!("Loading face recognition model from {}", model_path.display());

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
                "Failed to load face recognition model from {}",
                model_path.display()
            ))?;

        let input_name = session
            .inputs
            .first()
            .map(|input| input.name.clone())
            .unwrap_or_else(|| "input.1".to_string());

        debug!("Recognition model loaded - input: {}", input_name);

        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            input_name,
        })
    }

    /// Embed the face inside `bbox`; the result is L2-normalized
    pub fn embed(&self, image: &RgbImage, bbox: &FaceBox) -> Result<Vec<f32>, FaceError> {
        let crop = crop_face(image, bbox).ok_or_else(|| {
            FaceError::Inference(format!("face box {:?} lies outside the image", bbox))
        })?;
        let input = preprocess(&crop);

        let mut session = self
            .session
            .lock()
            .map_err(|_| FaceError::Inference("recognition session lock poisoned".to_string()))?;

        let input_value =
            Value::from_array(input).map_err(|e| FaceError::Inference(e.to_string()))?;
        let outputs = session
            .run(ort::inputs![self.input_name.as_str() => input_value])
            .map_err(|e| FaceError::Inference(format!("recognition run failed: {}", e)))?;

        // Use index [0]; exported ArcFace graphs disagree on the output name
        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| FaceError::Inference(format!("bad recognition output: {}", e)))?;

        if output.ndim() != 2 || output.shape()[0] != 1 || output.shape()[1] == 0 {
            return Err(FaceError::Inference(format!(
                "unexpected recognition output shape: {:?}",
                output.shape()
            )));
        }

        let mut embedding: Vec<f32> = output.iter().copied().collect();
        l2_normalize(&mut embedding);
        Ok(embedding)
    }
}

/// Square crop around the box centre with a small margin, clamped to the image
pub fn crop_face(image: &RgbImage, bbox: &FaceBox) -> Option<RgbImage> {
    let (width, height) = image.dimensions();
    let side = bbox.width().max(bbox.height()) * (1.0 + 2.0 * CROP_MARGIN);
    if side < 1.0 {
        return None;
    }

    let cx = (bbox.x1 + bbox.x2) / 2.0;
    let cy = (bbox.y1 + bbox.y2) / 2.0;

    let x1 = (cx - side / 2.0).max(0.0).floor() as u32;
    let y1 = (cy - side / 2.0).max(0.0).floor() as u32;
    let x2 = ((cx + side / 2.0).ceil() as u32).min(width);
    let y2 = ((cy + side / 2.0).ceil() as u32).min(height);

    if x2 <= x1 || y2 <= y1 {
        return None;
    }

    let crop = image::imageops::crop_imm(image, x1, y1, x2 - x1, y2 - y1).to_image();
    Some(image::imageops::resize(
        &crop,
        RECOGNITION_INPUT_SIZE,
        RECOGNITION_INPUT_SIZE,
        FilterType::Triangle,
    ))
}

/// Pack a 112x112 crop into NCHW, normalized as `(px - 127.5) / 127.5`
pub fn preprocess(crop: &RgbImage) -> Array4<f32> {
    let size = RECOGNITION_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, 3, size, size));
    for (x, y, pixel) in crop.enumerate_pixels() {
        if (x as usize) < size && (y as usize) < size {
            for c in 0..3 {
                tensor[[0, c, y as usize, x as usize]] = (pixel[c] as f32 - 127.5) / 127.5;
            }
        }
    }
    tensor
}

pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }
}
