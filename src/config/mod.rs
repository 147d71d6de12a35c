// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Service configuration from CLI flags with environment fallbacks

use anyhow::{bail, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::faces::FaceModelConfig;

pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8000";
pub const DEFAULT_DETECTOR_MODEL: &str = "./models/face-detector/version-RFB-320.onnx";
pub const DEFAULT_RECOGNIZER_MODEL: &str = "./models/face-recognizer/arcface.onnx";
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Persona render service
#[derive(Parser, Debug, Clone)]
#[command(name = "persona-render")]
#[command(version)]
#[command(about = "Face embedding service behind POST /renderPersona", long_about = None)]
pub struct ServiceConfig {
    /// Address the HTTP server binds to
    #[arg(long, env = "PERSONA_LISTEN_ADDR", default_value = DEFAULT_LISTEN_ADDR)]
    pub listen_addr: SocketAddr,

    /// Directory for per-request staged images (defaults to the OS temp dir)
    #[arg(long, env = "PERSONA_STAGING_DIR")]
    pub staging_dir: Option<PathBuf>,

    /// UltraFace detector ONNX file
    #[arg(long, env = "PERSONA_DETECTOR_MODEL", default_value = DEFAULT_DETECTOR_MODEL)]
    pub detector_model: PathBuf,

    /// ArcFace recognizer ONNX file
    #[arg(long, env = "PERSONA_RECOGNIZER_MODEL", default_value = DEFAULT_RECOGNIZER_MODEL)]
    pub recognizer_model: PathBuf,

    /// Minimum face detection score
    #[arg(long, env = "PERSONA_SCORE_THRESHOLD", default_value_t = 0.7)]
    pub score_threshold: f32,

    /// Overlap above which weaker detections are suppressed
    #[arg(long, env = "PERSONA_IOU_THRESHOLD", default_value_t = 0.3)]
    pub iou_threshold: f32,

    /// ONNX Runtime intra-op threads per session
    #[arg(long, env = "PERSONA_INTRA_THREADS", default_value_t = 4)]
    pub intra_threads: usize,

    /// Extractions allowed to run at once (defaults to the CPU count)
    #[arg(long, env = "PERSONA_MAX_CONCURRENT_EXTRACTIONS")]
    pub max_concurrent_extractions: Option<usize>,

    /// Per-request extraction timeout in seconds, 0 disables it
    #[arg(long, env = "PERSONA_EXTRACTION_TIMEOUT_SECS", default_value_t = 30)]
    pub extraction_timeout_secs: u64,

    /// Largest accepted request body
    #[arg(long, env = "PERSONA_MAX_BODY_BYTES", default_value_t = DEFAULT_MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            staging_dir: None,
            detector_model: PathBuf::from(DEFAULT_DETECTOR_MODEL),
            recognizer_model: PathBuf::from(DEFAULT_RECOGNIZER_MODEL),
            score_threshold: 0.7,
            iou_threshold: 0.3,
            intra_threads: 4,
            max_concurrent_extractions: None,
            extraction_timeout_secs: 30,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

impl ServiceConfig {
    pub fn staging_dir(&self) -> PathBuf {
        self.staging_dir.clone().unwrap_or_else(std::env::temp_dir)
    }

    pub fn max_concurrent_extractions(&self) -> usize {
        self.max_concurrent_extractions.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        })
    }

    pub fn extraction_timeout(&self) -> Option<Duration> {
        match self.extraction_timeout_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    pub fn face_model_config(&self) -> FaceModelConfig {
        FaceModelConfig {
            detector_path: self.detector_model.clone(),
            recognizer_path: self.recognizer_model.clone(),
            score_threshold: self.score_threshold,
            iou_threshold: self.iou_threshold,
            intra_threads: self.intra_threads,
        }
    }

    /// Reject settings the service cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.max_concurrent_extractions == Some(0) {
            bail!("max_concurrent_extractions must be at least 1");
        }
        if !(self.score_threshold > 0.0 && self.score_threshold <= 1.0) {
            bail!(
                "score_threshold must be in (0, 1], got {}",
                self.score_threshold
            );
        }
        if !(self.iou_threshold > 0.0 && self.iou_threshold <= 1.0) {
            bail!("iou_threshold must be in (0, 1], got {}", self.iou_threshold);
        }
        if self.max_body_bytes == 0 {
            bail!("max_body_bytes must be greater than 0");
        }
        let staging_dir = self.staging_dir();
        if !staging_dir.is_dir() {
            bail!("staging directory does not exist: {}", staging_dir.display());
        }
        Ok(())
    }
}
