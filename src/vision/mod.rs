// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Image intake: base64 payload decoding and on-disk staging

pub mod image_utils;
pub mod staging;

pub use image_utils::{decode_base64_payload, detect_format, staging_extension, ImageError};
pub use staging::StagedImage;
