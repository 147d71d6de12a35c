// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Per-request staging of decoded images on disk
//!
//! The face models load images from a path, so each request writes its
//! bytes to a uniquely named temp file. The file lives exactly as long as
//! its [`StagedImage`]: dropping the handle deletes it on every path.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use super::image_utils::staging_extension;

const STAGING_PREFIX: &str = "persona-";

/// A decoded image written to the staging directory
#[derive(Debug)]
pub struct StagedImage {
    file: NamedTempFile,
    size_bytes: usize,
}

impl StagedImage {
    /// Write `bytes` to a fresh file in `dir`
    ///
    /// Names are random and created exclusively, so concurrent requests can
    /// never collide, whatever `uid` the clients send.
    pub fn create(dir: &Path, bytes: &[u8]) -> io::Result<Self> {
        let suffix = format!(".{}", staging_extension(bytes));
        let mut file = tempfile::Builder::new()
            .prefix(STAGING_PREFIX)
            .suffix(&suffix)
            .tempfile_in(dir)?;

        file.write_all(bytes)?;
        file.flush()?;

        Ok(Self {
            file,
            size_bytes: bytes.len(),
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn size_bytes(&self) -> usize {
        self.size_bytes
    }

    /// Delete the file now, reporting any error
    ///
    /// Returns the path that was removed, for logging.
    pub fn close(self) -> io::Result<PathBuf> {
        let path = self.file.path().to_path_buf();
        self.file.close()?;
        Ok(path)
    }
}
