// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persona render response type

use serde::{Deserialize, Serialize};

/// Successful response: the first face's embedding, as produced by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersonaResponse {
    pub vector: Vec<f32>,
}

impl PersonaResponse {
    pub fn new(vector: Vec<f32>) -> Self {
        Self { vector }
    }
}
