// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Persona render endpoint module
//!
//! Provides POST /renderPersona for turning a face photo into an embedding.

pub mod handler;
pub mod request;
pub mod response;

pub use handler::render_persona_handler;
pub use request::PersonaRequest;
pub use response::PersonaResponse;
