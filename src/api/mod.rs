// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
pub mod errors;
pub mod handlers;
pub mod http_server;
pub mod render_persona;

pub use errors::{ApiError, ApiErrorResponse, ErrorResponse};
pub use handlers::HealthResponse;
pub use http_server::{create_app, start_server, AppState};
pub use render_persona::{render_persona_handler, PersonaRequest, PersonaResponse};
