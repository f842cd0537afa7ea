use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{services::documentation::ApiDoc, state::SharedState};

/// Game definition and snapshot routes.
pub mod game;
/// Health check route.
pub mod health;
/// Session-room WebSocket route.
pub mod websocket;

/// Compose all route trees and mount the Swagger UI over the generated
/// OpenAPI document, wiring in shared state.
pub fn router(state: SharedState) -> Router<()> {
    health::router()
        .merge(game::router())
        .merge(websocket::router())
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
