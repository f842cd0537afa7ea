use axum::{
    Router,
    extract::{Path, State, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use uuid::Uuid;

use crate::{error::AppError, services::{game_service, ws_service}, state::SharedState};

#[utoipa::path(
    get,
    path = "/games/{id}/ws",
    tag = "rooms",
    params(("id" = Uuid, Path, description = "Identifier of the game room to join")),
    responses(
        (status = 101, description = "Switching protocols to WebSocket"),
        (status = 404, description = "Unknown game")
    )
)]
/// Upgrade the HTTP connection into a session-room WebSocket.
pub async fn ws_handler(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, AppError> {
    // Refuse the upgrade outright for unknown games instead of accepting a
    // socket that can never identify.
    game_service::load_game(&state, id).await?;

    let shared_state = state.clone();
    Ok(ws.on_upgrade(move |socket| ws_service::handle_socket(shared_state, id, socket)))
}

/// Configure the WebSocket endpoint.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/games/{id}/ws", get(ws_handler))
}
