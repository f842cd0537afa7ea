use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;
use serde::Deserialize;
use utoipa::IntoParams;
use uuid::Uuid;

use crate::{
    dto::{
        game::{CreateGameRequest, GameListItem, GameSummary},
        snapshot::StateSnapshot,
    },
    error::AppError,
    services::game_service::{self, SnapshotView},
    state::SharedState,
};

/// Query options for the snapshot route.
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct SnapshotQuery {
    /// Render the host view, which keeps standings even while hidden.
    #[serde(default)]
    pub host: bool,
}

/// Routes handling game definitions and the derived state snapshot.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game).get(list_games))
        .route("/games/{id}", get(get_game))
        .route("/games/{id}/snapshot", get(get_snapshot))
}

/// Create a fresh game definition and persist it.
#[utoipa::path(
    post,
    path = "/games",
    tag = "games",
    request_body = CreateGameRequest,
    responses(
        (status = 200, description = "Game created", body = GameSummary),
        (status = 400, description = "Payload failed validation")
    )
)]
pub async fn create_game(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<CreateGameRequest>>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::create_game(&state, payload).await?;
    Ok(Json(summary))
}

/// List stored games, most recently updated first.
#[utoipa::path(
    get,
    path = "/games",
    tag = "games",
    responses((status = 200, description = "Stored games", body = [GameListItem]))
)]
pub async fn list_games(
    State(state): State<SharedState>,
) -> Result<Json<Vec<GameListItem>>, AppError> {
    let games = game_service::list_games(&state).await?;
    Ok(Json(games))
}

/// Fetch the full host view of a stored game.
#[utoipa::path(
    get,
    path = "/games/{id}",
    tag = "games",
    params(("id" = Uuid, Path, description = "Identifier of the game")),
    responses(
        (status = 200, description = "Game definition", body = GameSummary),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_game(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<GameSummary>, AppError> {
    let summary = game_service::get_game(&state, id).await?;
    Ok(Json(summary))
}

/// Build the derived snapshot a late-joining client renders from.
#[utoipa::path(
    get,
    path = "/games/{id}/snapshot",
    tag = "games",
    params(
        ("id" = Uuid, Path, description = "Identifier of the game"),
        SnapshotQuery
    ),
    responses(
        (status = 200, description = "Current session snapshot", body = StateSnapshot),
        (status = 404, description = "Unknown game")
    )
)]
pub async fn get_snapshot(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
    Query(query): Query<SnapshotQuery>,
) -> Result<Json<StateSnapshot>, AppError> {
    let view = if query.host {
        SnapshotView::Host
    } else {
        SnapshotView::Team
    };
    let snapshot = game_service::snapshot(&state, id, view).await?;
    Ok(Json(snapshot))
}
