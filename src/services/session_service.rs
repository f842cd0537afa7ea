//! Host-driven session lifecycle: start, navigation, break screens,
//! completion, and team registration.
//!
//! Every public operation takes the per-session gate before touching the
//! store, so pointer moves, pool reseeds and registrations are serialized
//! per game while distinct games proceed in parallel. The persisted record
//! is always updated before any room event goes out.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, GameStatusEntity, TeamEntity},
    error::ServiceError,
    services::{events, game_service},
    state::{
        SharedState,
        machine::{self, Direction},
        session::{GameSession, PointSystem, SessionPointer, Team},
    },
};

/// Start a pending session at the first question of the first round.
pub async fn start_session(state: &SharedState, game_id: Uuid) -> Result<(), ServiceError> {
    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    let teams = load_teams(state, game_id).await?;

    let (status, pointer) = machine::start(&game, &teams)?;
    persist_status(state, &game, status).await?;
    state
        .store()
        .save_game_state(game_id, pointer.into())
        .await?;

    info!(%game_id, "session started");
    events::broadcast_session_started(state, game_id);
    Ok(())
}

/// Step the session pointer one question forward or backward.
pub async fn advance_session(
    state: &SharedState,
    game_id: Uuid,
    direction: Direction,
) -> Result<(), ServiceError> {
    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    let pointer = load_pointer(state, game_id).await?;
    let teams = load_teams(state, game_id).await?;

    let outcome = machine::advance(&game, &pointer, direction, &teams)?;
    state
        .store()
        .save_game_state(game_id, outcome.pointer.clone().into())
        .await?;

    let (Some(round_id), Some(question_id)) = (
        outcome.pointer.current_round_id,
        outcome.pointer.current_question_id,
    ) else {
        return Err(ServiceError::InvalidState(
            "advance produced an unpositioned pointer".into(),
        ));
    };

    info!(%game_id, %round_id, %question_id, round_changed = outcome.round_changed, "session advanced");
    events::broadcast_question_advanced(state, game_id, round_id, question_id);
    Ok(())
}

/// Raise or lower the break screen without moving the pointer.
pub async fn set_transitioning(
    state: &SharedState,
    game_id: Uuid,
    transitioning: bool,
) -> Result<(), ServiceError> {
    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    if game.status != crate::state::session::GameStatus::InProgress {
        return Err(ServiceError::InvalidState(
            "break screens only apply to an in-progress session".into(),
        ));
    }

    let pointer = load_pointer(state, game_id).await?;
    let next = machine::set_transitioning(&pointer, transitioning);
    state.store().save_game_state(game_id, next.into()).await?;

    events::broadcast_transition_changed(state, game_id, transitioning);
    Ok(())
}

/// Complete the session on its last question and tear down the pointer.
///
/// Completion keeps the game record and answer ledger so the host can still
/// adjudicate late; only the mutable pointer is deleted.
pub async fn complete_session(state: &SharedState, game_id: Uuid) -> Result<(), ServiceError> {
    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    if game.status == crate::state::session::GameStatus::Completed {
        // Already terminal: acknowledge without re-announcing.
        return Ok(());
    }

    let pointer = load_pointer(state, game_id).await?;
    let status = machine::complete(&game, &pointer)?;
    persist_status(state, &game, status).await?;
    state.store().delete_game_state(game_id).await?;

    info!(%game_id, "session completed");
    events::broadcast_session_completed(state, game_id);
    Ok(())
}

/// Toggle whether team clients can see the standings.
pub async fn set_score_visibility(
    state: &SharedState,
    game_id: Uuid,
    visible: bool,
) -> Result<(), ServiceError> {
    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    let mut entity: GameEntity = game.into();
    entity.scores_visible = visible;
    entity.updated_at = OffsetDateTime::now_utc();
    state.store().save_game(entity).await?;

    if let Some(room) = state.rooms().existing_room(game_id) {
        room.set_scores_visible(visible);
    }
    events::broadcast_score_visibility(state, game_id, visible);
    Ok(())
}

/// Register (or re-register) a team for a session.
///
/// Registration is an upsert keyed on the team identity, so a reconnect with
/// a changed display name updates the stored row without duplicating it. A
/// team joining mid-way through a pool round gets that round's full pool
/// seeded immediately.
pub async fn register_team(
    state: &SharedState,
    game_id: Uuid,
    team_id: Uuid,
    team_name: &str,
) -> Result<(), ServiceError> {
    let name = team_name.trim();
    if name.is_empty() {
        return Err(ServiceError::InvalidInput(
            "team name must not be empty".into(),
        ));
    }

    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    if game.status == crate::state::session::GameStatus::Completed {
        return Err(ServiceError::InvalidState(
            "registration is closed once the session has completed".into(),
        ));
    }

    let teams = load_teams(state, game_id).await?;
    let joined_at = teams
        .iter()
        .find(|team| team.id == team_id)
        .map(|team| team.joined_at)
        .unwrap_or_else(OffsetDateTime::now_utc);

    state
        .store()
        .upsert_team(
            game_id,
            TeamEntity {
                id: team_id,
                name: name.to_string(),
                joined_at,
            },
        )
        .await?;

    seed_pool_for_late_joiner(state, &game, game_id, team_id).await?;

    info!(%game_id, %team_id, team_name = name, "team registered");
    Ok(())
}

async fn seed_pool_for_late_joiner(
    state: &SharedState,
    game: &GameSession,
    game_id: Uuid,
    team_id: Uuid,
) -> Result<(), ServiceError> {
    let Some(entity) = state.store().find_game_state(game_id).await? else {
        return Ok(());
    };
    let pointer = SessionPointer::from(entity);
    let Some(round) = pointer
        .current_round_id
        .and_then(|round_id| game.round(round_id))
    else {
        return Ok(());
    };
    let PointSystem::Pool { point_pool } = &round.points else {
        return Ok(());
    };
    if pointer.points_remaining.contains_key(&team_id) {
        return Ok(());
    }

    let mut next = pointer;
    next.points_remaining.insert(team_id, point_pool.clone());
    state.store().save_game_state(game_id, next.into()).await?;
    Ok(())
}

async fn persist_status(
    state: &SharedState,
    game: &GameSession,
    status: crate::state::session::GameStatus,
) -> Result<(), ServiceError> {
    let mut entity: GameEntity = game.clone().into();
    entity.status = GameStatusEntity::from(status);
    entity.updated_at = OffsetDateTime::now_utc();
    state.store().save_game(entity).await?;
    Ok(())
}

async fn load_teams(state: &SharedState, game_id: Uuid) -> Result<Vec<Team>, ServiceError> {
    let teams = state.store().find_teams(game_id).await?;
    Ok(teams.into_iter().map(Team::from).collect())
}

pub(crate) async fn load_pointer(
    state: &SharedState,
    game_id: Uuid,
) -> Result<SessionPointer, ServiceError> {
    let Some(entity) = state.store().find_game_state(game_id).await? else {
        return Err(ServiceError::InvalidState(
            "no active session pointer for this game".into(),
        ));
    };
    Ok(entity.into())
}
