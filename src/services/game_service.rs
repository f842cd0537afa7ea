//! Game definition management and the snapshot projection.

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    dao::models::{GameEntity, QuestionEntity, RoundEntity},
    dto::{
        game::{CreateGameRequest, GameListItem, GameSummary, QuestionInput, RoundInput},
        snapshot::{PublicQuestion, PublicRound, StateSnapshot, TeamStanding},
    },
    error::ServiceError,
    services::scoring,
    state::{SharedState, session::GameSession},
};

/// Bootstrap a fresh game definition.
///
/// The request has already passed payload validation at the route boundary;
/// this assigns identifiers and dense sort orders from the input order.
pub async fn create_game(
    state: &SharedState,
    request: CreateGameRequest,
) -> Result<GameSummary, ServiceError> {
    let now = OffsetDateTime::now_utc();
    let entity = GameEntity {
        id: Uuid::new_v4(),
        name: request.name.trim().to_string(),
        status: crate::dao::models::GameStatusEntity::Pending,
        scores_visible: true,
        rounds: build_rounds(request.rounds),
        created_at: now,
        updated_at: now,
    };

    state.store().save_game(entity.clone()).await?;

    Ok(GameSession::from(entity).into())
}

/// Fetch the full host view of a stored game.
pub async fn get_game(state: &SharedState, game_id: Uuid) -> Result<GameSummary, ServiceError> {
    let game = load_game(state, game_id).await?;
    Ok(game.into())
}

/// List stored games, most recently updated first.
pub async fn list_games(state: &SharedState) -> Result<Vec<GameListItem>, ServiceError> {
    let items = state.store().list_games().await?;
    Ok(items
        .into_iter()
        .map(|item| GameListItem {
            id: item.id,
            name: item.name,
            status: item.status.into(),
            updated_at: crate::dto::format_timestamp(item.updated_at),
        })
        .collect())
}

/// Which audience a snapshot is rendered for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotView {
    /// The host console; always sees the standings.
    Host,
    /// Team and spectator clients; standings follow the visibility flag.
    Team,
}

/// Build the derived state snapshot a late-joining client renders from.
///
/// Standings are recomputed from the answer ledger on every call; when the
/// host keeps scores hidden the per-team totals are withheld from the team
/// view but the roster rows still appear. The host view keeps the totals.
pub async fn snapshot(
    state: &SharedState,
    game_id: Uuid,
    view: SnapshotView,
) -> Result<StateSnapshot, ServiceError> {
    let game = load_game(state, game_id).await?;
    let pointer = state
        .store()
        .find_game_state(game_id)
        .await?
        .map(crate::state::session::SessionPointer::from)
        .unwrap_or_default();

    let current_round = pointer
        .current_round_id
        .and_then(|round_id| game.round(round_id))
        .map(PublicRound::from);
    let current_question = pointer
        .current_question_id
        .and_then(|question_id| game.question(question_id))
        .map(|(_, question)| PublicQuestion::from(question));

    let teams = state.store().find_teams(game_id).await?;
    let scores_included = view == SnapshotView::Host || game.scores_visible;
    let mut standings = Vec::with_capacity(teams.len());
    for team in teams {
        let answers = state.store().find_answers_for_team(game_id, team.id).await?;
        let submitted = pointer
            .current_question_id
            .is_some_and(|question_id| answers.iter().any(|a| a.question_id == question_id));
        standings.push(TeamStanding {
            team_id: team.id,
            name: team.name,
            score: scores_included.then(|| scoring::cumulative_score(&answers)),
            submitted,
            points_remaining: pointer.points_remaining.get(&team.id).cloned(),
        });
    }

    Ok(StateSnapshot {
        status: crate::dao::models::GameStatusEntity::from(game.status).into(),
        current_round_id: pointer.current_round_id,
        current_question_id: pointer.current_question_id,
        transitioning: pointer.transitioning,
        scores_visible: game.scores_visible,
        current_round,
        current_question,
        standings,
    })
}

/// Fetch a game or fail with `NotFound`.
pub(crate) async fn load_game(
    state: &SharedState,
    game_id: Uuid,
) -> Result<GameSession, ServiceError> {
    let Some(entity) = state.store().find_game(game_id).await? else {
        return Err(ServiceError::NotFound(format!("game `{game_id}` not found")));
    };
    Ok(entity.into())
}

fn build_rounds(rounds: Vec<RoundInput>) -> Vec<RoundEntity> {
    rounds
        .into_iter()
        .enumerate()
        .map(|(round_index, round)| RoundEntity {
            id: Uuid::new_v4(),
            sort_order: round_index as u32,
            round_type: round.round_type.into(),
            points: round.point_system.into(),
            questions: build_questions(round.questions),
        })
        .collect()
}

fn build_questions(questions: Vec<QuestionInput>) -> Vec<QuestionEntity> {
    questions
        .into_iter()
        .enumerate()
        .map(|(question_index, question)| QuestionEntity {
            id: Uuid::new_v4(),
            sort_order: question_index as u32,
            kind: question.kind.into(),
            prompt: question.prompt.trim().to_string(),
            options: question.options,
            correct: question.correct,
        })
        .collect()
}
