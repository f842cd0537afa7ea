//! Answer ledger: at-most-once submission and host adjudication.
//!
//! Submission order under the gate matters: the pool selection is validated,
//! the answer row is inserted (which is where duplicates are refused), and
//! only then is the consumed pool value written back to the pointer. A
//! rejected duplicate therefore never burns a pool value.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        models::{AnswerEntity, AnswerItemEntity, AnswerValueEntity},
        store::InsertOutcome,
    },
    dto::ws::AnswerValueDto,
    error::ServiceError,
    services::{events, game_service, scoring, session_service},
    state::{
        SharedState,
        session::{GameStatus, PointSystem, QuestionKind, RoundType},
    },
};

/// Result of an adjudication, surfaced in the ack payload and broadcast as a
/// score update.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct AdjudicationOutcome {
    /// Team whose answer was judged.
    pub team_id: Uuid,
    /// The team's new cumulative score.
    pub score: i64,
}

/// Record a team's answer for the current question.
pub async fn submit(
    state: &SharedState,
    game_id: Uuid,
    team_id: Uuid,
    question_id: Uuid,
    value: AnswerValueDto,
    points_used: Option<i64>,
) -> Result<(), ServiceError> {
    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    if game.status != GameStatus::InProgress {
        return Err(ServiceError::InvalidState(
            "answers are only accepted while the session is in progress".into(),
        ));
    }

    let pointer = session_service::load_pointer(state, game_id).await?;
    if pointer.transitioning {
        return Err(ServiceError::QuestionClosed(
            "the break screen is up".into(),
        ));
    }
    if pointer.current_question_id != Some(question_id) {
        return Err(ServiceError::QuestionClosed(
            "this is not the current question".into(),
        ));
    }

    let (round, question) = game
        .question(question_id)
        .ok_or_else(|| ServiceError::NotFound(format!("question `{question_id}` not found")))?;

    // Shape mismatches are refused up front: a text payload stored against a
    // list question would carry no adjudicable items, and the at-most-once
    // rule would block the corrected resubmission.
    match (&value, question.kind) {
        (AnswerValueDto::List { values }, QuestionKind::List | QuestionKind::Ordered) => {
            if values.is_empty() {
                return Err(ServiceError::InvalidInput(
                    "an item list must not be empty".into(),
                ));
            }
        }
        (AnswerValueDto::Text { .. }, QuestionKind::List) => {
            return Err(ServiceError::InvalidInput(
                "a list question requires a list of items".into(),
            ));
        }
        (AnswerValueDto::List { .. }, _) => {
            return Err(ServiceError::InvalidInput(
                "only list and ordered questions take a list of items".into(),
            ));
        }
        (AnswerValueDto::Text { .. }, _) => {}
    }

    let is_wager = round.round_type == RoundType::Wager || question.kind == QuestionKind::Wager;
    let recorded_points = if is_wager {
        let wager = points_used.ok_or_else(|| {
            ServiceError::InvalidInput("a wager question requires points_used".into())
        })?;
        let answers = state.store().find_answers_for_team(game_id, team_id).await?;
        scoring::validate_wager(wager, scoring::cumulative_score(&answers))?;
        Some(wager)
    } else {
        match &round.points {
            PointSystem::Flat { .. } => None,
            PointSystem::Pool { .. } => {
                let value = points_used.ok_or_else(|| {
                    ServiceError::InvalidInput("a pool round requires points_used".into())
                })?;
                let remaining = pointer
                    .points_remaining
                    .get(&team_id)
                    .map(Vec::as_slice)
                    .unwrap_or_default();
                if !remaining.contains(&value) {
                    return Err(ServiceError::InvalidPointSelection { value });
                }
                Some(value)
            }
        }
    };

    let entity_value = AnswerValueEntity::from(value);
    let suggested_correct = scoring::suggest_verdict(question, &entity_value);
    let items = match (&entity_value, question.kind) {
        (AnswerValueEntity::List { values }, QuestionKind::List) => values
            .iter()
            .map(|item| AnswerItemEntity {
                value: item.clone(),
                is_correct: None,
            })
            .collect(),
        _ => Vec::new(),
    };

    let answer = AnswerEntity {
        id: Uuid::new_v4(),
        team_id,
        question_id,
        value: entity_value,
        points_used: recorded_points,
        is_correct: None,
        awarded_points: 0,
        items,
    };

    match state.store().create_answer(game_id, answer).await? {
        InsertOutcome::Inserted => {}
        InsertOutcome::DuplicateAnswer => {
            return Err(ServiceError::DuplicateSubmission {
                team_id,
                question_id,
            });
        }
    }

    // The selection is consumed only after the insert landed.
    if !is_wager
        && let PointSystem::Pool { .. } = &round.points
        && let Some(value) = recorded_points
    {
        let mut next = pointer;
        if let Some(remaining) = next.points_remaining.get_mut(&team_id)
            && let Some(position) = remaining.iter().position(|&v| v == value)
        {
            remaining.remove(position);
        }
        state.store().save_game_state(game_id, next.into()).await?;
    }

    info!(%game_id, %team_id, %question_id, "answer submitted");
    events::broadcast_answer_submitted(state, game_id, team_id, question_id, suggested_correct);
    Ok(())
}

/// Judge a whole answer. List answers must be judged per item instead.
///
/// Adjudication stays available after the session completes so the host can
/// correct verdicts; every re-judgement overwrites the previous award and the
/// derived score follows.
pub async fn adjudicate(
    state: &SharedState,
    game_id: Uuid,
    answer_id: Uuid,
    correct: bool,
) -> Result<AdjudicationOutcome, ServiceError> {
    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    let mut answer = load_answer(state, game_id, answer_id).await?;
    let (round, question) = game
        .question(answer.question_id)
        .ok_or_else(|| ServiceError::NotFound(format!("question `{}` not found", answer.question_id)))?;

    if question.kind == QuestionKind::List {
        return Err(ServiceError::InvalidInput(
            "list answers are judged per item".into(),
        ));
    }

    answer.is_correct = Some(correct);
    answer.awarded_points = scoring::award_for_verdict(round, question, &answer, correct);
    finish_adjudication(state, game_id, answer, game.scores_visible).await
}

/// Judge one item of a list answer and recompute its total.
pub async fn adjudicate_item(
    state: &SharedState,
    game_id: Uuid,
    answer_id: Uuid,
    item_index: usize,
    correct: bool,
) -> Result<AdjudicationOutcome, ServiceError> {
    let gate = state.session_gate(game_id);
    let _guard = gate.lock().await;

    let game = game_service::load_game(state, game_id).await?;
    let mut answer = load_answer(state, game_id, answer_id).await?;
    let (round, question) = game
        .question(answer.question_id)
        .ok_or_else(|| ServiceError::NotFound(format!("question `{}` not found", answer.question_id)))?;

    if question.kind != QuestionKind::List {
        return Err(ServiceError::InvalidInput(
            "only list answers carry adjudicable items".into(),
        ));
    }
    let Some(item) = answer.items.get_mut(item_index) else {
        return Err(ServiceError::InvalidInput(format!(
            "item index {item_index} is out of bounds"
        )));
    };
    item.is_correct = Some(correct);

    answer.awarded_points = scoring::recompute_list_total(round, &answer);
    answer.is_correct = Some(answer.items.iter().all(|item| item.is_correct == Some(true)));
    finish_adjudication(state, game_id, answer, game.scores_visible).await
}

async fn finish_adjudication(
    state: &SharedState,
    game_id: Uuid,
    answer: AnswerEntity,
    scores_visible: bool,
) -> Result<AdjudicationOutcome, ServiceError> {
    let team_id = answer.team_id;
    state.store().update_answer(game_id, answer).await?;

    let answers = state.store().find_answers_for_team(game_id, team_id).await?;
    let score = scoring::cumulative_score(&answers);

    info!(%game_id, %team_id, score, "answer adjudicated");
    events::broadcast_score_updated(state, game_id, team_id, score, scores_visible);
    Ok(AdjudicationOutcome { team_id, score })
}

async fn load_answer(
    state: &SharedState,
    game_id: Uuid,
    answer_id: Uuid,
) -> Result<AnswerEntity, ServiceError> {
    let Some(answer) = state.store().find_answer(game_id, answer_id).await? else {
        return Err(ServiceError::NotFound(format!(
            "answer `{answer_id}` not found"
        )));
    };
    Ok(answer)
}
