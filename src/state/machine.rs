//! Pure session state machine: round/question navigation, point-pool
//! lifecycle, and the transition (break-screen) flag.
//!
//! All functions here are side-effect free; the service layer is responsible
//! for running them under the per-session gate and persisting the results.

use indexmap::IndexMap;
use thiserror::Error;
use uuid::Uuid;

use crate::state::session::{GameSession, GameStatus, PointSystem, SessionPointer, Team};

/// Navigation direction for [`advance`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Move one question forward, crossing round boundaries.
    Next,
    /// Move one question backward, crossing round boundaries.
    Prev,
}

/// Error returned when an operation is not valid for the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MachineError {
    /// `start` called on a session that is not pending.
    #[error("session cannot start while {status:?}")]
    NotStartable {
        /// Status the session was in.
        status: GameStatus,
    },
    /// The game has no round containing at least one question.
    #[error("game has no rounds with questions")]
    EmptySchedule,
    /// Navigation requested while the session is not in progress.
    #[error("session is not in progress")]
    NotInProgress,
    /// NEXT requested on the last question.
    #[error("no more questions to advance to")]
    NoMoreQuestions,
    /// PREV requested on the first question.
    #[error("no previous question to go back to")]
    NoPreviousQuestion,
    /// The stored pointer references a question absent from the schedule.
    #[error("pointer references unknown question `{0}`")]
    DanglingPointer(Uuid),
    /// `complete` requested before the last question was reached.
    #[error("session can only complete on the last question")]
    NotAtEnd,
}

/// Result of a successful [`advance`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvanceOutcome {
    /// The new session pointer.
    pub pointer: SessionPointer,
    /// Whether the advance crossed a round boundary.
    pub round_changed: bool,
}

/// Start a pending session, pointing it at the first question of the first
/// round and seeding point pools when that round uses the pool system.
pub fn start(
    game: &GameSession,
    teams: &[Team],
) -> Result<(GameStatus, SessionPointer), MachineError> {
    if game.status != GameStatus::Pending {
        return Err(MachineError::NotStartable {
            status: game.status,
        });
    }

    let sequence = game.flattened();
    let &(round_id, question_id) = sequence.first().ok_or(MachineError::EmptySchedule)?;

    let mut pointer = SessionPointer {
        current_round_id: Some(round_id),
        current_question_id: Some(question_id),
        transitioning: false,
        points_remaining: IndexMap::new(),
    };
    seed_pools_for_round(game, &mut pointer, round_id, teams);

    Ok((GameStatus::InProgress, pointer))
}

/// Step the pointer one question forward or backward along the flattened
/// round/question sequence.
///
/// On any round change into a pool round, every registered team's remaining
/// pool is reset to a fresh copy of that round's pool. This is an
/// unconditional reset, not a merge: values consumed during an earlier pass
/// through the same round become selectable again. The transition flag is
/// cleared on every successful advance.
pub fn advance(
    game: &GameSession,
    pointer: &SessionPointer,
    direction: Direction,
    teams: &[Team],
) -> Result<AdvanceOutcome, MachineError> {
    if game.status != GameStatus::InProgress {
        return Err(MachineError::NotInProgress);
    }

    let current = pointer
        .current_question_id
        .ok_or(MachineError::NotInProgress)?;
    let sequence = game.flattened();
    let position = sequence
        .iter()
        .position(|&(_, question_id)| question_id == current)
        .ok_or(MachineError::DanglingPointer(current))?;

    let target = match direction {
        Direction::Next => {
            if position + 1 >= sequence.len() {
                return Err(MachineError::NoMoreQuestions);
            }
            position + 1
        }
        Direction::Prev => position
            .checked_sub(1)
            .ok_or(MachineError::NoPreviousQuestion)?,
    };

    let (round_id, question_id) = sequence[target];
    let round_changed = pointer.current_round_id != Some(round_id);

    let mut next = SessionPointer {
        current_round_id: Some(round_id),
        current_question_id: Some(question_id),
        transitioning: false,
        points_remaining: pointer.points_remaining.clone(),
    };
    if round_changed {
        seed_pools_for_round(game, &mut next, round_id, teams);
    }

    Ok(AdvanceOutcome {
        pointer: next,
        round_changed,
    })
}

/// Toggle the break-screen flag without moving the pointer.
pub fn set_transitioning(pointer: &SessionPointer, transitioning: bool) -> SessionPointer {
    SessionPointer {
        transitioning,
        ..pointer.clone()
    }
}

/// Complete the session. Only valid on the last flattened question; repeated
/// calls on a completed session are a no-op.
pub fn complete(game: &GameSession, pointer: &SessionPointer) -> Result<GameStatus, MachineError> {
    if game.status == GameStatus::Completed {
        return Ok(GameStatus::Completed);
    }
    if game.status != GameStatus::InProgress {
        return Err(MachineError::NotInProgress);
    }

    let current = pointer
        .current_question_id
        .ok_or(MachineError::NotInProgress)?;
    let sequence = game.flattened();
    match sequence.last() {
        Some(&(_, last)) if last == current => Ok(GameStatus::Completed),
        Some(_) => Err(MachineError::NotAtEnd),
        None => Err(MachineError::EmptySchedule),
    }
}

/// Seed a fresh pool copy for every registered team when entering a pool
/// round; a team present in the map already is overwritten, not merged.
fn seed_pools_for_round(
    game: &GameSession,
    pointer: &mut SessionPointer,
    round_id: Uuid,
    teams: &[Team],
) {
    let Some(round) = game.round(round_id) else {
        return;
    };
    if let PointSystem::Pool { point_pool } = &round.points {
        for team in teams {
            pointer
                .points_remaining
                .insert(team.id, point_pool.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::state::session::{Question, QuestionKind, Round, RoundType};

    fn question(order: u32) -> Question {
        Question {
            id: Uuid::new_v4(),
            sort_order: order,
            kind: QuestionKind::Single,
            prompt: format!("question {order}"),
            options: Vec::new(),
            correct: vec!["answer".into()],
        }
    }

    fn flat_round(order: u32, questions: usize) -> Round {
        Round {
            id: Uuid::new_v4(),
            sort_order: order,
            round_type: RoundType::Standard,
            points: PointSystem::Flat { point_value: 10 },
            questions: (0..questions).map(|i| question(i as u32)).collect(),
        }
    }

    fn pool_round(order: u32, questions: usize, pool: Vec<i64>) -> Round {
        Round {
            id: Uuid::new_v4(),
            sort_order: order,
            round_type: RoundType::Standard,
            points: PointSystem::Pool { point_pool: pool },
            questions: (0..questions).map(|i| question(i as u32)).collect(),
        }
    }

    fn game(rounds: Vec<Round>, status: GameStatus) -> GameSession {
        let now = OffsetDateTime::now_utc();
        GameSession {
            id: Uuid::new_v4(),
            name: "test night".into(),
            status,
            scores_visible: true,
            rounds,
            created_at: now,
            updated_at: now,
        }
    }

    fn team(name: &str) -> Team {
        Team {
            id: Uuid::new_v4(),
            name: name.into(),
            joined_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn start_points_at_first_question() {
        let game = game(vec![flat_round(0, 2), flat_round(1, 1)], GameStatus::Pending);
        let (status, pointer) = start(&game, &[]).unwrap();

        assert_eq!(status, GameStatus::InProgress);
        assert_eq!(pointer.current_round_id, Some(game.rounds[0].id));
        assert_eq!(
            pointer.current_question_id,
            Some(game.rounds[0].questions[0].id)
        );
        assert!(!pointer.transitioning);
        assert!(pointer.points_remaining.is_empty());
    }

    #[test]
    fn start_seeds_pools_when_first_round_is_pool() {
        let teams = vec![team("Alpha"), team("Beta")];
        let game = game(vec![pool_round(0, 2, vec![1, 3, 5])], GameStatus::Pending);

        let (_, pointer) = start(&game, &teams).unwrap();
        for team in &teams {
            assert_eq!(pointer.points_remaining[&team.id], vec![1, 3, 5]);
        }
    }

    #[test]
    fn start_twice_is_rejected() {
        let game = game(vec![flat_round(0, 1)], GameStatus::InProgress);
        assert_eq!(
            start(&game, &[]).unwrap_err(),
            MachineError::NotStartable {
                status: GameStatus::InProgress
            }
        );
    }

    #[test]
    fn start_requires_a_question() {
        let game = game(vec![], GameStatus::Pending);
        assert_eq!(start(&game, &[]).unwrap_err(), MachineError::EmptySchedule);

        let game_with_empty_round = game_with_only_empty_round();
        assert_eq!(
            start(&game_with_empty_round, &[]).unwrap_err(),
            MachineError::EmptySchedule
        );
    }

    fn game_with_only_empty_round() -> GameSession {
        game(vec![flat_round(0, 0)], GameStatus::Pending)
    }

    #[test]
    fn next_crosses_round_boundary() {
        let game = game(
            vec![flat_round(0, 1), flat_round(1, 2)],
            GameStatus::Pending,
        );
        let game = GameSession {
            status: GameStatus::InProgress,
            ..game
        };
        let pointer = SessionPointer {
            current_round_id: Some(game.rounds[0].id),
            current_question_id: Some(game.rounds[0].questions[0].id),
            ..SessionPointer::default()
        };

        let outcome = advance(&game, &pointer, Direction::Next, &[]).unwrap();
        assert!(outcome.round_changed);
        assert_eq!(outcome.pointer.current_round_id, Some(game.rounds[1].id));
        assert_eq!(
            outcome.pointer.current_question_id,
            Some(game.rounds[1].questions[0].id)
        );
    }

    #[test]
    fn next_on_last_question_fails() {
        let game = game(vec![flat_round(0, 1)], GameStatus::InProgress);
        let pointer = SessionPointer {
            current_round_id: Some(game.rounds[0].id),
            current_question_id: Some(game.rounds[0].questions[0].id),
            ..SessionPointer::default()
        };
        assert_eq!(
            advance(&game, &pointer, Direction::Next, &[]).unwrap_err(),
            MachineError::NoMoreQuestions
        );
    }

    #[test]
    fn prev_on_first_question_fails() {
        let game = game(vec![flat_round(0, 2)], GameStatus::InProgress);
        let pointer = SessionPointer {
            current_round_id: Some(game.rounds[0].id),
            current_question_id: Some(game.rounds[0].questions[0].id),
            ..SessionPointer::default()
        };
        assert_eq!(
            advance(&game, &pointer, Direction::Prev, &[]).unwrap_err(),
            MachineError::NoPreviousQuestion
        );
    }

    #[test]
    fn advance_clears_transitioning() {
        let game = game(vec![flat_round(0, 2)], GameStatus::InProgress);
        let pointer = SessionPointer {
            current_round_id: Some(game.rounds[0].id),
            current_question_id: Some(game.rounds[0].questions[0].id),
            transitioning: true,
            ..SessionPointer::default()
        };

        let outcome = advance(&game, &pointer, Direction::Next, &[]).unwrap();
        assert!(!outcome.pointer.transitioning);
        assert!(!outcome.round_changed);
    }

    #[test]
    fn entering_pool_round_replenishes_every_team() {
        let teams = vec![team("Alpha"), team("Beta")];
        let game = game(
            vec![flat_round(0, 1), pool_round(1, 1, vec![2, 4])],
            GameStatus::InProgress,
        );
        let pointer = SessionPointer {
            current_round_id: Some(game.rounds[0].id),
            current_question_id: Some(game.rounds[0].questions[0].id),
            ..SessionPointer::default()
        };

        let outcome = advance(&game, &pointer, Direction::Next, &teams).unwrap();
        assert!(outcome.round_changed);
        for team in &teams {
            assert_eq!(outcome.pointer.points_remaining[&team.id], vec![2, 4]);
        }
    }

    #[test]
    fn reentering_pool_round_resets_consumed_values() {
        let teams = vec![team("Alpha")];
        let game = game(
            vec![pool_round(0, 1, vec![1, 3, 5]), flat_round(1, 1)],
            GameStatus::InProgress,
        );
        // Team consumed 3 during the first pass, then the session advanced on.
        let pointer = SessionPointer {
            current_round_id: Some(game.rounds[1].id),
            current_question_id: Some(game.rounds[1].questions[0].id),
            points_remaining: IndexMap::from([(teams[0].id, vec![1, 5])]),
            ..SessionPointer::default()
        };

        let outcome = advance(&game, &pointer, Direction::Prev, &teams).unwrap();
        assert!(outcome.round_changed);
        // Full reset, not a restore of the partially consumed pool.
        assert_eq!(outcome.pointer.points_remaining[&teams[0].id], vec![1, 3, 5]);
    }

    #[test]
    fn next_then_prev_returns_to_origin_without_touching_pools() {
        let teams = vec![team("Alpha")];
        let game = game(vec![pool_round(0, 3, vec![1, 3, 5])], GameStatus::InProgress);
        let pointer = SessionPointer {
            current_round_id: Some(game.rounds[0].id),
            current_question_id: Some(game.rounds[0].questions[1].id),
            points_remaining: IndexMap::from([(teams[0].id, vec![1, 5])]),
            ..SessionPointer::default()
        };

        let forward = advance(&game, &pointer, Direction::Next, &teams).unwrap();
        assert!(!forward.round_changed);
        let back = advance(&game, &forward.pointer, Direction::Prev, &teams).unwrap();
        assert!(!back.round_changed);

        assert_eq!(back.pointer.current_question_id, pointer.current_question_id);
        // No round boundary was crossed, so the partially consumed pool survives.
        assert_eq!(back.pointer.points_remaining[&teams[0].id], vec![1, 5]);
    }

    #[test]
    fn complete_requires_last_question() {
        let game = game(vec![flat_round(0, 2)], GameStatus::InProgress);
        let at_first = SessionPointer {
            current_round_id: Some(game.rounds[0].id),
            current_question_id: Some(game.rounds[0].questions[0].id),
            ..SessionPointer::default()
        };
        assert_eq!(complete(&game, &at_first).unwrap_err(), MachineError::NotAtEnd);

        let at_last = SessionPointer {
            current_question_id: Some(game.rounds[0].questions[1].id),
            ..at_first
        };
        assert_eq!(complete(&game, &at_last).unwrap(), GameStatus::Completed);
    }

    #[test]
    fn complete_is_idempotent_once_completed() {
        let game = game(vec![flat_round(0, 1)], GameStatus::Completed);
        let pointer = SessionPointer::default();
        assert_eq!(complete(&game, &pointer).unwrap(), GameStatus::Completed);
    }

    #[test]
    fn set_transitioning_only_touches_the_flag() {
        let pointer = SessionPointer {
            current_round_id: Some(Uuid::new_v4()),
            current_question_id: Some(Uuid::new_v4()),
            transitioning: false,
            points_remaining: IndexMap::from([(Uuid::new_v4(), vec![7])]),
        };

        let toggled = set_transitioning(&pointer, true);
        assert!(toggled.transitioning);
        assert_eq!(toggled.current_question_id, pointer.current_question_id);
        assert_eq!(toggled.points_remaining, pointer.points_remaining);
    }
}
