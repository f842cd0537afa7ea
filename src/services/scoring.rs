//! Scoring rules per point system and question kind.
//!
//! Everything here is a pure computation over the round definition, the
//! stored answer, and the host verdict; persistence and broadcasting live in
//! the answer ledger. A team's cumulative score is always derived by summing
//! `awarded_points` over its answers, never kept as a separate counter, so a
//! corrected adjudication fixes the total on the next read.

use crate::dao::models::{AnswerEntity, AnswerItemEntity, AnswerValueEntity};
use crate::error::ServiceError;
use crate::state::session::{PointSystem, Question, QuestionKind, Round, RoundType};

/// Points for an answer in a flat round: the round value on correct, zero
/// otherwise. What the team entered as `points_used` is irrelevant.
pub fn flat_award(point_value: i64, correct: bool) -> i64 {
    if correct { point_value } else { 0 }
}

/// Points for a pool answer: the selected value on correct, zero otherwise.
/// The selected value stays consumed either way.
pub fn pool_award(points_used: i64, correct: bool) -> i64 {
    if correct { points_used } else { 0 }
}

/// Points for a wager answer: the stake is gained or lost in full.
pub fn wager_award(wager: i64, correct: bool) -> i64 {
    if correct { wager } else { -wager }
}

/// Validate a wager against the team's score at submission time.
pub fn validate_wager(wager: i64, current_score: i64) -> Result<(), ServiceError> {
    let max = current_score.max(0);
    if wager < 0 || wager > max {
        return Err(ServiceError::InvalidWager { wager, max });
    }
    Ok(())
}

/// Points for a list answer: each item marked correct is worth one round
/// value. Unadjudicated items count as incorrect until the host flips them.
pub fn list_award(items: &[AnswerItemEntity], item_value: i64) -> i64 {
    let correct = items
        .iter()
        .filter(|item| item.is_correct == Some(true))
        .count() as i64;
    correct * item_value
}

/// Per-item value used for list questions in this round.
fn list_item_value(round: &Round) -> i64 {
    match &round.points {
        PointSystem::Flat { point_value } => *point_value,
        // List questions belong in flat rounds; inside a pool round each
        // correct item is worth a single point.
        PointSystem::Pool { .. } => 1,
    }
}

/// Compute the awarded points for an answer under a host verdict.
///
/// List questions are not handled here; their total is recomputed from the
/// per-item verdicts via [`recompute_list_total`].
pub fn award_for_verdict(
    round: &Round,
    question: &Question,
    answer: &AnswerEntity,
    correct: bool,
) -> i64 {
    if round.round_type == RoundType::Wager || question.kind == QuestionKind::Wager {
        return wager_award(answer.points_used.unwrap_or(0), correct);
    }

    match &round.points {
        PointSystem::Flat { point_value } => flat_award(*point_value, correct),
        PointSystem::Pool { .. } => pool_award(answer.points_used.unwrap_or(0), correct),
    }
}

/// Pre-grade a submission against the question's stored correct answers.
///
/// The hint is shown to the host alongside the incoming answer; it never
/// awards points on its own. `None` means the kind needs human judgement
/// (wagers and per-item lists) or no correct answer was recorded. Text is
/// compared trimmed and case-insensitively; an ordered question demands the
/// exact sequence.
pub fn suggest_verdict(question: &Question, value: &AnswerValueEntity) -> Option<bool> {
    if question.correct.is_empty() {
        return None;
    }
    match (question.kind, value) {
        (
            QuestionKind::Single | QuestionKind::MultipleChoice,
            AnswerValueEntity::Text { value },
        ) => Some(question.correct.iter().any(|c| text_matches(c, value))),
        (QuestionKind::Ordered, AnswerValueEntity::List { values }) => Some(
            values.len() == question.correct.len()
                && values
                    .iter()
                    .zip(&question.correct)
                    .all(|(got, want)| text_matches(want, got)),
        ),
        _ => None,
    }
}

fn text_matches(expected: &str, got: &str) -> bool {
    expected.trim().eq_ignore_ascii_case(got.trim())
}

/// Recompute a list answer's total from its item verdicts.
pub fn recompute_list_total(round: &Round, answer: &AnswerEntity) -> i64 {
    list_award(&answer.items, list_item_value(round))
}

/// Derived cumulative score: the sum of awarded points over a team's answers.
pub fn cumulative_score(answers: &[AnswerEntity]) -> i64 {
    answers.iter().map(|answer| answer.awarded_points).sum()
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::dao::models::AnswerValueEntity;

    fn round(points: PointSystem, round_type: RoundType) -> Round {
        Round {
            id: Uuid::new_v4(),
            sort_order: 0,
            round_type,
            points,
            questions: Vec::new(),
        }
    }

    fn question(kind: QuestionKind) -> Question {
        Question {
            id: Uuid::new_v4(),
            sort_order: 0,
            kind,
            prompt: "prompt".into(),
            options: Vec::new(),
            correct: Vec::new(),
        }
    }

    fn answer(points_used: Option<i64>) -> AnswerEntity {
        AnswerEntity {
            id: Uuid::new_v4(),
            team_id: Uuid::new_v4(),
            question_id: Uuid::new_v4(),
            value: AnswerValueEntity::Text {
                value: "guess".into(),
            },
            points_used,
            is_correct: None,
            awarded_points: 0,
            items: Vec::new(),
        }
    }

    #[test]
    fn flat_round_ignores_points_used() {
        let round = round(PointSystem::Flat { point_value: 10 }, RoundType::Standard);
        let question = question(QuestionKind::Single);
        let answer = answer(Some(999));

        assert_eq!(award_for_verdict(&round, &question, &answer, true), 10);
        assert_eq!(award_for_verdict(&round, &question, &answer, false), 0);
    }

    #[test]
    fn pool_round_awards_selected_value_only_on_correct() {
        let round = round(
            PointSystem::Pool {
                point_pool: vec![1, 3, 5],
            },
            RoundType::Standard,
        );
        let question = question(QuestionKind::Single);
        let answer = answer(Some(3));

        assert_eq!(award_for_verdict(&round, &question, &answer, true), 3);
        assert_eq!(award_for_verdict(&round, &question, &answer, false), 0);
    }

    #[test]
    fn wager_swings_both_ways() {
        let round = round(PointSystem::Flat { point_value: 0 }, RoundType::Wager);
        let question = question(QuestionKind::Wager);
        let answer = answer(Some(50));

        assert_eq!(award_for_verdict(&round, &question, &answer, true), 50);
        assert_eq!(award_for_verdict(&round, &question, &answer, false), -50);
    }

    #[test]
    fn wager_validation_brackets_current_score() {
        assert!(validate_wager(0, 50).is_ok());
        assert!(validate_wager(50, 50).is_ok());

        match validate_wager(60, 50) {
            Err(ServiceError::InvalidWager { wager, max }) => {
                assert_eq!(wager, 60);
                assert_eq!(max, 50);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(validate_wager(-1, 50).is_err());
        // A negative score still allows a zero wager but nothing more.
        assert!(validate_wager(0, -10).is_ok());
        assert!(validate_wager(1, -10).is_err());
    }

    #[test]
    fn list_total_counts_correct_items() {
        let items = vec![
            AnswerItemEntity {
                value: "a".into(),
                is_correct: Some(true),
            },
            AnswerItemEntity {
                value: "b".into(),
                is_correct: Some(true),
            },
            AnswerItemEntity {
                value: "c".into(),
                is_correct: Some(false),
            },
            AnswerItemEntity {
                value: "d".into(),
                is_correct: None,
            },
        ];

        assert_eq!(list_award(&items, 5), 10);
    }

    #[test]
    fn list_total_tracks_item_flips() {
        let round = round(PointSystem::Flat { point_value: 5 }, RoundType::Standard);
        let mut answer = answer(None);
        answer.items = (0..4)
            .map(|i| AnswerItemEntity {
                value: format!("item {i}"),
                is_correct: Some(i < 3),
            })
            .collect();

        assert_eq!(recompute_list_total(&round, &answer), 15);
        answer.items[3].is_correct = Some(true);
        assert_eq!(recompute_list_total(&round, &answer), 20);
    }

    #[test]
    fn verdict_hints_compare_text_loosely() {
        let mut q = question(QuestionKind::Single);
        q.correct = vec!["Mercury".into()];

        let right = AnswerValueEntity::Text {
            value: " mercury ".into(),
        };
        let wrong = AnswerValueEntity::Text {
            value: "Venus".into(),
        };
        assert_eq!(suggest_verdict(&q, &right), Some(true));
        assert_eq!(suggest_verdict(&q, &wrong), Some(false));
    }

    #[test]
    fn verdict_hints_require_the_exact_sequence() {
        let mut q = question(QuestionKind::Ordered);
        q.correct = vec!["first".into(), "second".into(), "third".into()];

        let in_order = AnswerValueEntity::List {
            values: vec!["First".into(), "second".into(), "third".into()],
        };
        let swapped = AnswerValueEntity::List {
            values: vec!["second".into(), "first".into(), "third".into()],
        };
        let short = AnswerValueEntity::List {
            values: vec!["first".into(), "second".into()],
        };
        assert_eq!(suggest_verdict(&q, &in_order), Some(true));
        assert_eq!(suggest_verdict(&q, &swapped), Some(false));
        assert_eq!(suggest_verdict(&q, &short), Some(false));
    }

    #[test]
    fn verdict_hints_defer_to_the_host_where_needed() {
        let mut wager = question(QuestionKind::Wager);
        wager.correct = vec!["answer".into()];
        let value = AnswerValueEntity::Text {
            value: "answer".into(),
        };
        assert_eq!(suggest_verdict(&wager, &value), None);

        // No recorded answer, nothing to compare against.
        let blank = question(QuestionKind::Single);
        assert_eq!(suggest_verdict(&blank, &value), None);
    }

    #[test]
    fn cumulative_score_is_a_plain_sum() {
        let mut first = answer(None);
        first.awarded_points = 10;
        let mut second = answer(None);
        second.awarded_points = -4;

        assert_eq!(cumulative_score(&[first, second]), 6);
        assert_eq!(cumulative_score(&[]), 0);
    }
}
