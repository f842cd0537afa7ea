use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::dao::models::{
    GameStatusEntity, PointSystemEntity, QuestionKindEntity, RoundTypeEntity,
};
use crate::dto::{
    format_timestamp,
    validation::{validate_display_name, validate_point_pool},
};
use crate::state::session::{GameSession, Question, Round};

/// Gameplay flavour of a round on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundTypeDto {
    /// Regular question round.
    Standard,
    /// Teams stake points from their current score.
    Wager,
    /// Answers race a clock.
    TimeBased,
}

impl From<RoundTypeDto> for RoundTypeEntity {
    fn from(value: RoundTypeDto) -> Self {
        match value {
            RoundTypeDto::Standard => RoundTypeEntity::Standard,
            RoundTypeDto::Wager => RoundTypeEntity::Wager,
            RoundTypeDto::TimeBased => RoundTypeEntity::TimeBased,
        }
    }
}

impl From<RoundTypeEntity> for RoundTypeDto {
    fn from(value: RoundTypeEntity) -> Self {
        match value {
            RoundTypeEntity::Standard => RoundTypeDto::Standard,
            RoundTypeEntity::Wager => RoundTypeDto::Wager,
            RoundTypeEntity::TimeBased => RoundTypeDto::TimeBased,
        }
    }
}

/// Question kind on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKindDto {
    /// Free-text single answer.
    Single,
    /// One option from the option set.
    MultipleChoice,
    /// Exact-sequence answer.
    Ordered,
    /// Answer with a wager attached.
    Wager,
    /// Independently adjudicated items.
    List,
}

impl From<QuestionKindDto> for QuestionKindEntity {
    fn from(value: QuestionKindDto) -> Self {
        match value {
            QuestionKindDto::Single => QuestionKindEntity::Single,
            QuestionKindDto::MultipleChoice => QuestionKindEntity::MultipleChoice,
            QuestionKindDto::Ordered => QuestionKindEntity::Ordered,
            QuestionKindDto::Wager => QuestionKindEntity::Wager,
            QuestionKindDto::List => QuestionKindEntity::List,
        }
    }
}

impl From<QuestionKindEntity> for QuestionKindDto {
    fn from(value: QuestionKindEntity) -> Self {
        match value {
            QuestionKindEntity::Single => QuestionKindDto::Single,
            QuestionKindEntity::MultipleChoice => QuestionKindDto::MultipleChoice,
            QuestionKindEntity::Ordered => QuestionKindDto::Ordered,
            QuestionKindEntity::Wager => QuestionKindDto::Wager,
            QuestionKindEntity::List => QuestionKindDto::List,
        }
    }
}

/// Session status on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusDto {
    /// Drafted but not started.
    Pending,
    /// Running.
    InProgress,
    /// Finished.
    Completed,
}

impl From<GameStatusEntity> for GameStatusDto {
    fn from(value: GameStatusEntity) -> Self {
        match value {
            GameStatusEntity::Pending => GameStatusDto::Pending,
            GameStatusEntity::InProgress => GameStatusDto::InProgress,
            GameStatusEntity::Completed => GameStatusDto::Completed,
        }
    }
}

/// Point-award mode supplied for a round.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "system", rename_all = "snake_case")]
pub enum PointSystemInput {
    /// Fixed value per correct answer.
    Flat {
        /// Points per correct answer; must not be negative.
        point_value: i64,
    },
    /// Depletable per-team set of selectable values.
    Pool {
        /// Ordered set of positive, distinct values.
        point_pool: Vec<i64>,
    },
}

impl Validate for PointSystemInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match self {
            PointSystemInput::Flat { point_value } => {
                if *point_value < 0 {
                    let mut err = ValidationError::new("point_value_negative");
                    err.message = Some("flat point value must not be negative".into());
                    errors.add("point_value", err);
                }
            }
            PointSystemInput::Pool { point_pool } => {
                if let Err(err) = validate_point_pool(point_pool) {
                    errors.add("point_pool", err);
                }
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

impl From<PointSystemInput> for PointSystemEntity {
    fn from(value: PointSystemInput) -> Self {
        match value {
            PointSystemInput::Flat { point_value } => PointSystemEntity::Flat { point_value },
            PointSystemInput::Pool { point_pool } => PointSystemEntity::Pool { point_pool },
        }
    }
}

/// Question supplied when bootstrapping a game.
///
/// Positions derive from input order; the server reassigns dense sort orders
/// so ties can never exist.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct QuestionInput {
    /// Question kind.
    pub kind: QuestionKindDto,
    /// Prompt shown to teams.
    pub prompt: String,
    /// Option set for choice/ordered kinds.
    #[serde(default)]
    pub options: Vec<String>,
    /// Correct-answer designation (single entry, canonical order, or
    /// expected list items depending on the kind).
    #[serde(default)]
    pub correct: Vec<String>,
}

impl Validate for QuestionInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = validate_display_name(&self.prompt) {
            errors.add("prompt", err);
        }

        match self.kind {
            QuestionKindDto::MultipleChoice if self.options.len() < 2 => {
                let mut err = ValidationError::new("options_missing");
                err.message =
                    Some("multiple choice questions need at least two options".into());
                errors.add("options", err);
            }
            QuestionKindDto::Ordered if self.correct.len() < 2 => {
                let mut err = ValidationError::new("sequence_missing");
                err.message =
                    Some("ordered questions need a canonical sequence of at least two items".into());
                errors.add("correct", err);
            }
            QuestionKindDto::List if self.correct.is_empty() => {
                let mut err = ValidationError::new("items_missing");
                err.message = Some("list questions need at least one expected item".into());
                errors.add("correct", err);
            }
            _ => {}
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Round supplied when bootstrapping a game.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RoundInput {
    /// Gameplay flavour.
    pub round_type: RoundTypeDto,
    /// Point-award mode.
    pub point_system: PointSystemInput,
    /// Questions in play order.
    pub questions: Vec<QuestionInput>,
}

impl Validate for RoundInput {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(nested) = self.point_system.validate() {
            errors.merge_self("point_system", Err(nested));
        }

        if self.questions.is_empty() {
            let mut err = ValidationError::new("questions_missing");
            err.message = Some("each round needs at least one question".into());
            errors.add("questions", err);
        }
        for question in &self.questions {
            if let Err(nested) = question.validate() {
                errors.merge_self("questions", Err(nested));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Payload used to bootstrap a brand-new game definition.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateGameRequest {
    /// Display name of the trivia night.
    pub name: String,
    /// Rounds in play order.
    pub rounds: Vec<RoundInput>,
}

impl Validate for CreateGameRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(err) = validate_display_name(&self.name) {
            errors.add("name", err);
        }
        if self.rounds.is_empty() {
            let mut err = ValidationError::new("rounds_missing");
            err.message = Some("a game needs at least one round".into());
            errors.add("rounds", err);
        }
        for round in &self.rounds {
            if let Err(nested) = round.validate() {
                errors.merge_self("rounds", Err(nested));
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Question projection in the host view (includes correct answers).
#[derive(Debug, Serialize, ToSchema)]
pub struct QuestionSummary {
    /// Stable identifier.
    pub id: Uuid,
    /// Position within the round.
    pub sort_order: u32,
    /// Question kind.
    pub kind: QuestionKindDto,
    /// Prompt shown to teams.
    pub prompt: String,
    /// Option set.
    pub options: Vec<String>,
    /// Correct-answer designation.
    pub correct: Vec<String>,
}

impl From<Question> for QuestionSummary {
    fn from(value: Question) -> Self {
        Self {
            id: value.id,
            sort_order: value.sort_order,
            kind: QuestionKindEntity::from(value.kind).into(),
            prompt: value.prompt,
            options: value.options,
            correct: value.correct,
        }
    }
}

/// Round projection in the host view.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoundSummary {
    /// Stable identifier.
    pub id: Uuid,
    /// Position within the game.
    pub sort_order: u32,
    /// Gameplay flavour.
    pub round_type: RoundTypeDto,
    /// Point-award mode.
    pub point_system: PointSystemInput,
    /// Questions ordered by `sort_order`.
    pub questions: Vec<QuestionSummary>,
}

impl From<Round> for RoundSummary {
    fn from(value: Round) -> Self {
        let point_system = match PointSystemEntity::from(value.points) {
            PointSystemEntity::Flat { point_value } => PointSystemInput::Flat { point_value },
            PointSystemEntity::Pool { point_pool } => PointSystemInput::Pool { point_pool },
        };
        Self {
            id: value.id,
            sort_order: value.sort_order,
            round_type: RoundTypeEntity::from(value.round_type).into(),
            point_system,
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}

/// Full game definition returned to the host.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameSummary {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: GameStatusDto,
    /// Whether standings are visible to team clients.
    pub scores_visible: bool,
    /// Rounds ordered by `sort_order`.
    pub rounds: Vec<RoundSummary>,
    /// Creation timestamp (RFC 3339).
    pub created_at: String,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl From<GameSession> for GameSummary {
    fn from(value: GameSession) -> Self {
        Self {
            id: value.id,
            name: value.name.clone(),
            status: GameStatusEntity::from(value.status).into(),
            scores_visible: value.scores_visible,
            created_at: format_timestamp(value.created_at),
            updated_at: format_timestamp(value.updated_at),
            rounds: value.rounds.into_iter().map(Into::into).collect(),
        }
    }
}

/// Listing row returned by the game index endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct GameListItem {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: GameStatusDto,
    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_question() -> QuestionInput {
        QuestionInput {
            kind: QuestionKindDto::Single,
            prompt: "capital of France?".into(),
            options: Vec::new(),
            correct: vec!["Paris".into()],
        }
    }

    #[test]
    fn well_formed_request_validates() {
        let request = CreateGameRequest {
            name: "Pub Night".into(),
            rounds: vec![RoundInput {
                round_type: RoundTypeDto::Standard,
                point_system: PointSystemInput::Flat { point_value: 10 },
                questions: vec![single_question()],
            }],
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn empty_rounds_are_rejected() {
        let request = CreateGameRequest {
            name: "Pub Night".into(),
            rounds: Vec::new(),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn pool_round_with_duplicates_is_rejected() {
        let round = RoundInput {
            round_type: RoundTypeDto::Standard,
            point_system: PointSystemInput::Pool {
                point_pool: vec![1, 1, 3],
            },
            questions: vec![single_question()],
        };
        assert!(round.validate().is_err());
    }

    #[test]
    fn list_question_needs_expected_items() {
        let question = QuestionInput {
            kind: QuestionKindDto::List,
            prompt: "name four Beatles".into(),
            options: Vec::new(),
            correct: Vec::new(),
        };
        assert!(question.validate().is_err());
    }
}
