use indexmap::IndexMap;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::dao::models::{
    GameEntity, GameStateEntity, GameStatusEntity, PointSystemEntity, QuestionEntity,
    QuestionKindEntity, RoundEntity, RoundTypeEntity, TeamEntity,
};

/// Lifecycle status of a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    /// Drafted but not started.
    Pending,
    /// Running; the round/question schedule is frozen.
    InProgress,
    /// Terminal.
    Completed,
}

/// Point-award mode of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PointSystem {
    /// Fixed value per correct answer.
    Flat {
        /// Points per correct answer.
        point_value: i64,
    },
    /// Depletable per-team set of selectable values.
    Pool {
        /// The values each team can spend once per pass.
        point_pool: Vec<i64>,
    },
}

/// Gameplay flavour of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundType {
    /// Regular questions.
    Standard,
    /// Teams stake points from their current score.
    Wager,
    /// Timed answers (timing enforced client-side).
    TimeBased,
}

/// Kind of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionKind {
    /// Free-text single answer.
    Single,
    /// One option from the option set.
    MultipleChoice,
    /// Exact-sequence answer.
    Ordered,
    /// Answer with a wager attached.
    Wager,
    /// Several independently adjudicated items.
    List,
}

/// Runtime representation of a question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Stable identifier.
    pub id: Uuid,
    /// Position within the round.
    pub sort_order: u32,
    /// Kind of question.
    pub kind: QuestionKind,
    /// Prompt shown to teams.
    pub prompt: String,
    /// Option set, when the kind has one.
    pub options: Vec<String>,
    /// Correct-answer designation (single entry, canonical order, or
    /// expected list items depending on the kind).
    pub correct: Vec<String>,
}

/// Runtime representation of a round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    /// Stable identifier.
    pub id: Uuid,
    /// Position within the game.
    pub sort_order: u32,
    /// Gameplay flavour.
    pub round_type: RoundType,
    /// Point-award mode.
    pub points: PointSystem,
    /// Questions ordered by `sort_order`.
    pub questions: Vec<Question>,
}

/// Team registered in a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Opaque identity issued by the external auth collaborator.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// When the team joined.
    pub joined_at: OffsetDateTime,
}

/// Aggregated definition for an in-progress or persisted game session.
#[derive(Debug, Clone)]
pub struct GameSession {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name of the trivia night.
    pub name: String,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Whether standings are shown to team clients.
    pub scores_visible: bool,
    /// Rounds ordered by `sort_order`.
    pub rounds: Vec<Round>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: OffsetDateTime,
    /// Last time the game record was updated.
    pub updated_at: OffsetDateTime,
}

/// The mutable session pointer and per-team point pools.
///
/// One per game; created by `start`, overwritten on every advance, deleted on
/// teardown. `points_remaining` is only meaningful while the current round
/// uses the pool point system.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionPointer {
    /// Round the session currently points at.
    pub current_round_id: Option<Uuid>,
    /// Question the session currently points at.
    pub current_question_id: Option<Uuid>,
    /// Break-screen flag; while set no submissions are accepted.
    pub transitioning: bool,
    /// Remaining selectable pool values per team.
    pub points_remaining: IndexMap<Uuid, Vec<i64>>,
}

impl GameSession {
    /// All (round id, question id) pairs flattened into one ordered sequence.
    ///
    /// Rounds and questions are kept sorted by `sort_order` at creation time,
    /// so the flattening is a plain walk.
    pub fn flattened(&self) -> Vec<(Uuid, Uuid)> {
        self.rounds
            .iter()
            .flat_map(|round| {
                round
                    .questions
                    .iter()
                    .map(move |question| (round.id, question.id))
            })
            .collect()
    }

    /// Look up a round by id.
    pub fn round(&self, round_id: Uuid) -> Option<&Round> {
        self.rounds.iter().find(|round| round.id == round_id)
    }

    /// Look up a question and its owning round by question id.
    pub fn question(&self, question_id: Uuid) -> Option<(&Round, &Question)> {
        self.rounds.iter().find_map(|round| {
            round
                .questions
                .iter()
                .find(|question| question.id == question_id)
                .map(|question| (round, question))
        })
    }
}

impl From<GameStatusEntity> for GameStatus {
    fn from(value: GameStatusEntity) -> Self {
        match value {
            GameStatusEntity::Pending => GameStatus::Pending,
            GameStatusEntity::InProgress => GameStatus::InProgress,
            GameStatusEntity::Completed => GameStatus::Completed,
        }
    }
}

impl From<GameStatus> for GameStatusEntity {
    fn from(value: GameStatus) -> Self {
        match value {
            GameStatus::Pending => GameStatusEntity::Pending,
            GameStatus::InProgress => GameStatusEntity::InProgress,
            GameStatus::Completed => GameStatusEntity::Completed,
        }
    }
}

impl From<PointSystemEntity> for PointSystem {
    fn from(value: PointSystemEntity) -> Self {
        match value {
            PointSystemEntity::Flat { point_value } => PointSystem::Flat { point_value },
            PointSystemEntity::Pool { point_pool } => PointSystem::Pool { point_pool },
        }
    }
}

impl From<PointSystem> for PointSystemEntity {
    fn from(value: PointSystem) -> Self {
        match value {
            PointSystem::Flat { point_value } => PointSystemEntity::Flat { point_value },
            PointSystem::Pool { point_pool } => PointSystemEntity::Pool { point_pool },
        }
    }
}

impl From<RoundTypeEntity> for RoundType {
    fn from(value: RoundTypeEntity) -> Self {
        match value {
            RoundTypeEntity::Standard => RoundType::Standard,
            RoundTypeEntity::Wager => RoundType::Wager,
            RoundTypeEntity::TimeBased => RoundType::TimeBased,
        }
    }
}

impl From<RoundType> for RoundTypeEntity {
    fn from(value: RoundType) -> Self {
        match value {
            RoundType::Standard => RoundTypeEntity::Standard,
            RoundType::Wager => RoundTypeEntity::Wager,
            RoundType::TimeBased => RoundTypeEntity::TimeBased,
        }
    }
}

impl From<QuestionKindEntity> for QuestionKind {
    fn from(value: QuestionKindEntity) -> Self {
        match value {
            QuestionKindEntity::Single => QuestionKind::Single,
            QuestionKindEntity::MultipleChoice => QuestionKind::MultipleChoice,
            QuestionKindEntity::Ordered => QuestionKind::Ordered,
            QuestionKindEntity::Wager => QuestionKind::Wager,
            QuestionKindEntity::List => QuestionKind::List,
        }
    }
}

impl From<QuestionKind> for QuestionKindEntity {
    fn from(value: QuestionKind) -> Self {
        match value {
            QuestionKind::Single => QuestionKindEntity::Single,
            QuestionKind::MultipleChoice => QuestionKindEntity::MultipleChoice,
            QuestionKind::Ordered => QuestionKindEntity::Ordered,
            QuestionKind::Wager => QuestionKindEntity::Wager,
            QuestionKind::List => QuestionKindEntity::List,
        }
    }
}

impl From<QuestionEntity> for Question {
    fn from(value: QuestionEntity) -> Self {
        Self {
            id: value.id,
            sort_order: value.sort_order,
            kind: value.kind.into(),
            prompt: value.prompt,
            options: value.options,
            correct: value.correct,
        }
    }
}

impl From<Question> for QuestionEntity {
    fn from(value: Question) -> Self {
        Self {
            id: value.id,
            sort_order: value.sort_order,
            kind: value.kind.into(),
            prompt: value.prompt,
            options: value.options,
            correct: value.correct,
        }
    }
}

impl From<RoundEntity> for Round {
    fn from(value: RoundEntity) -> Self {
        Self {
            id: value.id,
            sort_order: value.sort_order,
            round_type: value.round_type.into(),
            points: value.points.into(),
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<Round> for RoundEntity {
    fn from(value: Round) -> Self {
        Self {
            id: value.id,
            sort_order: value.sort_order,
            round_type: value.round_type.into(),
            points: value.points.into(),
            questions: value.questions.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<TeamEntity> for Team {
    fn from(value: TeamEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            joined_at: value.joined_at,
        }
    }
}

impl From<Team> for TeamEntity {
    fn from(value: Team) -> Self {
        Self {
            id: value.id,
            name: value.name,
            joined_at: value.joined_at,
        }
    }
}

impl From<GameEntity> for GameSession {
    fn from(value: GameEntity) -> Self {
        Self {
            id: value.id,
            name: value.name,
            status: value.status.into(),
            scores_visible: value.scores_visible,
            rounds: value.rounds.into_iter().map(Into::into).collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<GameSession> for GameEntity {
    fn from(value: GameSession) -> Self {
        Self {
            id: value.id,
            name: value.name,
            status: value.status.into(),
            scores_visible: value.scores_visible,
            rounds: value.rounds.into_iter().map(Into::into).collect(),
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}

impl From<GameStateEntity> for SessionPointer {
    fn from(value: GameStateEntity) -> Self {
        Self {
            current_round_id: value.current_round_id,
            current_question_id: value.current_question_id,
            transitioning: value.transitioning,
            points_remaining: value.points_remaining,
        }
    }
}

impl From<SessionPointer> for GameStateEntity {
    fn from(value: SessionPointer) -> Self {
        Self {
            current_round_id: value.current_round_id,
            current_question_id: value.current_question_id,
            transitioning: value.transitioning,
            points_remaining: value.points_remaining,
        }
    }
}
