use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

/// Lifecycle status of a persisted game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameStatusEntity {
    /// Drafted but not yet started; rounds and questions may still change.
    Pending,
    /// A host has started the session; the schedule is frozen.
    InProgress,
    /// Terminal state, no further mutations accepted.
    Completed,
}

/// Point-award mode for a round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "system", rename_all = "snake_case")]
pub enum PointSystemEntity {
    /// Every correct answer is worth the same fixed value.
    Flat {
        /// Points awarded per correct answer in this round.
        point_value: i64,
    },
    /// Teams pick from a depletable set of point values.
    Pool {
        /// Values each team may spend once per pass through the round.
        point_pool: Vec<i64>,
    },
}

/// Gameplay flavour of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundTypeEntity {
    /// Regular question round.
    Standard,
    /// Teams stake points from their current score.
    Wager,
    /// Answers race a clock (timing is a client concern).
    TimeBased,
}

/// Kind of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKindEntity {
    /// Free-text single answer.
    Single,
    /// One answer chosen from the option set.
    MultipleChoice,
    /// Options must be returned in the canonical sequence.
    Ordered,
    /// Answer accompanied by a wager.
    Wager,
    /// N expected items, each adjudicated independently.
    List,
}

/// Question definition inside a round.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuestionEntity {
    /// Stable identifier for the question.
    pub id: Uuid,
    /// Position within the round; dense and strictly increasing.
    pub sort_order: u32,
    /// Question kind.
    pub kind: QuestionKindEntity,
    /// Prompt shown to teams.
    pub prompt: String,
    /// Option set for choice/ordered/list kinds; empty otherwise.
    pub options: Vec<String>,
    /// Correct-answer designation: one entry for single/multiple choice,
    /// the canonical sequence for ordered, the expected items for list.
    pub correct: Vec<String>,
}

/// Round definition inside a game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoundEntity {
    /// Stable identifier for the round.
    pub id: Uuid,
    /// Position within the game; dense and strictly increasing.
    pub sort_order: u32,
    /// Gameplay flavour.
    pub round_type: RoundTypeEntity,
    /// Point-award mode and its parameters.
    pub points: PointSystemEntity,
    /// Questions ordered by `sort_order`.
    pub questions: Vec<QuestionEntity>,
}

/// Persisted game definition and session status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name of the trivia night.
    pub name: String,
    /// Lifecycle status.
    pub status: GameStatusEntity,
    /// Whether team clients may see the standings.
    pub scores_visible: bool,
    /// Rounds ordered by `sort_order`.
    pub rounds: Vec<RoundEntity>,
    /// Creation timestamp for auditing/debugging.
    pub created_at: OffsetDateTime,
    /// Last time the game record was updated.
    pub updated_at: OffsetDateTime,
}

/// Mutable session pointer, one per in-progress game.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GameStateEntity {
    /// Round the session currently points at.
    pub current_round_id: Option<Uuid>,
    /// Question the session currently points at.
    pub current_question_id: Option<Uuid>,
    /// Break-screen flag; while set no submissions are accepted.
    pub transitioning: bool,
    /// Remaining pool values per team; only meaningful under pool rounds.
    pub points_remaining: IndexMap<Uuid, Vec<i64>>,
}

/// A team registered in a game session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TeamEntity {
    /// Opaque identity issued by the external auth collaborator.
    pub id: Uuid,
    /// Display name chosen by the team.
    pub name: String,
    /// When the team first joined the session.
    pub joined_at: OffsetDateTime,
}

/// Submitted value of an answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerValueEntity {
    /// Free-text or chosen-option answer.
    Text {
        /// The submitted text.
        value: String,
    },
    /// Ordered list of submitted items (ordered/list questions).
    List {
        /// The submitted items, in submission order.
        values: Vec<String>,
    },
}

/// Independently adjudicated item of a list answer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerItemEntity {
    /// Submitted item text.
    pub value: String,
    /// Host verdict; `None` until adjudicated.
    pub is_correct: Option<bool>,
}

/// One answer per (team, question) pair.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnswerEntity {
    /// Primary key of the answer.
    pub id: Uuid,
    /// Team that submitted.
    pub team_id: Uuid,
    /// Question this answers.
    pub question_id: Uuid,
    /// Submitted value.
    pub value: AnswerValueEntity,
    /// Pool value or wager spent on this answer, when applicable.
    pub points_used: Option<i64>,
    /// Host verdict; `None` until adjudicated.
    pub is_correct: Option<bool>,
    /// Points awarded once adjudicated; defaults to zero.
    pub awarded_points: i64,
    /// Sub-items for list questions; empty otherwise.
    pub items: Vec<AnswerItemEntity>,
}

/// Lightweight listing row for stored games.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameListItemEntity {
    /// Primary key of the game.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Lifecycle status.
    pub status: GameStatusEntity,
    /// Last update timestamp.
    pub updated_at: OffsetDateTime,
}
