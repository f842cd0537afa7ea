use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::game::{GameStatusDto, QuestionKindDto, RoundTypeDto};
use crate::state::session::{Question, Round};

/// Question projection safe to show team clients.
///
/// Unlike [`crate::dto::game::QuestionSummary`] this never carries the
/// correct-answer designation.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicQuestion {
    /// Stable identifier.
    pub id: Uuid,
    /// Position within the round.
    pub sort_order: u32,
    /// Question kind.
    pub kind: QuestionKindDto,
    /// Prompt shown to teams.
    pub prompt: String,
    /// Option set for choice kinds.
    pub options: Vec<String>,
}

impl From<&Question> for PublicQuestion {
    fn from(value: &Question) -> Self {
        Self {
            id: value.id,
            sort_order: value.sort_order,
            kind: crate::dao::models::QuestionKindEntity::from(value.kind).into(),
            prompt: value.prompt.clone(),
            options: value.options.clone(),
        }
    }
}

/// Round header safe to show team clients.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicRound {
    /// Stable identifier.
    pub id: Uuid,
    /// Position within the game.
    pub sort_order: u32,
    /// Gameplay flavour.
    pub round_type: RoundTypeDto,
}

impl From<&Round> for PublicRound {
    fn from(value: &Round) -> Self {
        Self {
            id: value.id,
            sort_order: value.sort_order,
            round_type: crate::dao::models::RoundTypeEntity::from(value.round_type).into(),
        }
    }
}

/// One team's row in the derived standings.
#[derive(Debug, Serialize, ToSchema)]
pub struct TeamStanding {
    /// Team identity.
    pub team_id: Uuid,
    /// Display name.
    pub name: String,
    /// Cumulative score; `None` when the host keeps scores hidden.
    pub score: Option<i64>,
    /// Whether the team has submitted for the current question.
    pub submitted: bool,
    /// Remaining selectable pool values, when the current round uses pools.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_remaining: Option<Vec<i64>>,
}

/// Everything a late-joining client needs to render the session.
///
/// Derived on demand from the persisted game, session pointer and answer
/// ledger; never cached.
#[derive(Debug, Serialize, ToSchema)]
pub struct StateSnapshot {
    /// Lifecycle status.
    pub status: GameStatusDto,
    /// Round currently in play.
    pub current_round_id: Option<Uuid>,
    /// Question currently in play.
    pub current_question_id: Option<Uuid>,
    /// Break-screen flag; submissions are refused while set.
    pub transitioning: bool,
    /// Whether standings are visible to team clients.
    pub scores_visible: bool,
    /// Header of the current round, when one is in play.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_round: Option<PublicRound>,
    /// Public view of the current question, when one is in play.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_question: Option<PublicQuestion>,
    /// Standings in team join order.
    pub standings: Vec<TeamStanding>,
}
