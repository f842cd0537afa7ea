//! Tagged-envelope WebSocket protocol.
//!
//! Every event name maps to exactly one variant with a fixed field set; the
//! envelope is validated at the boundary before anything reaches the session
//! state machine.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::models::AnswerValueEntity;
use crate::state::machine::Direction;

/// Messages accepted from WebSocket clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First frame of every connection: announce host or team identity.
    Identify {
        /// The connection's role in the room.
        role: ClientRole,
    },
    /// A state-changing action wrapped with an idempotency key.
    Action {
        /// Fresh unique id generated by the sender; replays with the same id
        /// are acknowledged without re-executing the action.
        msg_id: Uuid,
        /// The requested action.
        action: ClientAction,
    },
}

/// Role announced by a connecting client.
///
/// Identities are issued by the external auth collaborator; the engine trusts
/// them and only distinguishes host from team.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ClientRole {
    /// The session host.
    Host,
    /// A team client carrying its opaque identity.
    Team {
        /// Team identity key.
        team_id: Uuid,
        /// Display name shown in rosters.
        team_name: String,
    },
}

/// Navigation direction on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DirectionDto {
    /// One question forward.
    Next,
    /// One question backward.
    Prev,
}

impl From<DirectionDto> for Direction {
    fn from(value: DirectionDto) -> Self {
        match value {
            DirectionDto::Next => Direction::Next,
            DirectionDto::Prev => Direction::Prev,
        }
    }
}

/// Submitted answer value on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnswerValueDto {
    /// Free-text or chosen-option answer.
    Text {
        /// The submitted text.
        value: String,
    },
    /// Ordered list of items (ordered/list questions).
    List {
        /// The submitted items, in order.
        values: Vec<String>,
    },
}

impl From<AnswerValueDto> for AnswerValueEntity {
    fn from(value: AnswerValueDto) -> Self {
        match value {
            AnswerValueDto::Text { value } => AnswerValueEntity::Text { value },
            AnswerValueDto::List { values } => AnswerValueEntity::List { values },
        }
    }
}

/// Actions clients may request through the room.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ClientAction {
    /// Host: start the pending session.
    StartGame,
    /// Host: step the question pointer.
    Advance {
        /// Direction of the step.
        direction: DirectionDto,
    },
    /// Host: toggle the break screen.
    SetTransitioning {
        /// New value of the flag.
        transitioning: bool,
    },
    /// Host: complete the session on its last question.
    CompleteGame,
    /// Host: adjudicate a whole answer.
    Adjudicate {
        /// Answer to judge.
        answer_id: Uuid,
        /// Verdict.
        correct: bool,
    },
    /// Host: adjudicate one item of a list answer.
    AdjudicateItem {
        /// Owning answer.
        answer_id: Uuid,
        /// Zero-based item index.
        item_index: usize,
        /// Verdict.
        correct: bool,
    },
    /// Host: toggle whether teams can see the standings.
    SetScoreVisibility {
        /// New visibility.
        visible: bool,
    },
    /// Team: submit an answer for the current question.
    SubmitAnswer {
        /// Question being answered; must be the session's current question.
        question_id: Uuid,
        /// The answer payload.
        value: AnswerValueDto,
        /// Pool value or wager spent, when the round requires one.
        points_used: Option<i64>,
    },
    /// Any role: ask for a fresh roster snapshot.
    RequestRoster,
}

/// Outcome attached to an acknowledgement.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AckResult {
    /// The action executed (or had already executed under the same id).
    Ok {
        /// Action-specific payload, e.g. the updated score after adjudication.
        #[serde(skip_serializing_if = "Option::is_none")]
        data: Option<serde_json::Value>,
    },
    /// The action was definitively rejected; senders must not retry.
    Error {
        /// Stable machine-readable error code.
        code: String,
        /// Human readable description.
        message: String,
    },
}

/// Acknowledgement for a reliably delivered action.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AckPayload {
    /// Id of the acknowledged action.
    pub msg_id: Uuid,
    /// Result of executing (or replaying) the action.
    pub result: AckResult,
}

/// Roster line for one connected team.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct RosterTeam {
    /// Team identity key.
    pub team_id: Uuid,
    /// Display name.
    pub team_name: String,
}

/// Events fanned out to room members.
///
/// `QuestionAdvanced` is a lightweight refetch signal; the full session
/// payload is never pushed so clients cannot diverge from the durable store.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RoomEvent {
    /// The session left pending and points at its first question.
    SessionStarted,
    /// The pointer moved; clients should refetch the snapshot.
    QuestionAdvanced {
        /// New current round.
        round_id: Uuid,
        /// New current question.
        question_id: Uuid,
    },
    /// The session reached its terminal state.
    SessionCompleted,
    /// The break screen was toggled.
    TransitionChanged {
        /// New value of the flag.
        transitioning: bool,
    },
    /// A team's derived score changed after adjudication.
    ScoreUpdated {
        /// Team whose score changed.
        team_id: Uuid,
        /// New cumulative score.
        score: i64,
    },
    /// A team submitted an answer (relayed to the host view only).
    AnswerSubmitted {
        /// Submitting team.
        team_id: Uuid,
        /// Answered question.
        question_id: Uuid,
        /// Pre-grade against the stored correct answers, when the question
        /// kind allows one. The host verdict always wins.
        suggested_correct: Option<bool>,
    },
    /// Full roster of currently connected teams.
    RosterSnapshot {
        /// Connected teams in join order.
        teams: Vec<RosterTeam>,
    },
    /// Standings visibility changed.
    ScoreVisibility {
        /// Whether teams may see the standings.
        visible: bool,
    },
}

/// Messages sent to WebSocket clients.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Positive response to a valid `Identify` frame.
    Identified {
        /// Room the connection joined.
        game_id: Uuid,
        /// Whether standings are currently visible to teams.
        scores_visible: bool,
    },
    /// Acknowledgement of a reliably delivered action.
    Ack(AckPayload),
    /// Room event fan-out.
    Event {
        /// The event payload.
        event: RoomEvent,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identify_frame_round_trips() {
        let json = r#"{"type":"identify","role":{"role":"team","team_id":"7f5ff2a3-9f9e-4f10-8b24-1df9df29e7a8","team_name":"Quizzly Bears"}}"#;
        let message: ClientMessage = serde_json::from_str(json).unwrap();
        match message {
            ClientMessage::Identify {
                role: ClientRole::Team { team_name, .. },
            } => assert_eq!(team_name, "Quizzly Bears"),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn action_envelope_carries_msg_id() {
        let msg_id = Uuid::new_v4();
        let json = format!(
            r#"{{"type":"action","msg_id":"{msg_id}","action":{{"action":"advance","direction":"next"}}}}"#
        );
        let message: ClientMessage = serde_json::from_str(&json).unwrap();
        match message {
            ClientMessage::Action {
                msg_id: parsed,
                action: ClientAction::Advance {
                    direction: DirectionDto::Next,
                },
            } => assert_eq!(parsed, msg_id),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn unknown_event_name_is_rejected() {
        let json = r#"{"type":"action","msg_id":"7f5ff2a3-9f9e-4f10-8b24-1df9df29e7a8","action":{"action":"reboot"}}"#;
        assert!(serde_json::from_str::<ClientMessage>(json).is_err());
    }

    #[test]
    fn ack_error_serializes_code_and_message() {
        let payload = AckPayload {
            msg_id: Uuid::new_v4(),
            result: AckResult::Error {
                code: "question_closed".into(),
                message: "the break screen is up".into(),
            },
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["result"]["status"], "error");
        assert_eq!(json["result"]["code"], "question_closed");
    }
}
