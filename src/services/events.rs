//! Broadcast helpers that fan room events out to connected clients.
//!
//! Every helper is fire-and-forget: if no room exists for the game (nobody
//! is connected) the event is dropped, because late joiners rebuild their
//! view from the snapshot endpoint instead.

use uuid::Uuid;

use crate::{
    dto::ws::RoomEvent,
    state::{SharedState, rooms::Audience},
};

/// Announce that the host started the session.
pub fn broadcast_session_started(state: &SharedState, game_id: Uuid) {
    send(state, game_id, Audience::Everyone, RoomEvent::SessionStarted);
}

/// Announce the new session pointer after a host navigation.
pub fn broadcast_question_advanced(
    state: &SharedState,
    game_id: Uuid,
    round_id: Uuid,
    question_id: Uuid,
) {
    send(
        state,
        game_id,
        Audience::Everyone,
        RoomEvent::QuestionAdvanced {
            round_id,
            question_id,
        },
    );
}

/// Announce that the session reached its terminal state.
pub fn broadcast_session_completed(state: &SharedState, game_id: Uuid) {
    send(
        state,
        game_id,
        Audience::Everyone,
        RoomEvent::SessionCompleted,
    );
}

/// Announce that the break screen was raised or lowered.
pub fn broadcast_transition_changed(state: &SharedState, game_id: Uuid, transitioning: bool) {
    send(
        state,
        game_id,
        Audience::Everyone,
        RoomEvent::TransitionChanged { transitioning },
    );
}

/// Announce a team's new cumulative score after adjudication.
///
/// While the host keeps standings hidden the update still reaches the host
/// view, but never the team clients.
pub fn broadcast_score_updated(
    state: &SharedState,
    game_id: Uuid,
    team_id: Uuid,
    score: i64,
    scores_visible: bool,
) {
    let audience = if scores_visible {
        Audience::Everyone
    } else {
        Audience::HostOnly
    };
    send(
        state,
        game_id,
        audience,
        RoomEvent::ScoreUpdated { team_id, score },
    );
}

/// Tell the host that a team's answer landed.
///
/// Host-only so teams cannot infer each other's submission timing.
pub fn broadcast_answer_submitted(
    state: &SharedState,
    game_id: Uuid,
    team_id: Uuid,
    question_id: Uuid,
    suggested_correct: Option<bool>,
) {
    send(
        state,
        game_id,
        Audience::HostOnly,
        RoomEvent::AnswerSubmitted {
            team_id,
            question_id,
            suggested_correct,
        },
    );
}

/// Push the current roster to everyone in the room.
pub fn broadcast_roster(state: &SharedState, game_id: Uuid) {
    let Some(room) = state.rooms().existing_room(game_id) else {
        return;
    };
    let teams = room.roster_snapshot();
    room.broadcast(Audience::Everyone, RoomEvent::RosterSnapshot { teams });
}

/// Announce a change to the score-visibility flag.
pub fn broadcast_score_visibility(state: &SharedState, game_id: Uuid, visible: bool) {
    send(
        state,
        game_id,
        Audience::Everyone,
        RoomEvent::ScoreVisibility { visible },
    );
}

fn send(state: &SharedState, game_id: Uuid, audience: Audience, event: RoomEvent) {
    if let Some(room) = state.rooms().existing_room(game_id) {
        room.broadcast(audience, event);
    }
}
