//! WebSocket connection lifecycle for session rooms.
//!
//! Every connection must identify as host or team before anything else. A
//! dedicated writer task drains an unbounded channel so room fan-out keeps
//! flowing while we await inbound frames. Actions carry a client-chosen
//! `msg_id`; replays of an already-executed id are answered with the stored
//! acknowledgement instead of running the action twice.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tokio_stream::wrappers::{BroadcastStream, errors::BroadcastStreamRecvError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::ws::{AckPayload, AckResult, ClientAction, ClientMessage, ClientRole, ServerMessage},
    error::ServiceError,
    services::{answer_service, events, session_service},
    state::{SharedState, rooms::Audience},
};

/// The identity a connection settled on after its `Identify` frame.
#[derive(Debug, Clone)]
enum ConnectionRole {
    Host,
    Team { team_id: Uuid },
}

impl ConnectionRole {
    fn is_host(&self) -> bool {
        matches!(self, ConnectionRole::Host)
    }
}

/// Handle the full lifecycle for one room WebSocket connection.
pub async fn handle_socket(state: SharedState, game_id: Uuid, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we
    // await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let identify_timeout = state.config().identify_timeout();
    let initial_message = match tokio::time::timeout(identify_timeout, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(%game_id, error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!(%game_id, "websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let identify = match serde_json::from_str::<ClientMessage>(&initial_message) {
        Ok(ClientMessage::Identify { role }) => role,
        Ok(ClientMessage::Action { .. }) => {
            warn!(%game_id, "first frame was not an identification");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Err(err) => {
            warn!(%game_id, error = %err, "failed to parse identification frame");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let connection_id = Uuid::new_v4();
    let role = match identify {
        ClientRole::Host => ConnectionRole::Host,
        ClientRole::Team { team_id, team_name } => {
            if let Err(err) =
                session_service::register_team(&state, game_id, team_id, &team_name).await
            {
                warn!(%game_id, %team_id, error = %err, "team registration failed");
                let _ = outbound_tx.send(Message::Close(None));
                finalize(writer_task, outbound_tx).await;
                return;
            }
            state
                .rooms()
                .room(game_id)
                .join_team(connection_id, team_id, team_name);
            ConnectionRole::Team { team_id }
        }
    };

    let room = state.rooms().room(game_id);
    // Mirror the persisted visibility flag into the room before the client
    // reads it from the welcome frame.
    if let Ok(game) = crate::services::game_service::load_game(&state, game_id).await {
        room.set_scores_visible(game.scores_visible);
    }

    let room_rx = room.subscribe();
    let relay_task = spawn_relay(room_rx, outbound_tx.clone(), role.is_host());

    send_message(
        &outbound_tx,
        &ServerMessage::Identified {
            game_id,
            scores_visible: room.scores_visible(),
        },
    );
    send_message(
        &outbound_tx,
        &ServerMessage::Event {
            event: crate::dto::ws::RoomEvent::RosterSnapshot {
                teams: room.roster_snapshot(),
            },
        },
    );
    if matches!(role, ConnectionRole::Team { .. }) {
        events::broadcast_roster(&state, game_id);
    }

    info!(%game_id, %connection_id, host = role.is_host(), "client joined room");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::Action { msg_id, action }) => {
                    let ack = acknowledge(&state, game_id, &role, msg_id, action).await;
                    send_message(&outbound_tx, &ServerMessage::Ack(ack));
                }
                Ok(ClientMessage::Identify { .. }) => {
                    warn!(%game_id, %connection_id, "ignoring duplicate identification frame");
                }
                Err(err) => {
                    warn!(%game_id, %connection_id, error = %err, "failed to parse client frame");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) | Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(%game_id, %connection_id, error = %err, "websocket error");
                break;
            }
        }
    }

    relay_task.abort();
    if room.leave(connection_id).is_some() {
        events::broadcast_roster(&state, game_id);
    }
    drop(room);
    if state.rooms().release_if_empty(game_id) {
        state.forget_session(game_id);
        info!(%game_id, "room released");
    }

    info!(%game_id, %connection_id, "client left room");
    finalize(writer_task, outbound_tx).await;
}

/// Execute an action exactly once per `msg_id` and produce its ack.
///
/// Both successes and definitive rejections are recorded, so a retried frame
/// gets back a byte-identical verdict without re-touching the session.
async fn acknowledge(
    state: &SharedState,
    game_id: Uuid,
    role: &ConnectionRole,
    msg_id: Uuid,
    action: ClientAction,
) -> AckPayload {
    if let Some(stored) = state.acks().replay(game_id, msg_id) {
        return stored;
    }

    let result = match dispatch(state, game_id, role, action).await {
        Ok(data) => AckResult::Ok { data },
        Err(err) => AckResult::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    };
    let ack = AckPayload { msg_id, result };
    state.acks().record(game_id, ack.clone());
    ack
}

async fn dispatch(
    state: &SharedState,
    game_id: Uuid,
    role: &ConnectionRole,
    action: ClientAction,
) -> Result<Option<serde_json::Value>, ServiceError> {
    match action {
        ClientAction::StartGame => {
            require_host(role)?;
            session_service::start_session(state, game_id).await?;
            Ok(None)
        }
        ClientAction::Advance { direction } => {
            require_host(role)?;
            session_service::advance_session(state, game_id, direction.into()).await?;
            Ok(None)
        }
        ClientAction::SetTransitioning { transitioning } => {
            require_host(role)?;
            session_service::set_transitioning(state, game_id, transitioning).await?;
            Ok(None)
        }
        ClientAction::CompleteGame => {
            require_host(role)?;
            session_service::complete_session(state, game_id).await?;
            Ok(None)
        }
        ClientAction::Adjudicate { answer_id, correct } => {
            require_host(role)?;
            let outcome = answer_service::adjudicate(state, game_id, answer_id, correct).await?;
            Ok(serde_json::to_value(outcome).ok())
        }
        ClientAction::AdjudicateItem {
            answer_id,
            item_index,
            correct,
        } => {
            require_host(role)?;
            let outcome =
                answer_service::adjudicate_item(state, game_id, answer_id, item_index, correct)
                    .await?;
            Ok(serde_json::to_value(outcome).ok())
        }
        ClientAction::SetScoreVisibility { visible } => {
            require_host(role)?;
            session_service::set_score_visibility(state, game_id, visible).await?;
            Ok(None)
        }
        ClientAction::SubmitAnswer {
            question_id,
            value,
            points_used,
        } => {
            let ConnectionRole::Team { team_id } = role else {
                return Err(ServiceError::Unauthorized(
                    "only team connections submit answers".into(),
                ));
            };
            answer_service::submit(state, game_id, *team_id, question_id, value, points_used)
                .await?;
            Ok(None)
        }
        ClientAction::RequestRoster => {
            events::broadcast_roster(state, game_id);
            Ok(None)
        }
    }
}

fn require_host(role: &ConnectionRole) -> Result<(), ServiceError> {
    if role.is_host() {
        Ok(())
    } else {
        Err(ServiceError::Unauthorized(
            "this action requires the host role".into(),
        ))
    }
}

fn spawn_relay(
    room_rx: tokio::sync::broadcast::Receiver<crate::state::rooms::AddressedEvent>,
    outbound_tx: mpsc::UnboundedSender<Message>,
    is_host: bool,
) -> JoinHandle<()> {
    let mut stream = BroadcastStream::new(room_rx);
    tokio::spawn(async move {
        while let Some(item) = stream.next().await {
            match item {
                Ok(addressed) => {
                    if addressed.audience == Audience::HostOnly && !is_host {
                        continue;
                    }
                    send_message(
                        &outbound_tx,
                        &ServerMessage::Event {
                            event: addressed.event,
                        },
                    );
                }
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "room relay lagged behind the broadcast channel");
                }
            }
        }
    })
}

/// Serialize a payload and push it onto the writer channel.
fn send_message(tx: &mpsc::UnboundedSender<Message>, value: &ServerMessage) {
    match serde_json::to_string(value) {
        Ok(payload) => {
            let _ = tx.send(Message::Text(payload.into()));
        }
        Err(err) => warn!(error = %err, "failed to serialize server message"),
    }
}

async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    if let Err(err) = writer_task.await {
        warn!(error = %err, "websocket writer task ended abnormally");
    }
}
