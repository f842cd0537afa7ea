//! Room-scoped broadcast hub and live roster.
//!
//! One room exists per game session. The roster is an ephemeral, rebuildable
//! cache fed solely by join/leave/disconnect events; it is never consulted for
//! scoring or progression, which always read the durable store.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use indexmap::IndexMap;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::dto::ws::{RoomEvent, RosterTeam};

/// Which room members should receive an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    /// Every connection in the room.
    Everyone,
    /// Host connections only (raw team submissions).
    HostOnly,
}

/// An event together with its delivery audience.
#[derive(Debug, Clone)]
pub struct AddressedEvent {
    /// Who should receive it.
    pub audience: Audience,
    /// The payload.
    pub event: RoomEvent,
}

/// Live roster line for one connected team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    /// Team identity key.
    pub team_id: Uuid,
    /// Display name.
    pub team_name: String,
    /// Connection currently representing the team.
    pub connection_id: Uuid,
}

/// Per-session broadcast room.
pub struct Room {
    game_id: Uuid,
    sender: broadcast::Sender<AddressedEvent>,
    roster: Mutex<IndexMap<Uuid, RosterEntry>>,
    scores_visible: AtomicBool,
}

impl Room {
    fn new(game_id: Uuid, capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity);
        Self {
            game_id,
            sender,
            roster: Mutex::new(IndexMap::new()),
            scores_visible: AtomicBool::new(true),
        }
    }

    /// Id of the game this room serves.
    pub fn game_id(&self) -> Uuid {
        self.game_id
    }

    /// Register a new subscriber that will receive subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<AddressedEvent> {
        self.sender.subscribe()
    }

    /// Send an event to the given audience, ignoring delivery errors.
    pub fn broadcast(&self, audience: Audience, event: RoomEvent) {
        let _ = self.sender.send(AddressedEvent { audience, event });
    }

    /// Number of currently attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Record a team connection, replacing any previous connection for the
    /// same team (reconnects supersede stale entries).
    pub fn join_team(&self, connection_id: Uuid, team_id: Uuid, team_name: String) {
        let mut roster = self.roster.lock().expect("roster lock poisoned");
        roster.insert(
            team_id,
            RosterEntry {
                team_id,
                team_name,
                connection_id,
            },
        );
    }

    /// Drop the roster line owned by `connection_id`, if it still owns one.
    ///
    /// A disconnect arriving after the team already reconnected must not evict
    /// the fresh entry, hence the connection-id ownership check.
    pub fn leave(&self, connection_id: Uuid) -> Option<Uuid> {
        let mut roster = self.roster.lock().expect("roster lock poisoned");
        let team_id = roster
            .values()
            .find(|entry| entry.connection_id == connection_id)
            .map(|entry| entry.team_id)?;
        roster.shift_remove(&team_id);
        Some(team_id)
    }

    /// Current roster in join order.
    pub fn roster_snapshot(&self) -> Vec<RosterTeam> {
        let roster = self.roster.lock().expect("roster lock poisoned");
        roster
            .values()
            .map(|entry| RosterTeam {
                team_id: entry.team_id,
                team_name: entry.team_name.clone(),
            })
            .collect()
    }

    /// Whether standings are currently visible to team clients.
    pub fn scores_visible(&self) -> bool {
        self.scores_visible.load(Ordering::Relaxed)
    }

    /// Update the standings visibility mirror.
    pub fn set_scores_visible(&self, visible: bool) {
        self.scores_visible.store(visible, Ordering::Relaxed);
    }
}

/// Registry of active rooms keyed by game id.
pub struct RoomHub {
    rooms: DashMap<Uuid, Arc<Room>>,
    capacity: usize,
}

impl RoomHub {
    /// Create a hub whose rooms use broadcast channels of `capacity` events.
    pub fn new(capacity: usize) -> Self {
        Self {
            rooms: DashMap::new(),
            capacity,
        }
    }

    /// Fetch the room for a game, creating it on first use.
    pub fn room(&self, game_id: Uuid) -> Arc<Room> {
        self.rooms
            .entry(game_id)
            .or_insert_with(|| Arc::new(Room::new(game_id, self.capacity)))
            .clone()
    }

    /// Fetch the room for a game only if it already exists.
    pub fn existing_room(&self, game_id: Uuid) -> Option<Arc<Room>> {
        self.rooms.get(&game_id).map(|entry| entry.value().clone())
    }

    /// Drop the room when its last subscriber detached. Returns whether the
    /// room was removed.
    pub fn release_if_empty(&self, game_id: Uuid) -> bool {
        self.rooms
            .remove_if(&game_id, |_, room| room.subscriber_count() == 0)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconnect_replaces_roster_entry() {
        let room = Room::new(Uuid::new_v4(), 8);
        let team_id = Uuid::new_v4();
        let first_conn = Uuid::new_v4();
        let second_conn = Uuid::new_v4();

        room.join_team(first_conn, team_id, "Alpha".into());
        room.join_team(second_conn, team_id, "Alpha".into());

        // Stale disconnect after the reconnect must not evict the team.
        assert_eq!(room.leave(first_conn), None);
        assert_eq!(room.roster_snapshot().len(), 1);

        assert_eq!(room.leave(second_conn), Some(team_id));
        assert!(room.roster_snapshot().is_empty());
    }

    #[test]
    fn roster_keeps_join_order() {
        let room = Room::new(Uuid::new_v4(), 8);
        let first = Uuid::new_v4();
        let second = Uuid::new_v4();

        room.join_team(Uuid::new_v4(), first, "First".into());
        room.join_team(Uuid::new_v4(), second, "Second".into());

        let snapshot = room.roster_snapshot();
        assert_eq!(snapshot[0].team_id, first);
        assert_eq!(snapshot[1].team_id, second);
    }

    #[tokio::test]
    async fn broadcast_reaches_all_subscribers() {
        let hub = RoomHub::new(8);
        let game_id = Uuid::new_v4();
        let room = hub.room(game_id);

        let mut rx_a = room.subscribe();
        let mut rx_b = room.subscribe();
        room.broadcast(Audience::Everyone, RoomEvent::SessionStarted);

        for rx in [&mut rx_a, &mut rx_b] {
            let received = rx.recv().await.unwrap();
            assert_eq!(received.audience, Audience::Everyone);
            assert!(matches!(received.event, RoomEvent::SessionStarted));
        }
    }

    #[test]
    fn release_only_drops_empty_rooms() {
        let hub = RoomHub::new(8);
        let game_id = Uuid::new_v4();
        let room = hub.room(game_id);

        let rx = room.subscribe();
        assert!(!hub.release_if_empty(game_id));
        drop(rx);
        assert!(hub.release_if_empty(game_id));
        assert!(hub.existing_room(game_id).is_none());
    }
}
