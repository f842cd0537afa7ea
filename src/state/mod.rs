//! Shared application state: store handle, broadcast rooms, ack registry,
//! and the per-session serialization gates.

/// Pure session state machine.
pub mod machine;
/// Room-scoped broadcast hub and live roster.
pub mod rooms;
/// Runtime session types and entity conversions.
pub mod session;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::dao::store::SessionStore;
use crate::services::delivery::AckRegistry;
use crate::state::rooms::RoomHub;

/// Cheaply cloneable handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state shared by routes, services, and sockets.
pub struct AppState {
    store: Arc<dyn SessionStore>,
    rooms: RoomHub,
    acks: AckRegistry,
    gates: DashMap<Uuid, Arc<Mutex<()>>>,
    config: Arc<AppConfig>,
}

impl AppState {
    /// Construct the shared state around a storage backend.
    pub fn new(store: Arc<dyn SessionStore>, config: AppConfig) -> SharedState {
        let rooms = RoomHub::new(config.room_channel_capacity());
        let acks = AckRegistry::new(config.ack_retention());
        Arc::new(Self {
            store,
            rooms,
            acks,
            gates: DashMap::new(),
            config: Arc::new(config),
        })
    }

    /// Handle to the durable session store.
    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    /// Registry of active broadcast rooms.
    pub fn rooms(&self) -> &RoomHub {
        &self.rooms
    }

    /// Server-side reliable-delivery dedup registry.
    pub fn acks(&self) -> &AckRegistry {
        &self.acks
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.clone()
    }

    /// The serialization gate for one session.
    ///
    /// Every mutation of a session's pointer, pools, or ledger must run while
    /// holding this lock, so no two mutations for the same session interleave
    /// across their store round-trips. Different sessions are independent.
    pub fn session_gate(&self, game_id: Uuid) -> Arc<Mutex<()>> {
        self.gates
            .entry(game_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Drop bookkeeping for a torn-down session (gate and stored acks).
    pub fn forget_session(&self, game_id: Uuid) {
        self.gates.remove(&game_id);
        self.acks.clear_session(game_id);
    }
}
