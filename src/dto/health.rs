use serde::Serialize;
use utoipa::ToSchema;

/// Liveness report covering the engine and its session store.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall status, `ok` or `degraded`.
    pub status: String,
    /// Whether the session store answered its ping.
    pub store_reachable: bool,
}

impl HealthResponse {
    /// Report a healthy engine with a reachable store.
    pub fn healthy() -> Self {
        Self {
            status: "ok".to_string(),
            store_reachable: true,
        }
    }

    /// Report a degraded engine whose store failed its ping.
    pub fn store_unreachable() -> Self {
        Self {
            status: "degraded".to_string(),
            store_reachable: false,
        }
    }
}
