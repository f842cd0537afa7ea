use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Ping the session store and fold the result into a health payload.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.store().health_check().await {
        Ok(()) => HealthResponse::healthy(),
        Err(err) => {
            warn!(error = %err, "session store failed its health ping");
            HealthResponse::store_unreachable()
        }
    }
}
