use time::{OffsetDateTime, format_description::well_known::Rfc3339};

/// REST payloads for game bootstrap and inspection.
pub mod game;
/// Health check payload.
pub mod health;
/// Public session snapshot payloads.
pub mod snapshot;
/// DTO validation helpers.
pub mod validation;
/// WebSocket envelope protocol.
pub mod ws;

pub(crate) fn format_timestamp(time: OffsetDateTime) -> String {
    time.format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}
