/// Answer ledger: submission and adjudication.
pub mod answer_service;
/// Reliable delivery: retry policy and ack idempotency registry.
pub mod delivery;
/// OpenAPI documentation generation.
pub mod documentation;
/// Room event broadcasting helpers.
pub mod events;
/// Game definition management and snapshots.
pub mod game_service;
/// Health check service.
pub mod health_service;
/// Scoring rules per point system and question kind.
pub mod scoring;
/// Session lifecycle and team registration.
pub mod session_service;
/// WebSocket connection and message handling service.
pub mod ws_service;
