/// In-memory reference storage backend.
pub mod memory;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer shared by all backends.
pub mod storage;
/// Durable session store trait consumed by the engine.
pub mod store;
