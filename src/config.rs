//! Application-level configuration loading for delivery and channel tuning.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use tracing::{info, warn};

use crate::services::delivery::RetryPolicy;

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TRIVIA_NIGHT_BACK_CONFIG_PATH";

const DEFAULT_ACK_TIMEOUT_MS: u64 = 2_000;
const DEFAULT_ACK_MAX_ATTEMPTS: u32 = 4;
const DEFAULT_RETRY_JITTER_MS: u64 = 250;
const DEFAULT_ACK_RETENTION: usize = 256;
const DEFAULT_ROOM_CHANNEL_CAPACITY: usize = 64;
const DEFAULT_IDENTIFY_TIMEOUT_MS: u64 = 10_000;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    ack_timeout_ms: u64,
    ack_max_attempts: u32,
    retry_jitter_ms: u64,
    ack_retention: usize,
    room_channel_capacity: usize,
    identify_timeout_ms: u64,
}

impl AppConfig {
    /// Load the configuration from disk, falling back to baked-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let config: Self = raw.into();
                    info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Retry policy handed to reliable senders.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            ack_timeout: Duration::from_millis(self.ack_timeout_ms),
            max_attempts: self.ack_max_attempts,
            retry_jitter: Duration::from_millis(self.retry_jitter_ms),
        }
    }

    /// Per-session ack retention window.
    pub fn ack_retention(&self) -> usize {
        self.ack_retention
    }

    /// Capacity of each room's broadcast channel.
    pub fn room_channel_capacity(&self) -> usize {
        self.room_channel_capacity
    }

    /// How long a fresh WebSocket connection may take to identify itself.
    pub fn identify_timeout(&self) -> Duration {
        Duration::from_millis(self.identify_timeout_ms)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ack_timeout_ms: DEFAULT_ACK_TIMEOUT_MS,
            ack_max_attempts: DEFAULT_ACK_MAX_ATTEMPTS,
            retry_jitter_ms: DEFAULT_RETRY_JITTER_MS,
            ack_retention: DEFAULT_ACK_RETENTION,
            room_channel_capacity: DEFAULT_ROOM_CHANNEL_CAPACITY,
            identify_timeout_ms: DEFAULT_IDENTIFY_TIMEOUT_MS,
        }
    }
}

/// JSON representation of the configuration file.
#[derive(Debug, Deserialize)]
struct RawConfig {
    ack_timeout_ms: Option<u64>,
    ack_max_attempts: Option<u32>,
    retry_jitter_ms: Option<u64>,
    ack_retention: Option<usize>,
    room_channel_capacity: Option<usize>,
    identify_timeout_ms: Option<u64>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = Self::default();
        Self {
            ack_timeout_ms: value.ack_timeout_ms.unwrap_or(defaults.ack_timeout_ms),
            ack_max_attempts: value
                .ack_max_attempts
                .unwrap_or(defaults.ack_max_attempts)
                .max(1),
            retry_jitter_ms: value.retry_jitter_ms.unwrap_or(defaults.retry_jitter_ms),
            ack_retention: value.ack_retention.unwrap_or(defaults.ack_retention).max(1),
            room_channel_capacity: value
                .room_channel_capacity
                .unwrap_or(defaults.room_channel_capacity)
                .max(1),
            identify_timeout_ms: value
                .identify_timeout_ms
                .unwrap_or(defaults.identify_timeout_ms),
        }
    }
}

fn resolve_config_path() -> PathBuf {
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_raw_config_fills_defaults() {
        let raw: RawConfig = serde_json::from_str(r#"{ "ack_timeout_ms": 500 }"#).unwrap();
        let config: AppConfig = raw.into();

        assert_eq!(config.retry_policy().ack_timeout, Duration::from_millis(500));
        assert_eq!(config.retry_policy().max_attempts, DEFAULT_ACK_MAX_ATTEMPTS);
        assert_eq!(config.ack_retention(), DEFAULT_ACK_RETENTION);
    }

    #[test]
    fn zero_attempts_is_clamped() {
        let raw: RawConfig = serde_json::from_str(r#"{ "ack_max_attempts": 0 }"#).unwrap();
        let config: AppConfig = raw.into();
        assert_eq!(config.retry_policy().max_attempts, 1);
    }
}
