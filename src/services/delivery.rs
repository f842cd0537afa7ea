//! Reliable delivery: at-most-once execution for retried actions.
//!
//! The sender side attaches a fresh message id to every state-changing action
//! and retries on ack timeout; the receiving side keeps a session-scoped
//! registry of already-processed ids and replays the stored acknowledgement
//! instead of re-executing the handler. Mutations such as `advance` are
//! relative steps, so blind re-execution of a retried frame would
//! double-advance the session.

use std::time::Duration;

use dashmap::DashMap;
use futures::future::BoxFuture;
use indexmap::IndexMap;
use rand::Rng;
use thiserror::Error;
use tokio::time::{sleep, timeout};
use uuid::Uuid;

use crate::dto::ws::{AckPayload, AckResult, ClientAction};

/// Retry tuning for a reliable sender.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// How long to wait for an acknowledgement per attempt.
    pub ack_timeout: Duration,
    /// Total attempts (first emission included) before giving up.
    pub max_attempts: u32,
    /// Upper bound of the random pause inserted between attempts.
    pub retry_jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            ack_timeout: Duration::from_secs(2),
            max_attempts: 4,
            retry_jitter: Duration::from_millis(250),
        }
    }
}

/// Failure modes of a reliable delivery attempt.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The server definitively rejected the action; never retried.
    #[error("action rejected ({code}): {message}")]
    Rejected {
        /// Stable machine-readable error code.
        code: String,
        /// Human readable description.
        message: String,
    },
    /// No acknowledgement arrived within the retry ceiling.
    #[error("no acknowledgment after {attempts} attempts")]
    RetriesExhausted {
        /// Number of emissions performed.
        attempts: u32,
    },
    /// The underlying transport is gone; retrying cannot help.
    #[error("transport closed")]
    TransportClosed,
}

/// Transport over which a reliable sender emits actions.
///
/// `emit` sends one frame and resolves once the matching acknowledgement
/// arrives; the sender wraps each attempt in its own timeout.
pub trait AckTransport: Send + Sync {
    /// Emit the action under `msg_id` and wait for its acknowledgement.
    fn emit(
        &self,
        msg_id: Uuid,
        action: ClientAction,
    ) -> BoxFuture<'_, Result<AckPayload, TransportClosed>>;
}

/// Marker error for a dead transport.
#[derive(Debug, Clone, Copy, Error)]
#[error("transport closed")]
pub struct TransportClosed;

/// Client-side wrapper that assigns a unique id to every emission and retries
/// until acknowledged.
pub struct ReliableSender<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: AckTransport> ReliableSender<T> {
    /// Wrap a transport with the given retry policy.
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// Deliver one action at most once, retrying timeouts up to the ceiling.
    ///
    /// Explicit rejections are surfaced immediately: a logically invalid
    /// action will not become valid by retrying.
    pub async fn deliver(
        &self,
        action: ClientAction,
    ) -> Result<Option<serde_json::Value>, DeliveryError> {
        let msg_id = Uuid::new_v4();

        for attempt in 1..=self.policy.max_attempts {
            let emission = self.transport.emit(msg_id, action.clone());
            match timeout(self.policy.ack_timeout, emission).await {
                Ok(Ok(ack)) => {
                    return match ack.result {
                        AckResult::Ok { data } => Ok(data),
                        AckResult::Error { code, message } => {
                            Err(DeliveryError::Rejected { code, message })
                        }
                    };
                }
                Ok(Err(TransportClosed)) => return Err(DeliveryError::TransportClosed),
                Err(_) if attempt < self.policy.max_attempts => {
                    let jitter_ms = self.policy.retry_jitter.as_millis() as u64;
                    if jitter_ms > 0 {
                        let pause = rand::rng().random_range(0..=jitter_ms);
                        sleep(Duration::from_millis(pause)).await;
                    }
                }
                Err(_) => {}
            }
        }

        Err(DeliveryError::RetriesExhausted {
            attempts: self.policy.max_attempts,
        })
    }
}

/// Server-side registry of processed message ids and their acknowledgements.
///
/// Scoped per session and capacity-bounded: the oldest entry is evicted once
/// the retention window is full, and the whole session bucket is dropped when
/// its room closes. Retried frames whose id is still retained are answered
/// with the stored ack verbatim, without re-executing the handler. Stored
/// rejections are replayed too, so a retried invalid action observes the same
/// failure as the original.
pub struct AckRegistry {
    sessions: DashMap<Uuid, IndexMap<Uuid, AckPayload>>,
    retention: usize,
}

impl AckRegistry {
    /// Create a registry keeping at most `retention` acks per session.
    pub fn new(retention: usize) -> Self {
        Self {
            sessions: DashMap::new(),
            retention: retention.max(1),
        }
    }

    /// Look up the stored acknowledgement for a message id.
    pub fn replay(&self, game_id: Uuid, msg_id: Uuid) -> Option<AckPayload> {
        self.sessions
            .get(&game_id)
            .and_then(|acks| acks.get(&msg_id).cloned())
    }

    /// Store the acknowledgement produced for a freshly executed action.
    pub fn record(&self, game_id: Uuid, ack: AckPayload) {
        let mut acks = self.sessions.entry(game_id).or_default();
        while acks.len() >= self.retention {
            acks.shift_remove_index(0);
        }
        acks.insert(ack.msg_id, ack);
    }

    /// Drop every stored ack of a session.
    pub fn clear_session(&self, game_id: Uuid) {
        self.sessions.remove(&game_id);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::dto::ws::DirectionDto;

    /// Transport that executes a handler behind an [`AckRegistry`] but loses
    /// the first `lost_acks` acknowledgements on the way back.
    struct LossyTransport {
        game_id: Uuid,
        registry: Arc<AckRegistry>,
        executions: Arc<AtomicU32>,
        lost_acks: AtomicU32,
    }

    impl AckTransport for LossyTransport {
        fn emit(
            &self,
            msg_id: Uuid,
            _action: ClientAction,
        ) -> BoxFuture<'_, Result<AckPayload, TransportClosed>> {
            Box::pin(async move {
                let ack = match self.registry.replay(self.game_id, msg_id) {
                    Some(stored) => stored,
                    None => {
                        self.executions.fetch_add(1, Ordering::SeqCst);
                        let ack = AckPayload {
                            msg_id,
                            result: AckResult::Ok { data: None },
                        };
                        self.registry.record(self.game_id, ack.clone());
                        ack
                    }
                };

                let remaining = self
                    .lost_acks
                    .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                        Some(n.saturating_sub(1))
                    })
                    .unwrap_or(0);
                if remaining > 0 {
                    // Ack dropped on the floor; keep the caller waiting so its
                    // per-attempt timeout fires.
                    futures::future::pending::<()>().await;
                }
                Ok(ack)
            })
        }
    }

    fn advance_action() -> ClientAction {
        ClientAction::Advance {
            direction: DirectionDto::Next,
        }
    }

    #[tokio::test]
    async fn retried_emission_executes_exactly_once() {
        let registry = Arc::new(AckRegistry::new(16));
        let executions = Arc::new(AtomicU32::new(0));
        let transport = LossyTransport {
            game_id: Uuid::new_v4(),
            registry: registry.clone(),
            executions: executions.clone(),
            lost_acks: AtomicU32::new(2),
        };
        let sender = ReliableSender::new(
            transport,
            RetryPolicy {
                ack_timeout: Duration::from_millis(20),
                max_attempts: 4,
                retry_jitter: Duration::ZERO,
            },
        );

        sender.deliver(advance_action()).await.unwrap();
        assert_eq!(executions.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn replayed_id_returns_identical_ack() {
        let registry = AckRegistry::new(16);
        let game_id = Uuid::new_v4();
        let msg_id = Uuid::new_v4();
        let ack = AckPayload {
            msg_id,
            result: AckResult::Ok {
                data: Some(serde_json::json!({ "score": 40 })),
            },
        };

        registry.record(game_id, ack.clone());
        for _ in 0..3 {
            let replayed = registry.replay(game_id, msg_id).unwrap();
            assert_eq!(
                serde_json::to_value(&replayed).unwrap(),
                serde_json::to_value(&ack).unwrap()
            );
        }
    }

    #[tokio::test]
    async fn retry_ceiling_reports_exhaustion() {
        struct SilentTransport;
        impl AckTransport for SilentTransport {
            fn emit(
                &self,
                _msg_id: Uuid,
                _action: ClientAction,
            ) -> BoxFuture<'_, Result<AckPayload, TransportClosed>> {
                Box::pin(futures::future::pending())
            }
        }

        let sender = ReliableSender::new(
            SilentTransport,
            RetryPolicy {
                ack_timeout: Duration::from_millis(10),
                max_attempts: 3,
                retry_jitter: Duration::ZERO,
            },
        );

        match sender.deliver(advance_action()).await {
            Err(DeliveryError::RetriesExhausted { attempts }) => assert_eq!(attempts, 3),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn rejection_is_not_retried() {
        struct RejectingTransport {
            emissions: Arc<AtomicU32>,
        }
        impl AckTransport for RejectingTransport {
            fn emit(
                &self,
                msg_id: Uuid,
                _action: ClientAction,
            ) -> BoxFuture<'_, Result<AckPayload, TransportClosed>> {
                self.emissions.fetch_add(1, Ordering::SeqCst);
                Box::pin(async move {
                    Ok(AckPayload {
                        msg_id,
                        result: AckResult::Error {
                            code: "no_more_questions".into(),
                            message: "already on the last question".into(),
                        },
                    })
                })
            }
        }

        let emissions = Arc::new(AtomicU32::new(0));
        let sender = ReliableSender::new(
            RejectingTransport {
                emissions: emissions.clone(),
            },
            RetryPolicy::default(),
        );

        match sender.deliver(advance_action()).await {
            Err(DeliveryError::Rejected { code, .. }) => assert_eq!(code, "no_more_questions"),
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(emissions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn retention_evicts_oldest_ack() {
        let registry = AckRegistry::new(2);
        let game_id = Uuid::new_v4();
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();

        for &msg_id in &ids {
            registry.record(
                game_id,
                AckPayload {
                    msg_id,
                    result: AckResult::Ok { data: None },
                },
            );
        }

        assert!(registry.replay(game_id, ids[0]).is_none());
        assert!(registry.replay(game_id, ids[1]).is_some());
        assert!(registry.replay(game_id, ids[2]).is_some());
    }

    #[test]
    fn clear_session_drops_all_acks() {
        let registry = AckRegistry::new(8);
        let game_id = Uuid::new_v4();
        let msg_id = Uuid::new_v4();
        registry.record(
            game_id,
            AckPayload {
                msg_id,
                result: AckResult::Ok { data: None },
            },
        );

        registry.clear_session(game_id);
        assert!(registry.replay(game_id, msg_id).is_none());
    }
}
