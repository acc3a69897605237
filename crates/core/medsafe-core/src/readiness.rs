//! One-shot initialization state with bounded waiting
//!
//! `Uninitialized -> Initializing -> Ready | Failed(reason)`. `Failed` is
//! terminal for the life of the process. Readers wait for a settled state
//! up to a timeout and never block indefinitely.

use crate::{MedSafeError, Result};
use serde::Serialize;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// Lifecycle of a component that initializes once in the background
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "reason", rename_all = "snake_case")]
pub enum StoreState {
    /// Nothing has started yet
    Uninitialized,
    /// Initialization is running
    Initializing,
    /// Serving lookups
    Ready,
    /// Initialization failed; permanent
    Failed(String),
}

impl StoreState {
    /// Ready or Failed
    pub fn is_settled(&self) -> bool {
        matches!(self, StoreState::Ready | StoreState::Failed(_))
    }
}

/// Shared readiness flag that supports "wait up to N for a transition"
#[derive(Debug)]
pub struct Readiness {
    tx: watch::Sender<StoreState>,
}

impl Readiness {
    /// Start in `Uninitialized`
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(StoreState::Uninitialized);
        Self { tx }
    }

    /// Current state
    pub fn state(&self) -> StoreState {
        self.tx.borrow().clone()
    }

    /// Move `Uninitialized -> Initializing`. Returns false if some other
    /// caller already claimed initialization.
    pub fn try_begin(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == StoreState::Uninitialized {
                *state = StoreState::Initializing;
                true
            } else {
                false
            }
        })
    }

    /// Mark ready. Ignored once failed.
    pub fn mark_ready(&self) {
        let changed = self.tx.send_if_modified(|state| match state {
            StoreState::Failed(_) | StoreState::Ready => false,
            _ => {
                *state = StoreState::Ready;
                true
            }
        });
        if changed {
            info!("Store is ready");
        }
    }

    /// Mark failed. The first failure reason wins.
    pub fn mark_failed(&self, reason: impl Into<String>) {
        let reason = reason.into();
        let changed = self.tx.send_if_modified(|state| match state {
            StoreState::Failed(_) => false,
            _ => {
                *state = StoreState::Failed(reason.clone());
                true
            }
        });
        if changed {
            error!(%reason, "Store initialization failed");
        }
    }

    /// Wait until the state settles, at most `timeout`.
    ///
    /// `Ok(())` when ready, `StoreInitFailed` immediately if failed,
    /// `StoreInitTimeout` if nothing settled in time.
    pub async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let mut rx = self.tx.subscribe();
        let settled = match tokio::time::timeout(timeout, rx.wait_for(StoreState::is_settled)).await
        {
            Ok(Ok(state)) => (*state).clone(),
            Ok(Err(_)) => {
                return Err(MedSafeError::store_init_failed("readiness channel closed"));
            }
            Err(_) => {
                debug!(waited_ms = timeout.as_millis() as u64, "Timed out waiting for store");
                return Err(MedSafeError::StoreInitTimeout {
                    waited_ms: timeout.as_millis() as u64,
                });
            }
        };

        match settled {
            StoreState::Ready => Ok(()),
            StoreState::Failed(reason) => Err(MedSafeError::StoreInitFailed(reason)),
            StoreState::Uninitialized | StoreState::Initializing => {
                Err(MedSafeError::store_init_failed("store settled in an unsettled state"))
            }
        }
    }
}

impl Default for Readiness {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_begin_only_once() {
        let readiness = Readiness::new();
        assert!(readiness.try_begin());
        assert!(!readiness.try_begin());
        assert_eq!(readiness.state(), StoreState::Initializing);
    }

    #[test]
    fn test_failed_is_terminal() {
        let readiness = Readiness::new();
        readiness.try_begin();
        readiness.mark_failed("seed missing");
        readiness.mark_ready();
        readiness.mark_failed("second reason");
        assert_eq!(readiness.state(), StoreState::Failed("seed missing".to_string()));
    }

    #[tokio::test]
    async fn test_wait_times_out_while_initializing() {
        let readiness = Readiness::new();
        readiness.try_begin();
        let result = readiness.wait_ready(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(MedSafeError::StoreInitTimeout { waited_ms: 20 })));
    }

    #[tokio::test]
    async fn test_wait_sees_later_transition() {
        let readiness = Arc::new(Readiness::new());
        readiness.try_begin();

        let waiter = {
            let readiness = readiness.clone();
            tokio::spawn(async move { readiness.wait_ready(Duration::from_secs(5)).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        readiness.mark_ready();

        assert!(waiter.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_failed_returns_immediately() {
        let readiness = Readiness::new();
        readiness.mark_failed("connection refused");

        let started = std::time::Instant::now();
        let result = readiness.wait_ready(Duration::from_secs(5)).await;
        assert!(matches!(result, Err(MedSafeError::StoreInitFailed(_))));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_state_serializes_with_reason() {
        let value = serde_json::to_value(StoreState::Failed("boom".into())).unwrap();
        assert_eq!(value["state"], "failed");
        assert_eq!(value["reason"], "boom");
    }
}
