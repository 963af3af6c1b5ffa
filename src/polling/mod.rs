// ABOUTME: Keyed polling sessions that re-fetch a resource until a predicate settles
// ABOUTME: Each session stops on success, failure, cancellation or after a bounded tick count

//! # Polling supervisor
//!
//! [`PollSupervisor::start_polling`] spawns one task per key. Every tick the
//! task fetches, hands the result to a predicate and either stops or sleeps
//! for the configured interval. Ticks are counted rather than timed, so the
//! timeout is `max_ticks` fetches plus their sleeps.
//!
//! ```text
//! Idle --start--> Active --Success--> Succeeded
//!                        --Failure--> Failed
//!                        --stop-----> Cancelled
//!                        --tick > max_ticks--> TimedOut (one timeout notification)
//! ```
//!
//! Only one session may be active per key; a second start is rejected with
//! [`MigratorError::AlreadyPolling`]. Cancellation is cooperative: it is seen
//! before a fetch, right after a fetch and during the sleep, but a fetch that
//! is already in flight runs to completion.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::error::MigratorError;
use crate::notify::{AlertSink, Notification};

/// Verdict of a predicate over one fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollStatus {
    Success,
    Failure,
    Continue,
}

/// Terminal state of a polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Succeeded,
    Failed,
    Cancelled,
    /// Ran out of ticks. Consumers treat this as "finished with an empty result".
    TimedOut,
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_ticks: u32,
    pub timeout_message: String,
}

impl PollConfig {
    pub fn new(interval: Duration, max_ticks: u32, timeout_message: impl Into<String>) -> Self {
        Self {
            interval,
            max_ticks,
            timeout_message: timeout_message.into(),
        }
    }
}

struct Session {
    id: u64,
    token: CancellationToken,
}

type SessionMap = Arc<Mutex<HashMap<String, Session>>>;

/// Removes the session entry when its task ends, however it ends.
struct SessionGuard {
    sessions: SessionMap,
    key: String,
    id: u64,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let mut sessions = self.sessions.lock();
        if sessions.get(&self.key).is_some_and(|s| s.id == self.id) {
            sessions.remove(&self.key);
        }
    }
}

/// Handle to one running session.
#[derive(Debug)]
pub struct PollHandle {
    key: String,
    token: CancellationToken,
    task: JoinHandle<PollOutcome>,
}

impl PollHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the terminal outcome.
    pub async fn wait(self) -> PollOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => PollOutcome::Cancelled,
            Err(e) => {
                error!(key = %self.key, error = %e, "Polling task panicked");
                PollOutcome::Failed
            }
        }
    }
}

#[derive(Clone)]
pub struct PollSupervisor {
    sessions: SessionMap,
    next_id: Arc<AtomicU64>,
    alerts: Arc<dyn AlertSink>,
}

impl PollSupervisor {
    pub fn new(alerts: Arc<dyn AlertSink>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            alerts,
        }
    }

    /// Start a polling session under `key`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start_polling<T, F, Fut, P>(
        &self,
        key: impl Into<String>,
        mut fetch: F,
        predicate: P,
        config: PollConfig,
    ) -> Result<PollHandle, MigratorError>
    where
        T: Send + 'static,
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<T>> + Send + 'static,
        P: Fn(&T) -> PollStatus + Send + Sync + 'static,
    {
        let key = key.into();
        let token = CancellationToken::new();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        {
            let mut sessions = self.sessions.lock();
            if sessions.contains_key(&key) {
                warn!(key = %key, "Rejected second polling session for active key");
                return Err(MigratorError::AlreadyPolling(key));
            }
            sessions.insert(
                key.clone(),
                Session {
                    id,
                    token: token.clone(),
                },
            );
        }

        let guard = SessionGuard {
            sessions: self.sessions.clone(),
            key: key.clone(),
            id,
        };
        let alerts = self.alerts.clone();
        let task_token = token.clone();
        let task_key = key.clone();

        info!(
            key = %key,
            interval_ms = config.interval.as_millis(),
            max_ticks = config.max_ticks,
            "Polling session started"
        );

        let task = tokio::spawn(async move {
            let _guard = guard;
            let outcome = run_session(
                &task_key,
                &mut fetch,
                &predicate,
                &config,
                &task_token,
                alerts.as_ref(),
            )
            .await;
            info!(key = %task_key, outcome = ?outcome, "Polling session ended");
            outcome
        });

        Ok(PollHandle { key, token, task })
    }

    /// Signal the session under `key` to stop. Returns false if none is active.
    pub fn stop(&self, key: &str) -> bool {
        match self.sessions.lock().get(key) {
            Some(session) => {
                debug!(key = %key, "Stop requested for polling session");
                session.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, key: &str) -> bool {
        self.sessions.lock().contains_key(key)
    }

    pub fn active_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.sessions.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn stop_all(&self) {
        for session in self.sessions.lock().values() {
            session.token.cancel();
        }
    }
}

async fn run_session<T, F, Fut, P>(
    key: &str,
    fetch: &mut F,
    predicate: &P,
    config: &PollConfig,
    token: &CancellationToken,
    alerts: &dyn AlertSink,
) -> PollOutcome
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
    P: Fn(&T) -> PollStatus,
{
    let mut tick_count = 0u32;

    loop {
        if token.is_cancelled() {
            return PollOutcome::Cancelled;
        }

        tick_count += 1;
        if tick_count > config.max_ticks {
            warn!(key = %key, ticks = config.max_ticks, "Polling session timed out");
            alerts.alert(Notification::Timeout(config.timeout_message.clone()));
            return PollOutcome::TimedOut;
        }

        debug!(key = %key, tick = tick_count, "Polling tick");
        match fetch().await {
            Ok(result) => {
                if token.is_cancelled() {
                    return PollOutcome::Cancelled;
                }
                match predicate(&result) {
                    PollStatus::Success => return PollOutcome::Succeeded,
                    PollStatus::Failure => return PollOutcome::Failed,
                    PollStatus::Continue => {}
                }
            }
            Err(e) => {
                warn!(key = %key, tick = tick_count, error = %e, "Poll fetch failed, will retry");
            }
        }

        tokio::select! {
            biased;
            _ = token.cancelled() => return PollOutcome::Cancelled,
            _ = tokio::time::sleep(config.interval) => {}
        }
    }
}
