//! Scriptable session fetcher for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{watch, Mutex, Notify};

use tablesync_core::auth::{IdToken, SessionError, SessionFetcher, SessionResult, UserId};
use tablesync_core::session::SessionRecord;

/// One scripted fetch outcome, consumed in FIFO order per uid.
pub enum MockFetch {
    Ok(SessionRecord),
    Unauthorized,
    Transient(String),
    /// Block until the notify fires, then resolve successfully.
    GatedOk(Arc<Notify>, SessionRecord),
    /// Block until the notify fires, then resolve unauthorized.
    GatedUnauthorized(Arc<Notify>),
}

/// Session fetcher double with per-uid scripts and progress counters, so
/// tests can interleave resolutions deterministically.
pub struct MockSessionFetcher {
    scripts: Mutex<HashMap<String, VecDeque<MockFetch>>>,
    started: watch::Sender<usize>,
    finished: watch::Sender<usize>,
}

impl Default for MockSessionFetcher {
    fn default() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            started: watch::Sender::new(0),
            finished: watch::Sender::new(0),
        }
    }
}

impl MockSessionFetcher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the next outcome for `uid`.
    pub async fn script(&self, uid: &str, outcome: MockFetch) {
        let mut scripts = self.scripts.lock().await;
        scripts.entry(uid.to_string()).or_default().push_back(outcome);
    }

    /// Fetches entered so far.
    pub fn started(&self) -> usize {
        *self.started.borrow()
    }

    /// Fetches resolved so far.
    pub fn finished(&self) -> usize {
        *self.finished.borrow()
    }

    /// Wait until at least `count` fetches have entered.
    pub async fn wait_started(&self, count: usize) {
        let mut rx = self.started.subscribe();
        rx.wait_for(|n| *n >= count).await.expect("fetcher dropped");
    }

    /// Wait until at least `count` fetches have resolved.
    pub async fn wait_finished(&self, count: usize) {
        let mut rx = self.finished.subscribe();
        rx.wait_for(|n| *n >= count).await.expect("fetcher dropped");
    }
}

#[async_trait]
impl SessionFetcher for MockSessionFetcher {
    async fn fetch_session(&self, uid: &UserId, _token: &IdToken) -> SessionResult<SessionRecord> {
        self.started.send_modify(|n| *n += 1);

        let outcome = {
            let mut scripts = self.scripts.lock().await;
            scripts.get_mut(uid.as_str()).and_then(VecDeque::pop_front)
        };

        let result = match outcome {
            Some(MockFetch::Ok(record)) => Ok(record),
            Some(MockFetch::Unauthorized) => Err(SessionError::Unauthorized),
            Some(MockFetch::Transient(reason)) => Err(SessionError::Transient(reason)),
            Some(MockFetch::GatedOk(gate, record)) => {
                gate.notified().await;
                Ok(record)
            }
            Some(MockFetch::GatedUnauthorized(gate)) => {
                gate.notified().await;
                Err(SessionError::Unauthorized)
            }
            None => Err(SessionError::Transient(format!(
                "no scripted outcome for {uid}"
            ))),
        };

        self.finished.send_modify(|n| *n += 1);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablesync_core::session::OnboardingStatus;

    fn record() -> SessionRecord {
        SessionRecord {
            onboarding_status: OnboardingStatus::Completed,
            has_payment_method: false,
            resy: None,
        }
    }

    #[tokio::test]
    async fn scripts_resolve_in_fifo_order_per_uid() {
        let fetcher = MockSessionFetcher::new();
        fetcher.script("u1", MockFetch::Ok(record())).await;
        fetcher.script("u1", MockFetch::Unauthorized).await;

        let uid = UserId::new("u1");
        let token = IdToken::new("t");

        assert!(fetcher.fetch_session(&uid, &token).await.is_ok());
        assert_eq!(
            fetcher.fetch_session(&uid, &token).await,
            Err(SessionError::Unauthorized)
        );
        assert_eq!(fetcher.started(), 2);
        assert_eq!(fetcher.finished(), 2);
    }

    #[tokio::test]
    async fn unscripted_uid_resolves_transient() {
        let fetcher = MockSessionFetcher::new();

        let result = fetcher
            .fetch_session(&UserId::new("unknown"), &IdToken::new("t"))
            .await;
        assert!(matches!(result, Err(SessionError::Transient(_))));
    }

    #[tokio::test]
    async fn gated_outcome_waits_for_release() {
        let fetcher = MockSessionFetcher::new();
        let gate = Arc::new(Notify::new());
        fetcher
            .script("u1", MockFetch::GatedOk(Arc::clone(&gate), record()))
            .await;

        let task = {
            let fetcher = Arc::clone(&fetcher);
            tokio::spawn(async move {
                fetcher
                    .fetch_session(&UserId::new("u1"), &IdToken::new("t"))
                    .await
            })
        };

        fetcher.wait_started(1).await;
        assert_eq!(fetcher.finished(), 0);

        gate.notify_one();
        fetcher.wait_finished(1).await;
        assert!(task.await.unwrap().is_ok());
    }
}
