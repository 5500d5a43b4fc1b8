//! Canonical auth snapshot store.

use std::sync::Arc;

use tokio::sync::watch;

use tablesync_core::auth::{AuthSnapshot, IdToken, Identity, SessionError};
use tablesync_core::session::SessionRecord;

/// Race-free store for the canonical [`AuthSnapshot`].
///
/// All mutation flows through the controller's named operations below;
/// consumers read [`snapshot`](Self::snapshot) or observe changes through
/// [`watch`](Self::watch). Clones share the same underlying state.
#[derive(Debug, Clone)]
pub struct AuthStore {
    tx: Arc<watch::Sender<AuthSnapshot>>,
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthStore {
    /// Creates a store in the initial (loading, unauthenticated) state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthSnapshot::initial());
        Self { tx: Arc::new(tx) }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.tx.borrow().clone()
    }

    /// Observe snapshot changes.
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.tx.subscribe()
    }

    /// Compare-and-set mutation: `f` observes the current snapshot and
    /// either mutates it and returns `true`, or leaves it untouched and
    /// returns `false`. Applied atomically; observers are only notified on
    /// `true`. Returns what `f` returned.
    pub(crate) fn compare_and_set<F>(&self, f: F) -> bool
    where
        F: FnOnce(&mut AuthSnapshot) -> bool,
    {
        self.tx.send_if_modified(f)
    }

    /// Replace the current identity and token.
    ///
    /// A different uid drops the held session record along with the swap; a
    /// re-derived token for the same uid preserves it.
    pub(crate) fn set_identity_and_token(&self, identity: Identity, token: IdToken) {
        self.tx.send_modify(|s| {
            Self::apply_identity_and_token(s, identity, token);
        });
    }

    /// Snapshot edit behind [`set_identity_and_token`], exposed so gated
    /// commits inside [`compare_and_set`] apply the identical rules.
    pub(crate) fn apply_identity_and_token(
        snapshot: &mut AuthSnapshot,
        identity: Identity,
        token: IdToken,
    ) {
        let same_user = snapshot
            .identity
            .as_ref()
            .map(|current| current.uid == identity.uid)
            .unwrap_or(false);
        if !same_user {
            snapshot.session = None;
            snapshot.error = None;
        }
        snapshot.identity = Some(identity);
        snapshot.token = Some(token);
        snapshot.is_authenticated = true;
    }

    /// Store a freshly fetched session record and settle.
    pub(crate) fn set_session(&self, session: SessionRecord) {
        self.tx.send_modify(|s| {
            s.session = Some(session);
            s.error = None;
            s.loading = false;
        });
    }

    /// Record a session error and settle. Keeps identity, token, and any
    /// previously held session record.
    pub(crate) fn set_error(&self, error: SessionError) {
        self.tx.send_modify(|s| {
            s.error = Some(error);
            s.loading = false;
        });
    }

    /// The only operation that nulls identity, token, and session together.
    pub(crate) fn clear_all(&self) {
        self.tx.send_modify(Self::apply_clear);
    }

    /// Snapshot edit behind [`clear_all`]; in-flight credential operation
    /// flags survive the reset.
    pub(crate) fn apply_clear(snapshot: &mut AuthSnapshot) {
        let signing_in = snapshot.signing_in;
        let signing_out = snapshot.signing_out;
        *snapshot = AuthSnapshot::signed_out();
        snapshot.signing_in = signing_in;
        snapshot.signing_out = signing_out;
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.tx.send_modify(|s| s.loading = loading);
    }

    pub(crate) fn set_signing_in(&self, signing_in: bool) {
        self.tx.send_modify(|s| s.signing_in = signing_in);
    }

    pub(crate) fn set_signing_out(&self, signing_out: bool) {
        self.tx.send_modify(|s| s.signing_out = signing_out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablesync_core::auth::UserId;
    use tablesync_core::session::OnboardingStatus;

    fn identity(uid: &str) -> Identity {
        Identity {
            uid: UserId::new(uid),
            display_name: None,
            email: None,
        }
    }

    fn record() -> SessionRecord {
        SessionRecord {
            onboarding_status: OnboardingStatus::Completed,
            has_payment_method: false,
            resy: None,
        }
    }

    #[tokio::test]
    async fn new_store_starts_loading() {
        let store = AuthStore::new();
        let snapshot = store.snapshot();
        assert!(snapshot.loading);
        assert!(!snapshot.is_authenticated);
    }

    #[tokio::test]
    async fn set_identity_and_token_authenticates() {
        let store = AuthStore::new();
        store.set_identity_and_token(identity("u1"), IdToken::new("t1"));

        let snapshot = store.snapshot();
        assert!(snapshot.is_authenticated);
        assert_eq!(snapshot.identity.unwrap().uid.as_str(), "u1");
        assert_eq!(snapshot.token.unwrap().as_str(), "t1");
    }

    #[tokio::test]
    async fn different_uid_drops_session_with_the_swap() {
        let store = AuthStore::new();
        store.set_identity_and_token(identity("u1"), IdToken::new("t1"));
        store.set_session(record());

        store.set_identity_and_token(identity("u2"), IdToken::new("t2"));

        let snapshot = store.snapshot();
        assert_eq!(snapshot.identity.unwrap().uid.as_str(), "u2");
        assert!(snapshot.session.is_none());
    }

    #[tokio::test]
    async fn same_uid_keeps_held_session() {
        let store = AuthStore::new();
        store.set_identity_and_token(identity("u1"), IdToken::new("t1"));
        store.set_session(record());

        store.set_identity_and_token(identity("u1"), IdToken::new("t2"));

        let snapshot = store.snapshot();
        assert!(snapshot.session.is_some());
        assert_eq!(snapshot.token.unwrap().as_str(), "t2");
    }

    #[tokio::test]
    async fn set_error_keeps_identity_and_session() {
        let store = AuthStore::new();
        store.set_identity_and_token(identity("u1"), IdToken::new("t1"));
        store.set_session(record());

        store.set_error(SessionError::Transient("boom".to_string()));

        let snapshot = store.snapshot();
        assert!(snapshot.is_authenticated);
        assert!(snapshot.session.is_some());
        assert!(snapshot.error.is_some());
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn clear_all_nulls_identity_token_and_session_together() {
        let store = AuthStore::new();
        store.set_identity_and_token(identity("u1"), IdToken::new("t1"));
        store.set_session(record());

        store.clear_all();

        let snapshot = store.snapshot();
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.identity.is_none());
        assert!(snapshot.token.is_none());
        assert!(snapshot.session.is_none());
        assert!(!snapshot.loading);
    }

    #[tokio::test]
    async fn clear_all_preserves_credential_operation_flags() {
        let store = AuthStore::new();
        store.set_signing_out(true);

        store.clear_all();

        assert!(store.snapshot().signing_out);
    }

    #[tokio::test]
    async fn compare_and_set_skips_mutation_on_false() {
        let store = AuthStore::new();
        store.set_identity_and_token(identity("u1"), IdToken::new("t1"));

        let committed = store.compare_and_set(|s| {
            if s.identity.as_ref().map(|i| i.uid.as_str()) != Some("u2") {
                return false;
            }
            s.session = Some(record());
            true
        });

        assert!(!committed);
        assert!(store.snapshot().session.is_none());
    }

    #[tokio::test]
    async fn clones_share_state_and_watch_observes_changes() {
        let store = AuthStore::new();
        let clone = store.clone();
        let mut rx = clone.watch();

        store.set_identity_and_token(identity("u1"), IdToken::new("t1"));

        let snapshot = rx
            .wait_for(|s| s.is_authenticated)
            .await
            .expect("store alive");
        assert_eq!(snapshot.identity.as_ref().unwrap().uid.as_str(), "u1");
        assert!(clone.snapshot().is_authenticated);
    }
}
