//! Session synchronization controller.
//!
//! Reconciles the identity provider's event stream with the backend session
//! record and keeps the auth store consistent while provider callbacks,
//! in-flight fetches, and manual refreshes overlap.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use tablesync_core::auth::{
    validate_email, validate_password, AuthError, AuthEvent, Clock, IdToken, Identity,
    IdentityProvider, Result, SessionError, SessionFetcher,
};

use crate::config::AuthConfig;
use crate::guard::{SignOutGuard, SystemClock};
use crate::store::AuthStore;

/// Orchestrates identity events, token derivation, and session fetches.
///
/// One controller instance per process. The sign-out guard and the fetch
/// generation counter live here, not in the store, so they survive consumer
/// re-subscriptions.
///
/// Every provider event bumps the generation counter; token and session
/// commits re-check it (and the uid they were issued for) inside the store's
/// compare-and-set, so a result that resolves after its identity was
/// superseded is discarded instead of overwriting newer state.
pub struct SessionController {
    provider: Arc<dyn IdentityProvider>,
    fetcher: Arc<dyn SessionFetcher>,
    store: AuthStore,
    guard: SignOutGuard,
    clock: Arc<dyn Clock>,
    generation: AtomicU64,
}

impl SessionController {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        fetcher: Arc<dyn SessionFetcher>,
        config: &AuthConfig,
    ) -> Arc<Self> {
        Self::with_clock(provider, fetcher, config, Arc::new(SystemClock))
    }

    /// Construct with an injected clock for the sign-out guard.
    pub fn with_clock(
        provider: Arc<dyn IdentityProvider>,
        fetcher: Arc<dyn SessionFetcher>,
        config: &AuthConfig,
        clock: Arc<dyn Clock>,
    ) -> Arc<Self> {
        Arc::new(Self {
            provider,
            fetcher,
            store: AuthStore::new(),
            guard: SignOutGuard::new(config.signout_cooldown),
            clock,
            generation: AtomicU64::new(0),
        })
    }

    /// The store this controller mutates.
    pub fn store(&self) -> &AuthStore {
        &self.store
    }

    /// Subscribe to the provider and pump its events until the provider
    /// goes away.
    ///
    /// The event current at subscription time is dispatched before this
    /// returns; subsequent events are handled by the returned task.
    pub async fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let (initial, mut events) = self.provider.subscribe().await;
        self.handle_event(initial);

        let controller = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => controller.handle_event(event),
                    Err(RecvError::Lagged(missed)) => {
                        tracing::warn!(missed, "auth event stream lagged, resynchronizing");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    fn handle_event(self: &Arc<Self>, event: AuthEvent) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        match event {
            None => {
                tracing::debug!("provider reports signed out");
                self.store.clear_all();
            }
            Some(identity) => {
                tracing::debug!(uid = %identity.uid, "provider reports identity");
                self.store.set_loading(true);
                let controller = Arc::clone(self);
                tokio::spawn(async move {
                    controller.authenticate(generation, identity).await;
                });
            }
        }
    }

    /// Derive a token, commit identity and token, fetch the session record.
    /// Each commit is gated on the generation stamp.
    async fn authenticate(self: Arc<Self>, generation: u64, identity: Identity) {
        let token = match self.provider.get_token(&identity).await {
            Ok(token) => token,
            Err(err) => {
                // Credential already dead at the provider: local clear only,
                // no remote session to revoke, nothing for the guard to dedup.
                if self.clear_if_current(generation) {
                    tracing::warn!(
                        uid = %identity.uid,
                        error = %err,
                        "token derivation failed, clearing local auth state"
                    );
                }
                return;
            }
        };

        let committed = self.store.compare_and_set(|snapshot| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            AuthStore::apply_identity_and_token(snapshot, identity.clone(), token.clone());
            true
        });
        if !committed {
            tracing::debug!(uid = %identity.uid, "discarding token for a superseded identity");
            return;
        }

        self.run_fetch(generation, identity, token).await;
    }

    /// Re-fetch the session record for the current identity.
    ///
    /// No-op when signed out; does not touch `loading`. `Unauthorized` still
    /// routes through the sign-out guard.
    pub async fn refresh_session(&self) {
        let Some(identity) = self.store.snapshot().identity else {
            tracing::debug!("refresh_session with no identity, ignoring");
            return;
        };
        let generation = self.generation.load(Ordering::SeqCst);

        // The token is re-derived per outgoing fetch, never reused.
        let token = match self.provider.get_token(&identity).await {
            Ok(token) => token,
            Err(err) => {
                if self.clear_if_current(generation) {
                    tracing::warn!(
                        uid = %identity.uid,
                        error = %err,
                        "token derivation failed during refresh, clearing local auth state"
                    );
                }
                return;
            }
        };

        let committed = self.store.compare_and_set(|snapshot| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            if snapshot.identity.as_ref().map(|i| &i.uid) != Some(&identity.uid) {
                return false;
            }
            AuthStore::apply_identity_and_token(snapshot, identity.clone(), token.clone());
            true
        });
        if !committed {
            return;
        }

        self.run_fetch(generation, identity, token).await;
    }

    async fn run_fetch(&self, generation: u64, identity: Identity, token: IdToken) {
        let uid = identity.uid;
        match self.fetcher.fetch_session(&uid, &token).await {
            Ok(record) => {
                let committed = self.store.compare_and_set(|snapshot| {
                    if self.generation.load(Ordering::SeqCst) != generation {
                        return false;
                    }
                    if snapshot.identity.as_ref().map(|i| &i.uid) != Some(&uid) {
                        return false;
                    }
                    snapshot.session = Some(record);
                    snapshot.error = None;
                    snapshot.loading = false;
                    true
                });
                if !committed {
                    tracing::debug!(
                        uid = %uid,
                        "discarding session record fetched for a superseded identity"
                    );
                }
            }
            Err(SessionError::Unauthorized) => self.force_sign_out().await,
            Err(SessionError::Transient(reason)) => {
                tracing::warn!(uid = %uid, reason = %reason, "transient session fetch failure");
                self.store.compare_and_set(|snapshot| {
                    if self.generation.load(Ordering::SeqCst) != generation {
                        return false;
                    }
                    if snapshot.identity.as_ref().map(|i| &i.uid) != Some(&uid) {
                        return false;
                    }
                    // Identity, token, and any previously held record survive
                    snapshot.error = Some(SessionError::Transient(reason));
                    snapshot.loading = false;
                    true
                });
            }
        }
    }

    /// The guarded forced sign-out path for `Unauthorized` outcomes.
    async fn force_sign_out(&self) {
        let now = self.clock.now();
        if !self.guard.try_arm(now).await {
            tracing::debug!("unauthorized outcome suppressed by sign-out guard");
            // Suppressed outcomes still settle the loading flag
            self.store.compare_and_set(|snapshot| {
                if snapshot.loading {
                    snapshot.loading = false;
                    return true;
                }
                false
            });
            return;
        }

        tracing::warn!("session endpoint rejected the credential, forcing sign-out");
        self.store.clear_all();
        if let Err(err) = self.provider.sign_out().await {
            tracing::warn!(error = %err, "provider sign-out failed during forced sign-out");
        }
    }

    fn clear_if_current(&self, generation: u64) -> bool {
        self.store.compare_and_set(|snapshot| {
            if self.generation.load(Ordering::SeqCst) != generation {
                return false;
            }
            AuthStore::apply_clear(snapshot);
            true
        })
    }

    // ==================== Credential operations ====================
    //
    // Errors surface to the caller for form-level display; the snapshot only
    // tracks the in-flight flags.

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity> {
        let email = validate_email(email).ok_or(AuthError::InvalidCredentials)?;
        let password = validate_password(password).ok_or(AuthError::InvalidCredentials)?;

        self.store.set_signing_in(true);
        let result = self.provider.sign_up(email, password, display_name).await;
        self.store.set_signing_in(false);
        result
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let email = validate_email(email).ok_or(AuthError::InvalidCredentials)?;
        if password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        self.store.set_signing_in(true);
        let result = self.provider.sign_in_with_password(email, password).await;
        self.store.set_signing_in(false);
        result
    }

    pub async fn sign_in_federated(&self, assertion: &str) -> Result<Identity> {
        self.store.set_signing_in(true);
        let result = self.provider.sign_in_federated(assertion).await;
        self.store.set_signing_in(false);
        result
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.store.set_signing_out(true);
        let result = self.provider.sign_out().await;
        self.store.set_signing_out(false);
        result
    }
}
