//! Consumer-facing surface over the store and controller.

use std::sync::Arc;

use tokio::sync::watch;

use tablesync_core::auth::{
    combined_loading, is_onboarded, AuthSnapshot, Identity, Result,
};

use crate::controller::SessionController;

/// Cheap-to-clone handle that consumers (forms, route guards, refresh
/// triggers) use to read auth state and invoke controller actions. Never
/// mutates the store directly.
#[derive(Clone)]
pub struct AuthHandle {
    controller: Arc<SessionController>,
}

impl AuthHandle {
    pub fn new(controller: Arc<SessionController>) -> Self {
        Self { controller }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> AuthSnapshot {
        self.controller.store().snapshot()
    }

    /// Observe snapshot changes.
    pub fn watch(&self) -> watch::Receiver<AuthSnapshot> {
        self.controller.store().watch()
    }

    /// Whether any auth-related work is in flight.
    pub fn combined_loading(&self) -> bool {
        combined_loading(&self.snapshot())
    }

    /// Whether the authenticated user has completed onboarding.
    pub fn is_onboarded(&self) -> bool {
        is_onboarded(&self.snapshot())
    }

    /// Routing decision for the current snapshot.
    pub fn gate(&self) -> Gate {
        Gate::evaluate(&self.snapshot())
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity> {
        self.controller.sign_up(email, password, display_name).await
    }

    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        self.controller.sign_in_with_password(email, password).await
    }

    pub async fn sign_in_federated(&self, assertion: &str) -> Result<Identity> {
        self.controller.sign_in_federated(assertion).await
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.controller.sign_out().await
    }

    pub async fn refresh_session(&self) {
        self.controller.refresh_session().await;
    }
}

/// Routing decision derived from an auth snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// Still settling; render a loading state, do not redirect yet.
    Loading,
    /// Signed out; send to the sign-in view.
    SignIn,
    /// Signed in but the session record is missing after a transient
    /// failure; offer a retry, never a logout.
    Retry,
    /// Signed in but onboarding is incomplete; send to onboarding.
    Onboarding,
    /// Fully signed in and onboarded.
    Allow,
}

impl Gate {
    pub fn evaluate(snapshot: &AuthSnapshot) -> Self {
        if combined_loading(snapshot) {
            return Self::Loading;
        }
        if !snapshot.is_authenticated {
            return Self::SignIn;
        }
        if snapshot.session.is_none() && snapshot.error.is_some() {
            return Self::Retry;
        }
        if !is_onboarded(snapshot) {
            return Self::Onboarding;
        }
        Self::Allow
    }
}
