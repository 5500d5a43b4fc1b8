use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use super::{AuthError, AuthEvent, IdToken, Identity, SessionError, UserId};
use crate::session::SessionRecord;

/// Result type for credential operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// Result type for session fetches.
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Abstraction over the external identity provider.
///
/// Sign-in and sign-out success is delivered to subscribers through the
/// event stream asynchronously; callers must not assume the event has
/// landed by the time the credential operation returns.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Current auth state plus a stream of subsequent changes.
    ///
    /// The returned event reflects the state at subscription time, so a
    /// subscriber never misses a sign-in or sign-out that happened before
    /// it attached.
    async fn subscribe(&self) -> (AuthEvent, broadcast::Receiver<AuthEvent>);

    /// Derive a short-lived bearer token for the identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::TokenUnavailable`] if the identity's credential
    /// has been revoked.
    async fn get_token(&self, identity: &Identity) -> Result<IdToken>;

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity>;

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity>;

    /// Exchange a federated provider assertion for an identity.
    async fn sign_in_federated(&self, assertion: &str) -> Result<Identity>;

    async fn sign_out(&self) -> Result<()>;
}

/// Session endpoint abstraction.
#[async_trait]
pub trait SessionFetcher: Send + Sync {
    /// Fetch the backend session record for `uid`, presenting `token`.
    ///
    /// # Errors
    ///
    /// [`SessionError::Unauthorized`] means the backend rejected the
    /// credential; [`SessionError::Transient`] covers everything
    /// recoverable.
    async fn fetch_session(&self, uid: &UserId, token: &IdToken) -> SessionResult<SessionRecord>;
}

/// Time source for the sign-out guard, injectable for tests.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}
