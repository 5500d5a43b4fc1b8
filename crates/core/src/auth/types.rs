use serde::{Deserialize, Serialize};

use crate::session::SessionRecord;

use super::SessionError;

/// Opaque user identifier issued by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Short-lived bearer token derived from the current identity.
///
/// Re-derived before every session fetch; its validity is only learned from
/// the session endpoint's response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdToken(String);

impl IdToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The authenticated user as reported by the identity provider.
///
/// Immutable once issued; a new sign-in replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: UserId,
    pub display_name: Option<String>,
    pub email: Option<String>,
}

/// One delivery on the identity provider's event stream: the live identity,
/// or `None` after a sign-out.
pub type AuthEvent = Option<Identity>;

/// The store's externally visible state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub is_authenticated: bool,
    pub identity: Option<Identity>,
    pub token: Option<IdToken>,
    pub session: Option<SessionRecord>,
    pub loading: bool,
    pub signing_in: bool,
    pub signing_out: bool,
    pub error: Option<SessionError>,
}

impl AuthSnapshot {
    /// State before the controller has reached its first terminal outcome.
    pub fn initial() -> Self {
        Self {
            loading: true,
            ..Self::signed_out()
        }
    }

    /// Settled unauthenticated state.
    pub fn signed_out() -> Self {
        Self {
            is_authenticated: false,
            identity: None,
            token: None,
            session: None,
            loading: false,
            signing_in: false,
            signing_out: false,
            error: None,
        }
    }
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_snapshot_is_loading_and_unauthenticated() {
        let snapshot = AuthSnapshot::initial();
        assert!(snapshot.loading);
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.identity.is_none());
        assert!(snapshot.token.is_none());
        assert!(snapshot.session.is_none());
        assert!(snapshot.error.is_none());
    }

    #[test]
    fn signed_out_snapshot_is_settled() {
        let snapshot = AuthSnapshot::signed_out();
        assert!(!snapshot.loading);
        assert!(!snapshot.is_authenticated);
        assert!(snapshot.identity.is_none());
        assert!(snapshot.session.is_none());
    }

    #[test]
    fn user_id_round_trips_through_display() {
        let uid = UserId::new("user-123");
        assert_eq!(uid.as_str(), "user-123");
        assert_eq!(uid.to_string(), "user-123");
    }
}
