use thiserror::Error;

/// Credential-operation failures.
///
/// Returned to the caller of a sign-in/sign-up operation for form-level
/// display; never stored in the auth snapshot.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("network error: {0}")]
    Network(String),

    #[error("identity provider error: {0}")]
    Provider(String),

    #[error("credential revoked, token unavailable")]
    TokenUnavailable,
}

/// Session-fetch failures.
///
/// The Unauthorized/Transient split decides whether the controller forces a
/// sign-out or leaves the user authenticated with a retry affordance.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session endpoint rejected the credential")]
    Unauthorized,

    #[error("transient session error: {0}")]
    Transient(String),
}
