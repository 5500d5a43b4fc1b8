//! REST identity provider adapter.
//!
//! Talks to the identity service's HTTP API and rebroadcasts auth changes
//! to subscribers. The long-lived refresh credential for the signed-in
//! identity is held here; short-lived tokens are re-derived per request via
//! `get_token`.

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::{broadcast, RwLock};
use url::Url;

use tablesync_core::auth::{
    AuthError, AuthEvent, IdToken, Identity, IdentityProvider, Result, UserId,
};

use crate::config::AuthConfig;
use crate::error::ConfigError;

const EVENT_CAPACITY: usize = 32;

/// Credential payload returned by sign-up and sign-in endpoints.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialResponse {
    uid: String,
    email: Option<String>,
    display_name: Option<String>,
    refresh_token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    id_token: String,
}

#[derive(Debug, Clone)]
struct SignedIn {
    identity: Identity,
    refresh_token: String,
}

/// Identity provider backed by the identity service's REST API.
pub struct RestIdentityProvider {
    http: reqwest::Client,
    base_url: Url,
    state: RwLock<Option<SignedIn>>,
    events: broadcast::Sender<AuthEvent>,
}

impl RestIdentityProvider {
    /// Create a provider from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> std::result::Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Ok(Self {
            http,
            base_url: config.identity_base_url.clone(),
            state: RwLock::new(None),
            events,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        self.base_url
            .join(path)
            .map_err(|e| AuthError::Provider(e.to_string()))
    }

    /// POST a credential request and install the returned identity as
    /// current, emitting the auth event while the state lock is held so
    /// subscribers cannot observe them out of order.
    async fn exchange_credentials(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<Identity> {
        let url = self.endpoint(path)?;
        let response = self
            .http
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST || status == reqwest::StatusCode::UNAUTHORIZED
        {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "identity service returned {status}"
            )));
        }

        let credential: CredentialResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;

        let identity = Identity {
            uid: UserId::new(credential.uid),
            display_name: credential.display_name,
            email: credential.email,
        };

        let mut state = self.state.write().await;
        *state = Some(SignedIn {
            identity: identity.clone(),
            refresh_token: credential.refresh_token,
        });
        let _ = self.events.send(Some(identity.clone()));
        drop(state);

        tracing::debug!(uid = %identity.uid, "identity service sign-in succeeded");
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn subscribe(&self) -> (AuthEvent, broadcast::Receiver<AuthEvent>) {
        let state = self.state.read().await;
        (
            state.as_ref().map(|s| s.identity.clone()),
            self.events.subscribe(),
        )
    }

    async fn get_token(&self, identity: &Identity) -> Result<IdToken> {
        let refresh_token = {
            let state = self.state.read().await;
            match state.as_ref() {
                Some(signed_in) if signed_in.identity.uid == identity.uid => {
                    signed_in.refresh_token.clone()
                }
                _ => return Err(AuthError::TokenUnavailable),
            }
        };

        let url = self.endpoint("token")?;
        let response = self
            .http
            .post(url)
            .json(&serde_json::json!({ "refreshToken": refresh_token }))
            .send()
            .await
            .map_err(|e| AuthError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::BAD_REQUEST
            || status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(AuthError::TokenUnavailable);
        }
        if !status.is_success() {
            return Err(AuthError::Provider(format!(
                "token endpoint returned {status}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::Provider(e.to_string()))?;
        Ok(IdToken::new(token.id_token))
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity> {
        self.exchange_credentials(
            "signup",
            serde_json::json!({
                "email": email,
                "password": password,
                "displayName": display_name,
            }),
        )
        .await
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        self.exchange_credentials(
            "signin",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_in_federated(&self, assertion: &str) -> Result<Identity> {
        self.exchange_credentials(
            "signin/federated",
            serde_json::json!({ "assertion": assertion }),
        )
        .await
    }

    async fn sign_out(&self) -> Result<()> {
        // Local state is cleared and the event emitted before the remote
        // revocation, so a network failure cannot strand the client in a
        // signed-in state.
        let refresh_token = {
            let mut state = self.state.write().await;
            let taken = state.take();
            let _ = self.events.send(None);
            taken.map(|s| s.refresh_token)
        };

        if let Some(refresh_token) = refresh_token {
            let url = self.endpoint("signout")?;
            if let Err(err) = self
                .http
                .post(url)
                .json(&serde_json::json!({ "refreshToken": refresh_token }))
                .send()
                .await
            {
                tracing::warn!(
                    error = %err,
                    "identity service sign-out failed, local state already cleared"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> RestIdentityProvider {
        RestIdentityProvider::new(&AuthConfig::default()).expect("provider builds")
    }

    #[tokio::test]
    async fn subscribe_starts_signed_out() {
        let provider = provider();
        let (current, _events) = provider.subscribe().await;
        assert!(current.is_none());
    }

    #[tokio::test]
    async fn get_token_without_signed_in_identity_is_unavailable() {
        let provider = provider();
        let identity = Identity {
            uid: UserId::new("u1"),
            display_name: None,
            email: None,
        };

        assert_eq!(
            provider.get_token(&identity).await,
            Err(AuthError::TokenUnavailable)
        );
    }

    #[tokio::test]
    async fn sign_out_without_identity_is_ok_and_emits_none() {
        let provider = provider();
        let (_, mut events) = provider.subscribe().await;

        provider.sign_out().await.unwrap();

        assert!(events.recv().await.unwrap().is_none());
    }

    #[test]
    fn endpoint_joins_relative_paths() {
        let provider = provider();
        let url = provider.endpoint("signin/federated").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9099/signin/federated");
    }
}
