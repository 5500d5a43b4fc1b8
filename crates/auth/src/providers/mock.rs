//! Mock identity provider for tests and local development.
//!
//! Accounts live in memory, uids are derived from the email so tests can
//! predict them, and federated sign-in decodes a base64 JSON assertion the
//! way a development IdP would mint one.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use rand::{distr::Alphanumeric, Rng};
use tokio::sync::{broadcast, watch, RwLock};

use tablesync_core::auth::{
    AuthError, AuthEvent, IdToken, Identity, IdentityProvider, Result, UserId,
};

const EVENT_CAPACITY: usize = 32;

#[derive(Debug, Clone)]
struct MockAccount {
    password: String,
    identity: Identity,
}

/// In-memory identity provider double.
pub struct MockIdentityProvider {
    accounts: RwLock<HashMap<String, MockAccount>>,
    current: RwLock<AuthEvent>,
    revoked: RwLock<HashSet<UserId>>,
    events: broadcast::Sender<AuthEvent>,
    sign_out_calls: watch::Sender<usize>,
    token_calls: AtomicUsize,
}

impl Default for MockIdentityProvider {
    fn default() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            revoked: RwLock::new(HashSet::new()),
            events,
            sign_out_calls: watch::Sender::new(0),
            token_calls: AtomicUsize::new(0),
        }
    }
}

impl MockIdentityProvider {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Inject an auth event directly, as if the provider changed state on
    /// its own (another tab, credential expiry, ...).
    pub async fn emit(&self, event: AuthEvent) {
        let mut current = self.current.write().await;
        *current = event.clone();
        let _ = self.events.send(event);
    }

    /// Mark a uid's credential as revoked; `get_token` for it fails from
    /// now on.
    pub async fn revoke(&self, uid: &UserId) {
        let mut revoked = self.revoked.write().await;
        revoked.insert(uid.clone());
    }

    /// How many times `sign_out` has been invoked.
    pub fn sign_out_calls(&self) -> usize {
        *self.sign_out_calls.borrow()
    }

    /// Wait until `sign_out` has been invoked at least `calls` times.
    pub async fn wait_sign_out_calls(&self, calls: usize) {
        let mut rx = self.sign_out_calls.subscribe();
        rx.wait_for(|n| *n >= calls)
            .await
            .expect("provider dropped");
    }

    /// How many times `get_token` has been invoked.
    pub fn token_calls(&self) -> usize {
        self.token_calls.load(Ordering::SeqCst)
    }

    /// Wait until `get_token` has been invoked at least `calls` times.
    pub async fn wait_token_calls(&self, calls: usize) {
        while self.token_calls() < calls {
            tokio::task::yield_now().await;
        }
    }

    /// Build a federated assertion the way the development IdP would.
    pub fn encode_assertion(sub: &str, email: Option<&str>, name: Option<&str>) -> String {
        base64::engine::general_purpose::STANDARD.encode(
            serde_json::json!({
                "sub": sub,
                "email": email,
                "name": name,
            })
            .to_string(),
        )
    }

    fn mint_token() -> IdToken {
        let token: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(40)
            .map(char::from)
            .collect();
        IdToken::new(token)
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn subscribe(&self) -> (AuthEvent, broadcast::Receiver<AuthEvent>) {
        let current = self.current.read().await;
        (current.clone(), self.events.subscribe())
    }

    async fn get_token(&self, identity: &Identity) -> Result<IdToken> {
        self.token_calls.fetch_add(1, Ordering::SeqCst);
        let revoked = self.revoked.read().await;
        if revoked.contains(&identity.uid) {
            return Err(AuthError::TokenUnavailable);
        }
        Ok(Self::mint_token())
    }

    async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<Identity> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(email) {
            return Err(AuthError::Provider("account already exists".to_string()));
        }

        let identity = Identity {
            uid: UserId::new(format!("mock-{email}")),
            display_name: display_name.map(String::from),
            email: Some(email.to_string()),
        };
        accounts.insert(
            email.to_string(),
            MockAccount {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        drop(accounts);

        self.emit(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_in_with_password(&self, email: &str, password: &str) -> Result<Identity> {
        let identity = {
            let accounts = self.accounts.read().await;
            let account = accounts.get(email).ok_or(AuthError::InvalidCredentials)?;
            if account.password != password {
                return Err(AuthError::InvalidCredentials);
            }
            account.identity.clone()
        };

        self.emit(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_in_federated(&self, assertion: &str) -> Result<Identity> {
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(assertion)
            .map_err(|e| AuthError::Provider(format!("invalid federated assertion: {e}")))?;
        let json: serde_json::Value = serde_json::from_slice(&decoded)
            .map_err(|e| AuthError::Provider(format!("invalid federated assertion: {e}")))?;

        let sub = json["sub"]
            .as_str()
            .ok_or_else(|| AuthError::Provider("assertion missing subject".to_string()))?;

        let identity = Identity {
            uid: UserId::new(sub),
            display_name: json["name"].as_str().map(String::from),
            email: json["email"].as_str().map(String::from),
        };

        self.emit(Some(identity.clone())).await;
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<()> {
        self.sign_out_calls.send_modify(|n| *n += 1);
        self.emit(None).await;
        Ok(())
    }
}
