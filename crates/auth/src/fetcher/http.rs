//! HTTP session fetcher for the backend session endpoint.

use async_trait::async_trait;
use url::Url;

use tablesync_core::auth::{
    classify_session_status, IdToken, SessionError, SessionFetcher, SessionResult, UserId,
};
use tablesync_core::session::{MeResponse, SessionRecord};

use crate::config::AuthConfig;
use crate::error::ConfigError;

/// Fetches session records from `GET {base}/me?uid=<uid>`.
///
/// 401 is the only terminal failure; network errors, other statuses, and
/// malformed bodies all classify as transient.
#[derive(Debug, Clone)]
pub struct HttpSessionFetcher {
    http: reqwest::Client,
    base_url: Url,
}

impl HttpSessionFetcher {
    /// Create a fetcher from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &AuthConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.session_base_url.clone(),
        })
    }
}

#[async_trait]
impl SessionFetcher for HttpSessionFetcher {
    async fn fetch_session(&self, uid: &UserId, token: &IdToken) -> SessionResult<SessionRecord> {
        let mut url = self
            .base_url
            .join("me")
            .map_err(|e| SessionError::Transient(e.to_string()))?;
        url.query_pairs_mut().append_pair("uid", uid.as_str());

        let response = self
            .http
            .get(url)
            .bearer_auth(token.as_str())
            .send()
            .await
            .map_err(|e| SessionError::Transient(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_session_status(status.as_u16()));
        }

        let body: MeResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Transient(format!("malformed session body: {e}")))?;

        SessionRecord::try_from(body).map_err(|e| SessionError::Transient(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_default_config() {
        let fetcher = HttpSessionFetcher::new(&AuthConfig::default());
        assert!(fetcher.is_ok());
    }
}
