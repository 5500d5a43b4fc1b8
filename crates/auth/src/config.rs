use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

const DEFAULT_IDENTITY_URL: &str = "http://localhost:9099";
const DEFAULT_SESSION_URL: &str = "http://localhost:3000";
const DEFAULT_SIGNOUT_COOLDOWN_SECS: u64 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 15;

/// Complete auth configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Base URL of the identity service.
    pub identity_base_url: Url,
    /// Base URL of the backend that serves the session endpoint.
    pub session_base_url: Url,
    /// Window during which repeated unauthorized outcomes collapse into a
    /// single forced sign-out.
    pub signout_cooldown: Duration,
    /// Per-request timeout for identity and session HTTP calls.
    pub request_timeout: Duration,
}

impl AuthConfig {
    /// Load from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `TABLESYNC_IDENTITY_URL`: Identity service base URL
    ///   (default: `http://localhost:9099`)
    /// - `TABLESYNC_SESSION_URL`: Session backend base URL
    ///   (default: `http://localhost:3000`)
    /// - `TABLESYNC_SIGNOUT_COOLDOWN_SECS`: Sign-out guard cooldown in
    ///   seconds (default: 10)
    /// - `TABLESYNC_REQUEST_TIMEOUT_SECS`: HTTP request timeout in seconds
    ///   (default: 15)
    ///
    /// # Errors
    ///
    /// Returns an error if a set variable does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        let identity_base_url = parse_url_var("TABLESYNC_IDENTITY_URL", DEFAULT_IDENTITY_URL)?;
        let session_base_url = parse_url_var("TABLESYNC_SESSION_URL", DEFAULT_SESSION_URL)?;
        let signout_cooldown = parse_secs_var(
            "TABLESYNC_SIGNOUT_COOLDOWN_SECS",
            DEFAULT_SIGNOUT_COOLDOWN_SECS,
        )?;
        let request_timeout = parse_secs_var(
            "TABLESYNC_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        Ok(Self {
            identity_base_url,
            session_base_url,
            signout_cooldown,
            request_timeout,
        })
    }

    /// Override the sign-out guard cooldown.
    pub fn with_signout_cooldown(mut self, cooldown: Duration) -> Self {
        self.signout_cooldown = cooldown;
        self
    }

    /// Override the HTTP request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            identity_base_url: Url::parse(DEFAULT_IDENTITY_URL)
                .expect("default identity URL is valid"),
            session_base_url: Url::parse(DEFAULT_SESSION_URL).expect("default session URL is valid"),
            signout_cooldown: Duration::from_secs(DEFAULT_SIGNOUT_COOLDOWN_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

fn parse_url_var(var: &'static str, default: &str) -> Result<Url, ConfigError> {
    let raw = std::env::var(var).unwrap_or_else(|_| default.to_string());
    raw.parse().map_err(|e: url::ParseError| ConfigError::InvalidUrl {
        var,
        message: e.to_string(),
    })
}

fn parse_secs_var(var: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match std::env::var(var) {
        Ok(value) => value
            .parse::<u64>()
            .map(Duration::from_secs)
            .map_err(|_| ConfigError::InvalidDuration { var, value }),
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let config = AuthConfig::default();
        assert_eq!(config.identity_base_url.as_str(), "http://localhost:9099/");
        assert_eq!(config.signout_cooldown, Duration::from_secs(10));
        assert_eq!(config.request_timeout, Duration::from_secs(15));
    }

    #[test]
    fn builder_overrides_apply() {
        let config = AuthConfig::default()
            .with_signout_cooldown(Duration::from_secs(2))
            .with_request_timeout(Duration::from_secs(5));
        assert_eq!(config.signout_cooldown, Duration::from_secs(2));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
    }
}
