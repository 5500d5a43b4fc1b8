use thiserror::Error;

/// Configuration and construction errors for the auth crate.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid URL in {var}: {message}")]
    InvalidUrl { var: &'static str, message: String },

    #[error("invalid duration in {var}: {value}")]
    InvalidDuration { var: &'static str, value: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),
}
