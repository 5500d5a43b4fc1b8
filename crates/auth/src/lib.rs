//! Authentication and session synchronization for tablesync.
//!
//! This crate provides:
//! - The session synchronization controller that reconciles identity
//!   provider events with the backend session record
//! - A race-free auth snapshot store with watch-based observation
//! - REST identity provider and HTTP session fetcher implementations
//! - Mock collaborators for tests and local development (feature `mock`)

mod config;
mod controller;
mod error;
mod fetcher;
mod guard;
mod handle;
mod providers;
mod store;

pub use config::AuthConfig;
pub use controller::SessionController;
pub use error::ConfigError;
pub use fetcher::HttpSessionFetcher;
#[cfg(any(test, feature = "mock"))]
pub use fetcher::{MockFetch, MockSessionFetcher};
pub use guard::{SignOutGuard, SystemClock};
pub use handle::{AuthHandle, Gate};
#[cfg(any(test, feature = "mock"))]
pub use providers::MockIdentityProvider;
pub use providers::RestIdentityProvider;
pub use store::AuthStore;
