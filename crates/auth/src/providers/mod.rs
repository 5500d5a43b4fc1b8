//! Identity provider implementations.
//!
//! This module contains implementations of `IdentityProvider` for:
//! - The identity service's REST API
//! - A mock provider for tests and local development

#[cfg(any(test, feature = "mock"))]
mod mock;
mod rest;

#[cfg(any(test, feature = "mock"))]
pub use mock::MockIdentityProvider;
pub use rest::RestIdentityProvider;
