//! Session fetcher implementations.
//!
//! This module contains implementations of `SessionFetcher` for:
//! - The backend session endpoint over HTTP
//! - A scriptable double for tests

mod http;
#[cfg(any(test, feature = "mock"))]
mod mock;

pub use http::HttpSessionFetcher;
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockFetch, MockSessionFetcher};
