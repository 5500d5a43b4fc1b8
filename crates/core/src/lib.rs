//! Functional core for tablesync.
//!
//! This crate provides:
//! - Auth domain types, trait seams, and the error taxonomy
//! - Pure derivation, classification, and validation functions
//! - The session endpoint wire format with a checked conversion
//!
//! No I/O lives here; the `tablesync_auth` crate supplies the provider,
//! fetcher, and controller implementations.

pub mod auth;
pub mod session;
