//! Privacy scoring for Solana wallets.
//!
//! The crate is layered:
//! - [`domain`]: core types, traits, and errors
//! - [`engine`]: the pure, deterministic scoring pipeline
//! - [`app`]: report service and shared application state
//! - [`infra`]: indexer clients and the known-entity registry
//! - [`api`]: axum handlers, router, and OpenAPI docs

pub mod api;
pub mod app;
pub mod domain;
pub mod engine;
pub mod infra;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
