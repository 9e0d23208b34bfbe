//! Shared test helpers and mock implementations.

pub mod mocks;

pub use mocks::{MockConfig, MockTransactionSource};
