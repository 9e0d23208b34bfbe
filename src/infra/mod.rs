//! Infrastructure layer implementations.

pub mod indexer;
pub mod registry;

pub use indexer::HeliusIndexer;
pub use registry::RegistryManager;
