//! Transaction indexer clients.

pub mod helius;

pub use helius::{DEFAULT_HELIUS_API_URL, HeliusIndexer};
