//! Credential storage for the remote clients.

pub mod token_store;

pub use token_store::{KeychainTokenStore, MemoryTokenStore};
