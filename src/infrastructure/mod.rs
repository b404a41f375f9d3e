//! Adapters for the external platform: document store, credential
//! provider and the crypto they rely on.

pub mod crypto;
pub mod identity;
pub mod storage;

pub use identity::LocalCredentialProvider;
pub use storage::InMemoryDocumentStore;
