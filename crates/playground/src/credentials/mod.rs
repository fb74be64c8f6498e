//! Session-scoped credential store.
//!
//! API keys, the selected key and the system prompt are kept per provider in
//! a string key-value [`SessionStorage`]. The store never surfaces storage
//! failures: reads degrade to empty values and writes are skipped.

mod error;
mod storage;
mod store;

pub use error::StorageError;
pub use storage::{MemoryStorage, SessionStorage, UnavailableStorage};
pub use store::{ApiKeyEntry, CredentialStore};
