//! Persisted session state for the authenticated request layer
//!
//! Owns the token record and everything needed to read it back: the
//! key-value backends, the `TokenStore` contract on top of them, and the
//! response envelope shared with the refresh endpoint.
//!
//! Record lifecycle:
//! 1. A login (out of band) or refresh produces a `TokenRecord`
//! 2. `TokenStore::write()` persists it under the `"token"` key
//! 3. Every outgoing request reads it back via `TokenStore::read()`
//! 4. `TokenStore::clear()` removes it on logout

pub mod constants;
pub mod envelope;
pub mod error;
pub mod file;
pub mod kv;
pub mod record;
pub mod store;

pub use constants::*;
pub use envelope::Envelope;
pub use error::{Error, Result};
pub use file::FileStore;
pub use kv::{KeyValueStore, MemoryStore};
pub use record::TokenRecord;
pub use store::TokenStore;
