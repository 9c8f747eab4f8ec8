//! Key-value persistence contract
//!
//! The token store only needs string get/set/remove under a fixed key. Any
//! backend that offers those three operations can hold the session.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tokio::sync::Mutex;

use crate::error::Result;

/// Boxed future returned by `KeyValueStore` methods.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// String key-value storage backing the token store.
///
/// Uses `Pin<Box<dyn Future>>` return types for dyn-compatibility
/// (`Arc<dyn KeyValueStore>`). A `get_item` issued after a completed
/// `set_item` on the same key must observe the new value.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`, or `None` if unset.
    fn get_item<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set_item<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()>;

    /// Remove `key`. Removing an absent key is not an error.
    fn remove_item<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

/// Process-local store. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<String>> {
        Box::pin(async move { Ok(self.items.lock().await.get(key).cloned()) })
    }

    fn set_item<'a>(&'a self, key: &'a str, value: String) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.items.lock().await.insert(key.to_string(), value);
            Ok(())
        })
    }

    fn remove_item<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.items.lock().await.remove(key);
            Ok(())
        })
    }
}
