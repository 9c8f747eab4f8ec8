//! Token record persistence on top of a key-value backend
//!
//! The store is the only owner of the token record. Other components read
//! and replace it through this type and never touch the backend directly.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::constants::TOKEN_KEY;
use crate::error::{Error, Result};
use crate::kv::KeyValueStore;
use crate::record::TokenRecord;

/// Reads, writes, and expires the persisted `TokenRecord`.
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn KeyValueStore>,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn KeyValueStore>) -> Self {
        Self { backend }
    }

    /// Read the persisted record.
    ///
    /// Absent, unreadable, and malformed values all come back as `None`.
    /// Failures are logged, never returned: a session that cannot be read is
    /// treated as no session.
    pub async fn read(&self) -> Option<TokenRecord> {
        let raw = match self.backend.get_item(TOKEN_KEY).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read token record, treating as absent");
                return None;
            }
        };

        match serde_json::from_str::<TokenRecord>(&raw) {
            Ok(record) if record.has_tokens() => Some(record),
            Ok(_) => {
                debug!("stored token record has empty tokens, treating as absent");
                None
            }
            Err(e) => {
                debug!(error = %e, "stored token record is malformed, treating as absent");
                None
            }
        }
    }

    /// Persist `record`, replacing the previous one.
    pub async fn write(&self, record: &TokenRecord) -> Result<()> {
        let raw = serde_json::to_string(record)
            .map_err(|e| Error::Serialize(format!("serializing token record: {e}")))?;
        self.backend.set_item(TOKEN_KEY, raw).await?;
        debug!(expire_at = record.expire_at, "token record written");
        Ok(())
    }

    /// Remove the persisted record.
    pub async fn clear(&self) -> Result<()> {
        self.backend.remove_item(TOKEN_KEY).await?;
        debug!("token record cleared");
        Ok(())
    }

    /// `expire_at < now`. A record without an expiry reads as expired.
    pub fn is_expired(&self, record: &TokenRecord) -> bool {
        record.is_expired_at(common::now_millis())
    }
}
