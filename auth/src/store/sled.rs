//! # SledKv — Persistent Nonce Storage
//!
//! TTL key-value backend on sled's embedded store, for deployments that
//! want issued nonces to survive a process restart.
//!
//! sled has no native expiration, so each value carries its own deadline:
//! the stored bytes are `bincode((nonce, expires_at_millis))`. An entry past
//! its deadline is treated as absent on read and deleted lazily at that
//! point — exactly the contract [`NonceKv`] promises, just enforced by us
//! instead of the engine.
//!
//! | Tree     | Key                          | Value                          |
//! |----------|------------------------------|--------------------------------|
//! | `nonces` | `domain + address` (UTF-8)   | `bincode((String, i64))`       |

use async_trait::async_trait;
use sled::{Db, Tree};
use std::path::Path;
use std::time::Duration;

use super::{NonceKv, StoreError};

/// Persistent [`NonceKv`] backend.
///
/// sled is inherently thread-safe; `SledKv` can be shared via `Arc` without
/// external synchronization.
#[derive(Debug, Clone)]
pub struct SledKv {
    #[allow(dead_code)]
    db: Db,
    nonces: Tree,
}

impl SledKv {
    /// Open or create a store at the given filesystem path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let db = sled::open(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::from_db(db)
    }

    /// Create a temporary store that lives in memory and is cleaned up on
    /// drop. Ideal for tests — no filesystem leftovers.
    pub fn open_temporary() -> Result<Self, StoreError> {
        let db = sled::Config::new()
            .temporary(true)
            .open()
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::from_db(db)
    }

    fn from_db(db: Db) -> Result<Self, StoreError> {
        let nonces = db
            .open_tree("nonces")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(Self { db, nonces })
    }

    fn now_millis() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

#[async_trait]
impl NonceKv for SledKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let raw = self
            .nonces
            .get(key.as_bytes())
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let Some(raw) = raw else {
            return Ok(None);
        };

        let (value, expires_at): (String, i64) =
            bincode::deserialize(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        if expires_at <= Self::now_millis() {
            // Lazy expiry. A failed delete is not worth failing the read over.
            let _ = self.nonces.remove(key.as_bytes());
            return Ok(None);
        }

        Ok(Some(value))
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let expires_at = Self::now_millis() + ttl.as_millis() as i64;
        let raw = bincode::serialize(&(value, expires_at))
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.nonces
            .insert(key.as_bytes(), raw)
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }
}
