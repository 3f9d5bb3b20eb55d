//! In-process TTL map. The nonce store equivalent of a kitchen whiteboard:
//! fast, shared by everyone in the process, gone on restart.
//!
//! Expiry is lazy — an expired entry is dropped the next time someone reads
//! or overwrites it. Nothing sweeps the map in the background, which is fine
//! at the scale of "nonces a login service hands out in sixty seconds".

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{NonceKv, StoreError};

/// A single stored value plus its expiration deadline.
#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

/// In-memory [`NonceKv`] backend.
///
/// Cheap to create, no filesystem side effects — the default for tests and
/// local development.
#[derive(Debug, Default)]
pub struct MemoryKv {
    entries: RwLock<HashMap<String, Entry>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries. Test helper.
    pub fn live_len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .values()
            .filter(|e| e.expires_at > now)
            .count()
    }
}

#[async_trait]
impl NonceKv for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        // Fast path: read lock, check liveness.
        {
            let entries = self.entries.read();
            match entries.get(key) {
                Some(e) if e.expires_at > Instant::now() => return Ok(Some(e.value.clone())),
                None => return Ok(None),
                Some(_) => {} // expired, fall through to remove
            }
        }

        // Expired entry: take the write lock and drop it. Re-check under the
        // lock in case a concurrent put refreshed the key in between.
        let mut entries = self.entries.write();
        if let Some(e) = entries.get(key) {
            if e.expires_at > Instant::now() {
                return Ok(Some(e.value.clone()));
            }
            entries.remove(key);
        }
        Ok(None)
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        let entry = Entry {
            value: value.to_string(),
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- 1. Round trip within TTL --------------------------------------------

    #[tokio::test]
    async fn get_returns_live_value() {
        let kv = MemoryKv::new();
        kv.put("k", "123", Duration::from_secs(60)).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some("123".to_string()));
    }

    // -- 2. Missing key is None, not an error --------------------------------

    #[tokio::test]
    async fn get_missing_key_is_none() {
        let kv = MemoryKv::new();
        assert_eq!(kv.get("nope").await.unwrap(), None);
    }

    // -- 3. Expired entry reads as absent ------------------------------------

    #[tokio::test]
    async fn expired_entry_reads_as_absent() {
        let kv = MemoryKv::new();
        kv.put("k", "123", Duration::from_millis(10)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(kv.get("k").await.unwrap(), None);
        assert_eq!(kv.live_len(), 0);
    }

    // -- 4. Put overwrites and resets the clock ------------------------------

    #[tokio::test]
    async fn put_overwrites_existing_entry() {
        let kv = MemoryKv::new();
        kv.put("k", "old", Duration::from_secs(60)).await.unwrap();
        kv.put("k", "new", Duration::from_secs(60)).await.unwrap();
        assert_eq!(kv.get("k").await.unwrap(), Some("new".to_string()));
    }
}
