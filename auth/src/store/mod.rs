//! # Nonce Storage Seam
//!
//! The nonce store is the only stateful collaborator in the whole protocol,
//! and it is injected, not ambient. Everything the core needs from it fits
//! in two operations: `get` and `put`-with-expiration. Expiry is the
//! *store's* job — the protocol never deletes a nonce explicitly, it just
//! stops being there after the TTL.
//!
//! Two backends ship with the crate:
//!
//! - [`memory::MemoryKv`] — an in-process map. Development and tests.
//! - [`sled::SledKv`] — persistent, survives restarts. Single-node
//!   deployments.
//!
//! Anything with get/put-with-TTL semantics (Redis, a cloud KV) slots in by
//! implementing [`NonceKv`].

pub mod memory;
pub mod sled;

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors from the backing key-value store.
///
/// A `StoreError` always means infrastructure trouble. "Key not present" is
/// not an error — it is the `Ok(None)` case of [`NonceKv::get`].
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("stored value is corrupt: {0}")]
    Corrupt(String),
}

/// A key-value store with per-entry expiration.
///
/// Both operations are assumed individually atomic, but nothing coordinates
/// a `get` followed by a `put` — callers that check-then-act (looking at
/// you, [`crate::nonce::NonceStore`]) accept the resulting race.
#[async_trait]
pub trait NonceKv: Send + Sync {
    /// Fetch the live value for `key`, or `None` if the key was never
    /// written or its entry has expired.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write `value` under `key`, expiring `ttl` from now. Overwrites any
    /// existing entry and resets its clock.
    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError>;
}

/// A shared handle to a store is itself a store.
#[async_trait]
impl<T: NonceKv + ?Sized> NonceKv for std::sync::Arc<T> {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key).await
    }

    async fn put(&self, key: &str, value: &str, ttl: Duration) -> Result<(), StoreError> {
        (**self).put(key, value, ttl).await
    }
}
