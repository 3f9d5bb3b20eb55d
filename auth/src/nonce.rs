//! # Nonce Issuance
//!
//! One live nonce per (relying-party domain, holder address) pair, minted on
//! demand, gone after the TTL. The nonce is the anti-replay anchor of the
//! whole protocol: the client signs it inside the challenge, and the server
//! only accepts signatures over the nonce it currently holds.
//!
//! Two sharp edges, both inherited deliberately from the observed behavior
//! and both adjustable rather than hidden:
//!
//! - Issuance is check-then-act against the store. Two concurrent misses on
//!   the same key can both write; the store's last write wins, and the loser
//!   client's signature will fail verification. Accepted, not locked away.
//! - A successful verification does NOT consume the nonce. It stays valid
//!   for any number of verifications until the TTL expires. The TTL is the
//!   replay window — keep it short.

use rand::{rngs::OsRng, RngCore};
use std::time::Duration;

use crate::store::{NonceKv, StoreError};

/// Issues and looks up challenge nonces keyed by (domain, address).
///
/// Generic over the storage backend; see [`crate::store`] for the seam.
pub struct NonceStore<S: NonceKv> {
    kv: S,
    ttl: Duration,
}

impl<S: NonceKv> NonceStore<S> {
    /// Wrap a storage backend with the given nonce time-to-live.
    pub fn new(kv: S, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Storage key for a (domain, address) pair.
    ///
    /// Addresses are case-folded to lowercase first — `0xAbC…` and `0xabc…`
    /// are the same key. This matters because the directory reports
    /// checksummed (mixed-case) addresses while clients send whatever their
    /// wallet felt like that day.
    fn key(domain: &str, address: &str) -> String {
        format!("{}{}", domain, address.to_lowercase())
    }

    /// Return the live nonce for (domain, address), minting one if none
    /// exists.
    ///
    /// Idempotent inside the TTL window: a second call returns the stored
    /// value unchanged and does not touch its expiration. Writes to the
    /// store at most once per call, only on the miss path.
    ///
    /// A store failure propagates as an error — we never paper over a dead
    /// store by minting a fresh nonce, because that would turn an outage
    /// into a stream of signatures that can never verify.
    pub async fn issue_or_get(&self, domain: &str, address: &str) -> Result<String, StoreError> {
        let key = Self::key(domain, address);

        if let Some(existing) = self.kv.get(&key).await? {
            tracing::debug!(%key, "nonce hit, returning existing value");
            return Ok(existing);
        }

        // Check-then-act: a concurrent issuance may land between the get and
        // this put. Last write wins.
        let nonce = OsRng.next_u32().to_string();
        self.kv.put(&key, &nonce, self.ttl).await?;
        tracing::debug!(%key, ttl_secs = self.ttl.as_secs(), "nonce minted");
        Ok(nonce)
    }

    /// Read-only lookup of the current nonce, used during verification.
    /// `None` means no live nonce — never issued, or expired.
    pub async fn current(
        &self,
        domain: &str,
        address: &str,
    ) -> Result<Option<String>, StoreError> {
        self.kv.get(&Self::key(domain, address)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryKv;

    const DOMAIN: &str = "https://example.com";
    const ADDRESS: &str = "0xAbCdEf0123456789aBcDeF0123456789abcdef01";

    fn store(ttl: Duration) -> NonceStore<MemoryKv> {
        NonceStore::new(MemoryKv::new(), ttl)
    }

    // -- 1. Issued nonce is a decimal u32 -------------------------------------

    #[tokio::test]
    async fn nonce_is_a_decimal_u32() {
        let store = store(Duration::from_secs(60));
        let nonce = store.issue_or_get(DOMAIN, ADDRESS).await.unwrap();
        nonce.parse::<u32>().expect("nonce must parse as u32");
    }

    // -- 2. Issuance is idempotent inside the TTL ------------------------------

    #[tokio::test]
    async fn second_issue_returns_same_nonce() {
        let store = store(Duration::from_secs(60));
        let first = store.issue_or_get(DOMAIN, ADDRESS).await.unwrap();
        let second = store.issue_or_get(DOMAIN, ADDRESS).await.unwrap();
        assert_eq!(first, second);
    }

    // -- 3. Expiry mints a fresh nonce -----------------------------------------

    #[tokio::test]
    async fn expired_nonce_is_replaced() {
        let store = store(Duration::from_millis(10));
        let first = store.issue_or_get(DOMAIN, ADDRESS).await.unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;
        let second = store.issue_or_get(DOMAIN, ADDRESS).await.unwrap();
        // A u32 collision is possible but at 1-in-4-billion we'll risk the
        // flaky build.
        assert_ne!(first, second);
    }

    // -- 4. Address case does not split the key --------------------------------

    #[tokio::test]
    async fn address_case_is_insensitive() {
        let store = store(Duration::from_secs(60));
        let upper = store.issue_or_get(DOMAIN, ADDRESS).await.unwrap();
        let lower = store
            .issue_or_get(DOMAIN, &ADDRESS.to_lowercase())
            .await
            .unwrap();
        assert_eq!(upper, lower);
    }

    // -- 5. Different domains get different nonces ------------------------------

    #[tokio::test]
    async fn domains_are_independent() {
        let store = store(Duration::from_secs(60));
        let a = store.issue_or_get("https://a.example", ADDRESS).await.unwrap();
        let b = store.issue_or_get("https://b.example", ADDRESS).await.unwrap();
        // Distinct keys; equality would only happen on a u32 collision.
        assert_ne!(a, b);
    }

    // -- 6. current() sees what issue wrote and nothing else --------------------

    #[tokio::test]
    async fn current_reflects_issuance() {
        let store = store(Duration::from_secs(60));
        assert_eq!(store.current(DOMAIN, ADDRESS).await.unwrap(), None);
        let issued = store.issue_or_get(DOMAIN, ADDRESS).await.unwrap();
        assert_eq!(store.current(DOMAIN, ADDRESS).await.unwrap(), Some(issued));
    }
}
