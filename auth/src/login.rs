//! # The Composed Login Flow
//!
//! Stitches the four pieces together. One verification request moves through
//! a strict, retry-free pipeline:
//!
//! ```text
//! resolve name ──► fetch current nonce ──► render challenge ──► verify
//!      │
//!      └─ no record ──► UnknownName (early exit)
//! ```
//!
//! Every step runs exactly once. There is no backoff, no timeout at this
//! layer, no cancellation — a hung directory call blocks the request until
//! the transport gives up. Statelessness is the trade: everything shared
//! lives in the injected store.

use std::time::Duration;

use crate::directory::Directory;
use crate::error::AuthError;
use crate::nonce::NonceStore;
use crate::store::NonceKv;
use crate::{challenge, verify};

/// Result of a verification request, seen from the HTTP layer.
///
/// `UnknownName` is its own arm rather than an error: the directory
/// *answered*, it just had nothing to say. Infrastructure failures never
/// appear here — they come back as [`AuthError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Signature recovers to the name's holder. Let them in.
    Valid,
    /// Anything from wrong key to garbled hex. Deliberately undistinguished.
    Invalid,
    /// The directory has no record under the claimed name.
    UnknownName,
}

/// The sign-in service: nonce issuance plus end-to-end verification.
///
/// Generic over both collaborators so tests run against [`crate::MemoryKv`]
/// and [`crate::StaticDirectory`] while production wires up sled and the
/// GraphQL indexer.
pub struct LoginService<S: NonceKv, D: Directory> {
    nonces: NonceStore<S>,
    directory: D,
}

impl<S: NonceKv, D: Directory> LoginService<S, D> {
    pub fn new(kv: S, directory: D, nonce_ttl: Duration) -> Self {
        Self {
            nonces: NonceStore::new(kv, nonce_ttl),
            directory,
        }
    }

    /// Issue (or return the still-live) nonce for a (domain, address) pair.
    ///
    /// Store failures propagate — see [`NonceStore::issue_or_get`].
    pub async fn issue_nonce(&self, domain: &str, address: &str) -> Result<String, AuthError> {
        Ok(self.nonces.issue_or_get(domain, address).await?)
    }

    /// Run the full verification pipeline for (name, domain, signature).
    ///
    /// A missing nonce (expired, or never issued) renders into the challenge
    /// as the empty string rather than failing outright — the signature then
    /// simply will not match unless the client also signed an empty nonce,
    /// which preserves the never-issued state as an ordinary `Invalid`.
    pub async fn verify(
        &self,
        name: &str,
        domain: &str,
        signature: &str,
    ) -> Result<VerifyOutcome, AuthError> {
        // Resolved fresh on every request; the directory's answer is ground
        // truth for exactly this one verification.
        let Some(holder) = self.directory.resolve(name).await? else {
            tracing::info!(%name, "verification rejected: name has no holder");
            return Ok(VerifyOutcome::UnknownName);
        };

        let nonce = self
            .nonces
            .current(domain, &holder)
            .await?
            .unwrap_or_default();

        let message = challenge::render(domain, name, &nonce);

        let valid = verify::verify(&holder, &message, signature);
        tracing::info!(%name, %domain, valid, "verification completed");
        Ok(if valid {
            VerifyOutcome::Valid
        } else {
            VerifyOutcome::Invalid
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::StaticDirectory;
    use crate::store::memory::MemoryKv;
    use crate::verify::{address_of, eip191_wrap, keccak256};
    use k256::ecdsa::SigningKey;

    const DOMAIN: &str = "https://example.com";
    const NAME: &str = "alice.wrap";

    fn personal_sign(key: &SigningKey, message: &str) -> String {
        let digest = keccak256(eip191_wrap(message).as_bytes());
        let (sig, recid) = key.sign_prehash_recoverable(&digest).unwrap();
        let mut bytes = sig.to_bytes().to_vec();
        bytes.push(27 + recid.to_byte());
        format!("0x{}", hex::encode(bytes))
    }

    /// (service, signing key) with `alice.wrap` registered to the key's
    /// CHECKSUM-CASED address, to exercise the case-folding path.
    fn service_with_alice() -> (LoginService<MemoryKv, StaticDirectory>, SigningKey) {
        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let checksummed = address_of(key.verifying_key())
            .strip_prefix("0x")
            .unwrap()
            .to_uppercase();
        let directory = StaticDirectory::new().with_record(NAME, &format!("0x{checksummed}"));
        let service = LoginService::new(MemoryKv::new(), directory, Duration::from_secs(60));
        (service, key)
    }

    // -- 1. The happy path: issue, sign, verify ---------------------------------

    #[tokio::test]
    async fn full_round_trip_is_valid() {
        let (service, key) = service_with_alice();
        let address = address_of(key.verifying_key());

        let nonce = service.issue_nonce(DOMAIN, &address).await.unwrap();
        let message = challenge::render(DOMAIN, NAME, &nonce);
        let signature = personal_sign(&key, &message);

        let outcome = service.verify(NAME, DOMAIN, &signature).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Valid);
    }

    // -- 2. Unknown names never become a boolean ---------------------------------

    #[tokio::test]
    async fn unknown_name_is_its_own_outcome() {
        let (service, key) = service_with_alice();
        let signature = personal_sign(&key, "anything");
        let outcome = service.verify("bob.wrap", DOMAIN, &signature).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::UnknownName);
    }

    // -- 3. Signing against a stale nonce fails -----------------------------------

    #[tokio::test]
    async fn wrong_nonce_is_invalid() {
        let (service, key) = service_with_alice();
        let address = address_of(key.verifying_key());
        service.issue_nonce(DOMAIN, &address).await.unwrap();

        // Client signs a nonce that was never the stored one.
        let message = challenge::render(DOMAIN, NAME, "000000000");
        let signature = personal_sign(&key, &message);

        let outcome = service.verify(NAME, DOMAIN, &signature).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Invalid);
    }

    // -- 4. A different domain than was signed fails --------------------------------

    #[tokio::test]
    async fn cross_domain_signature_is_invalid() {
        let (service, key) = service_with_alice();
        let address = address_of(key.verifying_key());

        let nonce = service.issue_nonce(DOMAIN, &address).await.unwrap();
        // Same nonce value, signed under a different relying party.
        let message = challenge::render("https://evil.example", NAME, &nonce);
        let signature = personal_sign(&key, &message);

        let outcome = service.verify(NAME, DOMAIN, &signature).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Invalid);
    }

    // -- 5. Never-issued nonce renders as empty string, not an error ----------------

    #[tokio::test]
    async fn missing_nonce_verifies_against_empty_string() {
        let (service, key) = service_with_alice();

        // No issue_nonce call. Client signs the empty-nonce challenge.
        let message = challenge::render(DOMAIN, NAME, "");
        let signature = personal_sign(&key, &message);

        let outcome = service.verify(NAME, DOMAIN, &signature).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Valid);
    }

    // -- 6. Nonce is not consumed by a successful verification -----------------------

    #[tokio::test]
    async fn nonce_survives_successful_verification() {
        let (service, key) = service_with_alice();
        let address = address_of(key.verifying_key());

        let nonce = service.issue_nonce(DOMAIN, &address).await.unwrap();
        let message = challenge::render(DOMAIN, NAME, &nonce);
        let signature = personal_sign(&key, &message);

        // Replay inside the TTL is accepted by design; the TTL is the window.
        for _ in 0..3 {
            let outcome = service.verify(NAME, DOMAIN, &signature).await.unwrap();
            assert_eq!(outcome, VerifyOutcome::Valid);
        }
        assert_eq!(service.issue_nonce(DOMAIN, &address).await.unwrap(), nonce);
    }

    // -- 7. Directory reports checksummed case, key is stored lowercased --------------

    #[tokio::test]
    async fn checksummed_holder_address_matches_lowercase_issuance() {
        let (service, key) = service_with_alice();
        // Nonce issued with an all-lowercase address; the directory in
        // service_with_alice answers uppercase. The two must meet on one key.
        let address = address_of(key.verifying_key()).to_lowercase();

        let nonce = service.issue_nonce(DOMAIN, &address).await.unwrap();
        let message = challenge::render(DOMAIN, NAME, &nonce);
        let signature = personal_sign(&key, &message);

        let outcome = service.verify(NAME, DOMAIN, &signature).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Valid);
    }

    // -- 8. The known end-to-end scenario, down to the literal bytes -------------------

    #[tokio::test]
    async fn known_scenario_matches_literal_challenge() {
        use crate::store::NonceKv;
        use std::sync::Arc;

        let key = SigningKey::from_slice(&[7u8; 32]).unwrap();
        let address = address_of(key.verifying_key());
        let directory = StaticDirectory::new().with_record(NAME, &address);

        // Shared handle so the test can plant a known nonce under the exact
        // storage key the service uses.
        let kv = Arc::new(MemoryKv::new());
        kv.put(
            &format!("{DOMAIN}{}", address.to_lowercase()),
            "123456789",
            Duration::from_secs(60),
        )
        .await
        .unwrap();
        let service = LoginService::new(Arc::clone(&kv), directory, Duration::from_secs(60));

        let message = "https://example.com wants you to sign in with your Wrap Name:\nalice.wrap\n\nVersion: 1\nNonce: 123456789";
        assert_eq!(challenge::render(DOMAIN, NAME, "123456789"), message);

        let signature = personal_sign(&key, message);
        let outcome = service.verify(NAME, DOMAIN, &signature).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Valid);

        // Same inputs but the wrong nonce in the signed text: False.
        let wrong = personal_sign(
            &key,
            &challenge::render(DOMAIN, NAME, "000000000"),
        );
        let outcome = service.verify(NAME, DOMAIN, &wrong).await.unwrap();
        assert_eq!(outcome, VerifyOutcome::Invalid);
    }
}
