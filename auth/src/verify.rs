//! # Signature Verification
//!
//! Checks that a submitted signature over the challenge message was produced
//! by the key behind the claimed holder address, using Ethereum's
//! personal-message scheme: the message is wrapped with the EIP-191 prefix,
//! hashed with Keccak-256, and the signer's address is *recovered* from the
//! 65-byte (r‖s‖v) signature — no public key ever travels with the request.
//!
//! ## Deliberate opacity
//!
//! The public boundary is a bare `bool`. Wrong signer, garbled hex, bad
//! recovery id, internal recovery failure — all of them are just `false`.
//! Giving callers (and therefore attackers) a detailed error oracle at this
//! boundary buys nothing and leaks plenty. Internally we do keep the
//! distinction, in [`SigCheck`], because logs are for operators.

use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use sha3::{Digest, Keccak256};

use crate::config::SIGNATURE_LEN;

/// Fine-grained verification result, internal to the crate.
///
/// Collapsed to `bool` by [`verify`]; exists so tracing can say *why*
/// without the caller ever seeing it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SigCheck {
    /// Signature recovers to the expected address.
    Valid,
    /// Well-formed signature, wrong signer.
    SignerMismatch { recovered: String },
    /// The signature bytes never made it to recovery.
    Malformed(String),
}

/// Compute a Keccak-256 digest.
pub fn keccak256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Wrap a message with the EIP-191 personal-message prefix:
/// `"\x19Ethereum Signed Message:\n" + len(message) + message`.
pub fn eip191_wrap(message: &str) -> String {
    format!("\x19Ethereum Signed Message:\n{}{}", message.len(), message)
}

/// Derive the lowercase `0x…` address for a secp256k1 public key:
/// the last 20 bytes of keccak256 over the uncompressed point without its
/// `0x04` tag byte.
pub fn address_of(key: &VerifyingKey) -> String {
    let point = key.to_encoded_point(false);
    let digest = keccak256(&point.as_bytes()[1..]);
    format!("0x{}", hex::encode(&digest[12..]))
}

/// Verify that `signature` is a personal-message signature over `message`
/// produced by the key behind `address`.
///
/// `signature` is hex, 65 bytes, with or without the `0x` prefix; the final
/// byte is the recovery id and is accepted in both the 0/1 and 27/28
/// conventions. `address` comparison is case-insensitive.
///
/// Returns `true` only for a well-formed signature that recovers to the
/// given address. Every other outcome — including internal recovery errors —
/// is `false`.
pub fn verify(address: &str, message: &str, signature: &str) -> bool {
    match check(address, message, signature) {
        SigCheck::Valid => true,
        SigCheck::SignerMismatch { recovered } => {
            tracing::debug!(expected = %address, %recovered, "signature signer mismatch");
            false
        }
        SigCheck::Malformed(reason) => {
            tracing::debug!(%reason, "malformed signature rejected");
            false
        }
    }
}

pub(crate) fn check(address: &str, message: &str, signature: &str) -> SigCheck {
    let hex_part = signature.strip_prefix("0x").unwrap_or(signature);

    let bytes = match hex::decode(hex_part) {
        Ok(b) => b,
        Err(e) => return SigCheck::Malformed(format!("signature is not hex: {e}")),
    };
    if bytes.len() != SIGNATURE_LEN {
        return SigCheck::Malformed(format!(
            "signature is {} bytes, expected {SIGNATURE_LEN}",
            bytes.len()
        ));
    }

    // v arrives as 0/1 or 27/28 depending on the wallet; % 27 maps all four
    // onto the raw recovery id.
    let recovery_id = match RecoveryId::try_from(bytes[64] % 27) {
        Ok(id) => id,
        Err(e) => return SigCheck::Malformed(format!("invalid recovery id: {e}")),
    };

    let sig = match Signature::try_from(&bytes[..64]) {
        Ok(s) => s,
        Err(e) => return SigCheck::Malformed(format!("invalid signature scalars: {e}")),
    };

    let digest = keccak256(eip191_wrap(message).as_bytes());

    let recovered_key = match VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id) {
        Ok(k) => k,
        Err(e) => return SigCheck::Malformed(format!("recovery failed: {e}")),
    };

    let recovered = address_of(&recovered_key);
    if recovered.eq_ignore_ascii_case(address) {
        SigCheck::Valid
    } else {
        SigCheck::SignerMismatch { recovered }
    }
}
