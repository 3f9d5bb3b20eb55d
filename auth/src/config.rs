//! # Protocol Constants & Defaults
//!
//! Every magic number in the sign-in protocol lives here. The challenge
//! template version and the nonce TTL are *compatibility and security
//! parameters respectively* — changing either one invalidates every
//! in-flight sign-in, so treat edits with the respect they deserve.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Challenge Protocol
// ---------------------------------------------------------------------------

/// Version marker embedded in the challenge message template.
///
/// Clients reconstruct the challenge byte-for-byte, so this value is part of
/// the wire contract. Bump it only together with a coordinated client
/// rollout.
pub const CHALLENGE_VERSION: u32 = 1;

/// How long an issued nonce stays live in the store.
///
/// 60 seconds is enough for a human to click through a wallet prompt and
/// short enough to keep the replay window uncomfortable for an attacker.
/// Deployments can override this via `--nonce-ttl`; it is deliberately a
/// knob, not a law.
pub const DEFAULT_NONCE_TTL: Duration = Duration::from_secs(60);

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Length in hex digits of an address, excluding the `0x` prefix.
/// 20 bytes, the usual Ethereum shape.
pub const ADDRESS_HEX_LEN: usize = 40;

/// Length in bytes of a recoverable signature: r (32) ‖ s (32) ‖ v (1).
pub const SIGNATURE_LEN: usize = 65;

// ---------------------------------------------------------------------------
// Directory
// ---------------------------------------------------------------------------

/// Default GraphQL endpoint of the Wrap Name indexer.
///
/// Injected configuration in any real deployment; this default exists so
/// `run` works out of the box against the public subgraph.
pub const DEFAULT_DIRECTORY_ENDPOINT: &str =
    "https://api.thegraph.com/subgraphs/name/amandafanny/erc7527";
