// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # wraplogin — Core Library
//!
//! Passwordless sign-in for people who already carry a keypair. A relying
//! party (a website, identified by its domain) wants proof that the caller
//! controls the private key behind a human-readable Wrap Name — without the
//! key, a password, or an email round-trip ever entering the picture.
//!
//! The protocol is the classic challenge-response three-step:
//!
//! 1. The client asks us for a short-lived nonce, keyed by
//!    (domain, address).
//! 2. The client signs a deterministic challenge message containing that
//!    nonce, using Ethereum's personal-message scheme (EIP-191).
//! 3. The client hands back (name, domain, signature); we resolve the name
//!    to its holder address through the on-chain name directory, re-render
//!    the exact same challenge, and check that the signature recovers to
//!    that address.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the actual moving parts:
//!
//! - **store** — The TTL key-value seam the nonces live behind. Injected,
//!   never ambient.
//! - **nonce** — Nonce issuance and lookup. The only component with a write
//!   path.
//! - **directory** — Wrap Name → holder address resolution via the external
//!   GraphQL indexer.
//! - **challenge** — The byte-exact challenge template. Pure function,
//!   compatibility contract.
//! - **verify** — EIP-191 signature recovery and signer comparison.
//! - **login** — The composed end-to-end flow the HTTP layer calls into.
//! - **config** — Protocol constants and defaults.
//!
//! ## Design Philosophy
//!
//! 1. The nonce protocol is the only part with real security obligations;
//!    everything else is plumbing and is kept boring on purpose.
//! 2. Infrastructure failures are never dressed up as denials. A dead store
//!    is an outage, not a `False`.
//! 3. Verification failures are deliberately opaque at the public boundary —
//!    wrong key, garbled hex, and internal recovery errors all read as the
//!    same `false`.

pub mod challenge;
pub mod config;
pub mod directory;
pub mod error;
pub mod login;
pub mod nonce;
pub mod store;
pub mod verify;

pub use directory::{Directory, GraphDirectory, StaticDirectory};
pub use error::AuthError;
pub use login::{LoginService, VerifyOutcome};
pub use nonce::NonceStore;
pub use store::{memory::MemoryKv, sled::SledKv, NonceKv, StoreError};
