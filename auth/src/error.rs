//! # Service Error Taxonomy
//!
//! Three kinds of failure exist in this system, and keeping them apart is a
//! load-bearing design decision:
//!
//! 1. **Unknown name** — the directory has no record for the claimed Wrap
//!    Name. Surfaced as an explicit outcome ([`crate::login::VerifyOutcome::UnknownName`]),
//!    never as an error here.
//! 2. **Verification false** — wrong signer, garbled signature, recovery
//!    blew up. All collapsed into a boolean `false` at the verify boundary
//!    with no distinguishing detail.
//! 3. **Infrastructure failure** — the nonce store or the directory is
//!    unreachable. That is what this module models. It must propagate as a
//!    hard error so operators can tell an outage from a denial.

use thiserror::Error;

use crate::directory::DirectoryError;
use crate::store::StoreError;

/// Infrastructure-level failures of the login flow.
///
/// Deliberately does NOT carry an "invalid signature" or "name not found"
/// variant — those are outcomes, not errors, and mixing them in here is how
/// outages end up logged as failed logins.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The nonce store could not be reached or returned garbage.
    #[error("nonce store unavailable: {0}")]
    Store(#[from] StoreError),

    /// The name directory could not be queried or its answer could not be
    /// decoded. Distinct from "the name does not exist".
    #[error("name directory unreachable: {0}")]
    Directory(#[from] DirectoryError),
}
