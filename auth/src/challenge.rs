//! # Challenge Message Template
//!
//! The deterministic text a client must sign to prove key control. Both
//! sides recompute it independently from (domain, name, nonce) — it is
//! never stored, never sent by the server — so the rendering below is a
//! byte-exact compatibility contract. Whitespace, line breaks, the blank
//! line: all of it is load-bearing. Reformat this template and every wallet
//! integration breaks at once.

use crate::config::CHALLENGE_VERSION;

/// Render the challenge message for a (domain, name, nonce) triple.
///
/// Pure and deterministic: identical inputs always produce byte-identical
/// output. No validation happens here — inputs are already-validated
/// strings by the time they reach the template.
///
/// # Example
///
/// ```
/// use wraplogin_auth::challenge::render;
///
/// let msg = render("https://example.com", "alice.wrap", "123456789");
/// assert!(msg.starts_with("https://example.com wants you to sign in"));
/// assert!(msg.ends_with("Nonce: 123456789"));
/// ```
pub fn render(domain: &str, name: &str, nonce: &str) -> String {
    format!(
        "{domain} wants you to sign in with your Wrap Name:\n{name}\n\nVersion: {CHALLENGE_VERSION}\nNonce: {nonce}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- 1. The exact wire bytes, per the compatibility contract ----------------

    #[test]
    fn renders_exact_template() {
        let msg = render("https://example.com", "alice.wrap", "123456789");
        assert_eq!(
            msg,
            "https://example.com wants you to sign in with your Wrap Name:\n\
             alice.wrap\n\
             \n\
             Version: 1\n\
             Nonce: 123456789"
        );
    }

    // -- 2. Determinism ---------------------------------------------------------

    #[test]
    fn identical_inputs_render_identically() {
        let a = render("https://d", "n.wrap", "42");
        let b = render("https://d", "n.wrap", "42");
        assert_eq!(a, b);
    }

    // -- 3. Empty nonce renders as an empty field, not a missing line -----------

    #[test]
    fn empty_nonce_keeps_the_line() {
        let msg = render("https://d", "n.wrap", "");
        assert!(msg.ends_with("Nonce: "));
    }
}
