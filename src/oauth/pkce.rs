//! Proof Key for Code Exchange (RFC 7636)
//!
//! The verifier is 32 random bytes rendered as 43 base64url characters; the
//! challenge is the base64url SHA-256 digest of the verifier (`S256`).

use std::fmt;

use crate::utils::crypto::{generate_random_token, sha256_base64url};

/// Bytes of entropy behind every verifier
pub const VERIFIER_BYTES: usize = 32;

/// Length of an encoded `S256` challenge
pub const CHALLENGE_LENGTH: usize = 43;

/// The only challenge method this client sends
pub const CHALLENGE_METHOD: &str = "S256";

/// One-time verifier/challenge pair for a single authorization attempt
#[derive(Clone, PartialEq, Eq)]
pub struct PkcePair {
    verifier: String,
    challenge: String,
}

impl PkcePair {
    /// Generate a fresh pair from the CSPRNG
    #[must_use]
    pub fn generate() -> Self {
        Self::from_verifier(generate_random_token(VERIFIER_BYTES))
    }

    /// Rebuild a pair from a stored verifier
    #[must_use]
    pub fn from_verifier(verifier: String) -> Self {
        let challenge = derive_challenge(&verifier);
        Self {
            verifier,
            challenge,
        }
    }

    /// The secret half; only ever sent to the token endpoint
    #[must_use]
    pub fn verifier(&self) -> &str {
        &self.verifier
    }

    /// The public half; sent in the authorization request
    #[must_use]
    pub fn challenge(&self) -> &str {
        &self.challenge
    }

    /// Split into `(verifier, challenge)`
    #[must_use]
    pub fn into_parts(self) -> (String, String) {
        (self.verifier, self.challenge)
    }
}

// Keep verifiers out of logs
impl fmt::Debug for PkcePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PkcePair")
            .field("verifier", &"<redacted>")
            .field("challenge", &self.challenge)
            .finish()
    }
}

/// `S256` transform: `BASE64URL(SHA256(ASCII(verifier)))`
#[must_use]
pub fn derive_challenge(verifier: &str) -> String {
    sha256_base64url(verifier.as_bytes())
}

/// Check a verifier against a challenge
#[must_use]
pub fn verify_challenge(verifier: &str, challenge: &str) -> bool {
    derive_challenge(verifier) == challenge
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_pair_round_trip() {
        for _ in 0..32 {
            let pair = PkcePair::generate();
            assert_eq!(pair.challenge(), derive_challenge(pair.verifier()));
            assert!(verify_challenge(pair.verifier(), pair.challenge()));
        }
    }

    #[test]
    fn test_lengths_and_alphabet() {
        let pair = PkcePair::generate();
        // RFC 7636 requires 43..=128 characters
        assert_eq!(pair.verifier().len(), 43);
        assert_eq!(pair.challenge().len(), CHALLENGE_LENGTH);
        for c in pair.verifier().chars().chain(pair.challenge().chars()) {
            assert!(c.is_ascii_alphanumeric() || c == '-' || c == '_', "bad char {c}");
        }
    }

    #[test]
    fn test_pairs_are_not_reused() {
        let a = PkcePair::generate();
        let b = PkcePair::generate();
        assert_ne!(a.verifier(), b.verifier());
        assert_ne!(a.challenge(), b.challenge());
    }

    #[test]
    fn test_rfc_vector() {
        let pair =
            PkcePair::from_verifier("dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk".to_string());
        assert_eq!(
            pair.challenge(),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_debug_redacts_verifier() {
        let pair = PkcePair::generate();
        let debug = format!("{pair:?}");
        assert!(!debug.contains(pair.verifier()));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_wrong_verifier_fails() {
        let pair = PkcePair::generate();
        let other = PkcePair::generate();
        assert!(!verify_challenge(other.verifier(), pair.challenge()));
    }
}
