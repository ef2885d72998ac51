//! PKCE material and random token generation (RFC 7636, S256 method).

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};

/// Generate a PKCE code verifier: 32 random bytes, base64url without padding.
///
/// Yields 43 characters (256 bits of entropy), within the 43..=128 range
/// RFC 7636 requires.
pub fn generate_code_verifier() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes::<32>())
}

/// Generate the opaque state token round-tripped through the IdP.
pub fn generate_state_token() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes::<32>())
}

/// Generate the nonce embedded in the ID token request.
pub fn generate_nonce() -> String {
    URL_SAFE_NO_PAD.encode(random_bytes::<32>())
}

/// Compute the S256 code challenge for a verifier: BASE64URL(SHA256(verifier)).
///
/// Pure and deterministic; the IdP recomputes this from the verifier we send
/// during token exchange and compares.
pub fn code_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_code_verifier_shape() {
        let verifier = generate_code_verifier();
        assert_eq!(verifier.len(), 43);
        assert!(verifier
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_code_challenge_deterministic() {
        let verifier = generate_code_verifier();
        assert_eq!(code_challenge(&verifier), code_challenge(&verifier));
    }

    #[test]
    fn test_code_challenge_rfc7636_vector() {
        // RFC 7636 Appendix B
        let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
        assert_eq!(
            code_challenge(verifier),
            "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM"
        );
    }

    #[test]
    fn test_code_challenge_no_collisions() {
        let mut challenges = HashSet::new();
        for _ in 0..512 {
            let verifier = generate_code_verifier();
            assert!(
                challenges.insert(code_challenge(&verifier)),
                "collision for verifier {}",
                verifier
            );
        }
    }

    #[test]
    fn test_generated_tokens_unique() {
        assert_ne!(generate_state_token(), generate_state_token());
        assert_ne!(generate_nonce(), generate_nonce());
        assert_ne!(generate_code_verifier(), generate_code_verifier());
    }
}
