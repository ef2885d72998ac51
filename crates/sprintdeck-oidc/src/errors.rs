//! OIDC subsystem error types.

use thiserror::Error;

/// OIDC login errors.
///
/// This is a closed taxonomy: the HTTP layer matches exhaustively over these
/// kinds to pick status codes and sanitized user-facing messages. Raw detail
/// strings are for server-side logs only and must never reach the browser.
#[derive(Debug, Error)]
pub enum OidcError {
    /// No provider registered under the requested slug
    #[error("Provider not found: {0}")]
    ProviderNotFound(String),

    /// Provider exists but is disabled in configuration
    #[error("Provider disabled: {0}")]
    ProviderDisabled(String),

    /// State token unknown or already consumed
    #[error("Invalid or already used login state")]
    InvalidState,

    /// State token known but past its expiry
    #[error("Login state expired")]
    StateExpired,

    /// Code-for-token exchange with the IdP failed
    #[error("Token exchange failed: {0}")]
    TokenExchangeFailed(String),

    /// ID token failed signature or claim validation
    #[error("Invalid ID token: {0}")]
    InvalidIdToken(String),

    /// Nonce claim did not match the stored nonce (replay/CSRF attempt)
    #[error("ID token nonce mismatch")]
    NonceMismatch,

    /// Token response carried no ID token
    #[error("Token response missing id_token")]
    MissingIdToken,

    /// OIDC discovery document could not be fetched or parsed
    #[error("OIDC discovery failed: {0}")]
    DiscoveryFailed(String),

    /// JWKS could not be fetched or parsed
    #[error("JWKS fetch failed: {0}")]
    JwksFetchFailed(String),

    /// No JWKS key matched the token's kid
    #[error("Signing key not found: kid={kid}")]
    KeyNotFound {
        /// Key ID from the token header
        kid: String,
    },

    /// Token signed with an unexpected algorithm
    #[error("Invalid signing algorithm: expected {expected}, got {got}")]
    InvalidAlgorithm {
        /// Algorithm this client accepts
        expected: String,
        /// Algorithm found in the token header
        got: String,
    },

    /// Authorization endpoint URL could not be constructed
    #[error("Invalid authorization URL: {0}")]
    InvalidAuthUrl(String),

    /// State store backend failure (external store deployments)
    #[error("State store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Result type for OIDC operations
pub type Result<T> = std::result::Result<T, OidcError>;
