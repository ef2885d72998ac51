//! OIDC federated-login core for Sprintdeck.
//!
//! This crate implements the provider-facing half of SSO login:
//! - Provider registry (static, loaded at startup)
//! - Short-lived login state with PKCE material and replay protection
//! - Authorization request building (Authorization Code flow with PKCE)
//! - Callback processing: code exchange and ID token validation
//!
//! # Security Note
//! IdP access tokens, refresh tokens, and ID tokens are never persisted.
//! Only the verified identity claims (issuer, subject, email, display name)
//! leave this crate; tokens are validated and discarded in the same request.

pub mod client;
pub mod discovery;
pub mod errors;
pub mod jwks;
pub mod pkce;
pub mod registry;
pub mod service;
pub mod state;
pub mod types;

pub use client::{HttpProviderClient, ProviderClient};
pub use errors::{OidcError, Result};
pub use pkce::{code_challenge, generate_code_verifier, generate_nonce, generate_state_token};
pub use registry::ProviderRegistry;
pub use service::OidcLoginService;
pub use state::{MemoryStateStore, StateStore};
pub use types::{
    AuthorizationRequest, CallbackOutcome, IdTokenClaims, JwksCacheEntry, JwksKey, JwksKeySet,
    OidcConfiguration, ProviderConfig, ProviderDefinition, StateEntry, TokenResponse,
    VerifiedIdentity,
};

/// Current unix timestamp in seconds.
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
