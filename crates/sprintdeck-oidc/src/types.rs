//! OIDC type definitions.

use serde::{Deserialize, Serialize};

/// Default scopes requested when a provider definition omits them
pub const DEFAULT_SCOPES: [&str; 3] = ["openid", "email", "profile"];

/// Provider definition as it appears in configuration (JSON)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDefinition {
    /// URL-safe identifier used in login routes
    pub slug: String,

    /// Human-readable provider name
    pub name: String,

    /// OIDC issuer URL
    pub issuer_url: String,

    /// Discovery endpoint override (defaults to issuer + /.well-known/openid-configuration)
    #[serde(default)]
    pub discovery_url: Option<String>,

    /// OAuth client ID registered with the provider
    pub client_id: String,

    /// OAuth client secret
    pub client_secret: String,

    /// Scopes to request (defaults to openid email profile)
    #[serde(default)]
    pub scopes: Option<Vec<String>>,

    /// Whether the provider is offered for login
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

/// Resolved provider configuration, immutable for the process lifetime
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// URL-safe identifier used in login routes
    pub slug: String,
    /// Human-readable provider name
    pub name: String,
    /// OIDC issuer URL, matched against the ID token `iss` claim
    pub issuer_url: String,
    /// Discovery endpoint override
    pub discovery_url: Option<String>,
    /// OAuth client ID
    pub client_id: String,
    /// OAuth client secret
    pub client_secret: String,
    /// Scopes to request
    pub scopes: Vec<String>,
    /// Whether the provider is offered for login
    pub enabled: bool,
}

impl ProviderConfig {
    /// Discovery document URL for this provider.
    pub fn discovery_endpoint(&self) -> String {
        match &self.discovery_url {
            Some(url) => url.clone(),
            None => format!(
                "{}/.well-known/openid-configuration",
                self.issuer_url.trim_end_matches('/')
            ),
        }
    }
}

/// Ephemeral login state, keyed by the opaque `state` token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateEntry {
    /// Provider the login was initiated against
    pub provider_slug: String,

    /// Caller's desired post-login destination
    pub redirect_uri: String,

    /// PKCE code verifier (secret, sent only during token exchange)
    pub code_verifier: String,

    /// Nonce echoed inside the ID token for replay protection
    pub nonce: String,

    /// Creation timestamp (unix seconds)
    pub created_at: u64,

    /// Expiry timestamp (unix seconds)
    pub expires_at: u64,
}

/// OIDC configuration from the discovery endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcConfiguration {
    /// Issuer URL as published by the provider
    pub issuer: String,
    /// Authorization endpoint
    pub authorization_endpoint: String,
    /// Token endpoint
    pub token_endpoint: String,
    /// JWKS URI
    pub jwks_uri: String,
    /// Userinfo endpoint (optional, ID token claims are preferred)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,
}

/// JSON Web Key Set from the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksKeySet {
    /// Array of JWK keys
    pub keys: Vec<JwksKey>,
}

impl JwksKeySet {
    /// Find key by Key ID (kid)
    pub fn find_key(&self, kid: &str) -> Option<&JwksKey> {
        self.keys.iter().find(|k| k.kid.as_deref() == Some(kid))
    }
}

/// Individual JSON Web Key
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwksKey {
    /// Key type (e.g., "RSA")
    pub kty: String,
    /// Key ID
    pub kid: Option<String>,
    /// Key use (e.g., "sig")
    #[serde(rename = "use")]
    pub use_: Option<String>,
    /// Algorithm (e.g., "RS256")
    pub alg: Option<String>,
    /// RSA modulus (base64url encoded)
    pub n: String,
    /// RSA public exponent (base64url encoded)
    pub e: String,
}

/// JWKS cache entry with expiration
#[derive(Debug, Clone)]
pub struct JwksCacheEntry {
    /// The cached key set
    pub jwks: JwksKeySet,
    /// Unix timestamp when the JWKS was fetched
    pub fetched_at: u64,
    /// Time-to-live in seconds
    pub ttl: u64,
}

impl JwksCacheEntry {
    /// Check if the cache entry is still valid
    pub fn is_valid(&self, current_time: u64) -> bool {
        current_time < self.fetched_at + self.ttl
    }
}

/// Token endpoint response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// IdP access token (used only if a userinfo call is ever needed)
    pub access_token: String,
    /// ID token (JWT), required for OIDC login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    /// Token type, normally "Bearer"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    /// Refresh token (unused, never stored)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Granted scopes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// ID token claims (JWT payload)
/// Standard OIDC claims: https://openid.net/specs/openid-connect-core-1_0.html#IDToken
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// Issuer (provider URL)
    pub iss: String,
    /// Subject (provider's user ID)
    pub sub: String,
    /// Audience (our client ID)
    pub aud: String,
    /// Expiration time (unix seconds)
    pub exp: u64,
    /// Issued-at time (unix seconds)
    pub iat: u64,
    /// Nonce (replay protection)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<String>,
    /// Email address
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Email verified flag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_verified: Option<bool>,
    /// Full name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
    /// Given name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    /// Family name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

/// Verified external identity produced by ID token validation.
///
/// Transient: consumed once by the identity resolver, never persisted here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    /// Issuer URL (`iss` claim)
    pub issuer: String,
    /// Provider-scoped user ID (`sub` claim)
    pub subject: String,
    /// Email address as reported by the provider
    pub email: Option<String>,
    /// Whether the provider marked the email as verified
    pub email_verified: bool,
    /// Display name as reported by the provider
    pub display_name: Option<String>,
}

/// Output of the authorization request builder
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// Full IdP authorization URL to redirect the browser to
    pub auth_url: String,
    /// Opaque state token embedded in the URL
    pub state: String,
    /// PKCE code verifier persisted with the state
    pub code_verifier: String,
}

/// Output of the callback processor
#[derive(Debug, Clone)]
pub struct CallbackOutcome {
    /// Validated identity claims
    pub identity: VerifiedIdentity,
    /// The original caller-requested post-login destination
    pub redirect_uri: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwks_key_set_find_key() {
        let jwks = JwksKeySet {
            keys: vec![
                JwksKey {
                    kty: "RSA".to_string(),
                    kid: Some("key1".to_string()),
                    use_: Some("sig".to_string()),
                    alg: Some("RS256".to_string()),
                    n: "test_n".to_string(),
                    e: "AQAB".to_string(),
                },
                JwksKey {
                    kty: "RSA".to_string(),
                    kid: Some("key2".to_string()),
                    use_: Some("sig".to_string()),
                    alg: Some("RS256".to_string()),
                    n: "test_n2".to_string(),
                    e: "AQAB".to_string(),
                },
            ],
        };

        assert_eq!(
            jwks.find_key("key1").unwrap().kid.as_deref(),
            Some("key1")
        );
        assert_eq!(
            jwks.find_key("key2").unwrap().kid.as_deref(),
            Some("key2")
        );
        assert!(jwks.find_key("key3").is_none());
    }

    #[test]
    fn test_id_token_claims_deserialization() {
        let json = r#"{
            "iss": "https://dex.example",
            "sub": "u1",
            "aud": "spd-client",
            "exp": 1705320000,
            "iat": 1705316400,
            "nonce": "test_nonce",
            "email": "a@b.com",
            "email_verified": true,
            "name": "Ada B"
        }"#;

        let claims: IdTokenClaims = serde_json::from_str(json).unwrap();

        assert_eq!(claims.iss, "https://dex.example");
        assert_eq!(claims.sub, "u1");
        assert_eq!(claims.aud, "spd-client");
        assert_eq!(claims.nonce.as_deref(), Some("test_nonce"));
        assert_eq!(claims.email.as_deref(), Some("a@b.com"));
        assert_eq!(claims.email_verified, Some(true));
    }

    #[test]
    fn test_provider_definition_defaults() {
        let json = r#"{
            "slug": "dex",
            "name": "Dex",
            "issuer_url": "https://dex.example",
            "client_id": "spd-client",
            "client_secret": "s3cret"
        }"#;

        let def: ProviderDefinition = serde_json::from_str(json).unwrap();
        assert!(def.enabled);
        assert!(def.scopes.is_none());
        assert!(def.discovery_url.is_none());
    }

    #[test]
    fn test_discovery_endpoint_default_and_override() {
        let mut config = ProviderConfig {
            slug: "dex".to_string(),
            name: "Dex".to_string(),
            issuer_url: "https://dex.example/".to_string(),
            discovery_url: None,
            client_id: "spd-client".to_string(),
            client_secret: "s3cret".to_string(),
            scopes: vec!["openid".to_string()],
            enabled: true,
        };

        assert_eq!(
            config.discovery_endpoint(),
            "https://dex.example/.well-known/openid-configuration"
        );

        config.discovery_url = Some("https://dex.example/custom/discovery".to_string());
        assert_eq!(
            config.discovery_endpoint(),
            "https://dex.example/custom/discovery"
        );
    }

    #[test]
    fn test_jwks_cache_entry_validity() {
        let entry = JwksCacheEntry {
            jwks: JwksKeySet { keys: vec![] },
            fetched_at: 1000,
            ttl: 3600,
        };

        assert!(entry.is_valid(1000));
        assert!(entry.is_valid(4599));
        assert!(!entry.is_valid(4600));
    }
}
