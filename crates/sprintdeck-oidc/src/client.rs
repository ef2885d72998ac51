//! Provider client: the capability seam to a real OIDC identity provider.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use reqwest::Client;
use tokio::sync::RwLock;

use crate::current_timestamp;
use crate::discovery::{discover_oidc_config_cached, DiscoveryCache};
use crate::errors::{OidcError, Result};
use crate::jwks::{fetch_jwks_cached, fetch_jwks_fresh, JwksCache};
use crate::types::{IdTokenClaims, JwksKeySet, OidcConfiguration, ProviderConfig, TokenResponse};

/// Timeout for outbound IdP calls; the IdP is an untrusted external dependency
const IDP_REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

/// Capability interface to an OIDC provider.
///
/// The callback processor is written against this trait so it is not coupled
/// to a specific HTTP or JWT library, and so tests can substitute a double.
/// Nonce comparison is deliberately NOT part of `validate_id_token`: the
/// callback processor checks the nonce against stored state itself, so a test
/// double cannot accidentally bypass replay protection.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Fetch the provider's endpoint configuration.
    async fn discover(&self, provider: &ProviderConfig) -> Result<OidcConfiguration>;

    /// Exchange an authorization code for tokens (PKCE verifier included).
    async fn exchange_code(
        &self,
        provider: &ProviderConfig,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse>;

    /// Validate an ID token's signature and standard claims.
    ///
    /// Checks: RS256 signature against the provider's published keys, `iss`
    /// equals the configured issuer, `aud` equals our client ID, `exp` not
    /// passed, `iat` not in the future.
    async fn validate_id_token(
        &self,
        provider: &ProviderConfig,
        raw_id_token: &str,
    ) -> Result<IdTokenClaims>;
}

/// Production provider client backed by reqwest and jsonwebtoken.
pub struct HttpProviderClient {
    http_client: Client,
    discovery_cache: DiscoveryCache,
    jwks_cache: JwksCache,
}

impl HttpProviderClient {
    /// Create a client with an explicit timeout on all IdP calls.
    pub fn new() -> Self {
        let http_client = Client::builder()
            .timeout(IDP_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            discovery_cache: Arc::new(RwLock::new(HashMap::new())),
            jwks_cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    async fn validate_against_jwks(
        &self,
        provider: &ProviderConfig,
        raw_id_token: &str,
        jwks: &JwksKeySet,
    ) -> Result<IdTokenClaims> {
        let header = decode_header(raw_id_token)
            .map_err(|e| OidcError::InvalidIdToken(format!("Failed to decode header: {}", e)))?;

        if header.alg != Algorithm::RS256 {
            return Err(OidcError::InvalidAlgorithm {
                expected: "RS256".to_string(),
                got: format!("{:?}", header.alg),
            });
        }

        let kid = header.kid.ok_or_else(|| OidcError::KeyNotFound {
            kid: "missing".to_string(),
        })?;

        let jwk = jwks
            .find_key(&kid)
            .ok_or_else(|| OidcError::KeyNotFound { kid: kid.clone() })?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&[&provider.issuer_url]);
        validation.set_audience(&[&provider.client_id]);
        validation.validate_exp = true;
        validation.validate_nbf = false;
        validation.leeway = 60;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e)
            .map_err(|e| OidcError::InvalidIdToken(format!("Invalid RSA key: {}", e)))?;

        let token_data = decode::<IdTokenClaims>(raw_id_token, &decoding_key, &validation)
            .map_err(|e| OidcError::InvalidIdToken(format!("JWT validation failed: {}", e)))?;

        let claims = token_data.claims;
        let current_time = current_timestamp();

        if claims.iat > current_time + 60 {
            return Err(OidcError::InvalidIdToken(format!(
                "Token issued in the future: iat={} now={}",
                claims.iat, current_time
            )));
        }

        Ok(claims)
    }
}

impl Default for HttpProviderClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    async fn discover(&self, provider: &ProviderConfig) -> Result<OidcConfiguration> {
        discover_oidc_config_cached(&self.http_client, provider, &self.discovery_cache).await
    }

    async fn exchange_code(
        &self,
        provider: &ProviderConfig,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse> {
        let oidc_config = self.discover(provider).await?;

        let mut params = HashMap::new();
        params.insert("grant_type", "authorization_code");
        params.insert("code", code);
        params.insert("redirect_uri", redirect_uri);
        params.insert("client_id", provider.client_id.as_str());
        params.insert("client_secret", provider.client_secret.as_str());
        params.insert("code_verifier", code_verifier);

        let response = self
            .http_client
            .post(&oidc_config.token_endpoint)
            .form(&params)
            .send()
            .await
            .map_err(|e| OidcError::TokenExchangeFailed(format!("HTTP error: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OidcError::TokenExchangeFailed(format!(
                "Status {}: {}",
                status, body
            )));
        }

        let token_response: TokenResponse = response.json().await.map_err(|e| {
            OidcError::TokenExchangeFailed(format!("Failed to parse token response: {}", e))
        })?;

        Ok(token_response)
    }

    async fn validate_id_token(
        &self,
        provider: &ProviderConfig,
        raw_id_token: &str,
    ) -> Result<IdTokenClaims> {
        let oidc_config = self.discover(provider).await?;

        let jwks = fetch_jwks_cached(
            &self.http_client,
            &provider.slug,
            &oidc_config.jwks_uri,
            &self.jwks_cache,
        )
        .await?;

        match self
            .validate_against_jwks(provider, raw_id_token, &jwks)
            .await
        {
            Ok(claims) => Ok(claims),
            Err(OidcError::InvalidIdToken(_)) | Err(OidcError::KeyNotFound { .. }) => {
                // Could be provider key rotation, retry once with fresh keys
                let jwks = fetch_jwks_fresh(
                    &self.http_client,
                    &provider.slug,
                    &oidc_config.jwks_uri,
                    &self.jwks_cache,
                )
                .await?;
                self.validate_against_jwks(provider, raw_id_token, &jwks)
                    .await
            }
            Err(e) => Err(e),
        }
    }
}
