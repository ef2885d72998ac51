//! Session token issuance.
//!
//! The real session service (refresh rotation, revocation, introspection)
//! lives with the rest of the application; this adapter only needs the
//! minting contract.

use anyhow::Result;
use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sprintdeck_identity::User;
use sprintdeck_oidc::current_timestamp;

/// Access/refresh token pair for a logged-in user
#[derive(Debug, Clone)]
pub struct SessionTokens {
    /// Signed JWT access token
    pub access_token: String,
    /// Opaque refresh token
    pub refresh_token: String,
    /// Access token lifetime (seconds)
    pub access_ttl: u64,
    /// Refresh token lifetime (seconds)
    pub refresh_ttl: u64,
}

/// Contract with the application's session service.
#[async_trait]
pub trait TokenIssuer: Send + Sync {
    /// Mint a token pair for the resolved user.
    async fn issue(&self, user: &User) -> Result<SessionTokens>;
}

/// Access token claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub sub: String,
    pub aud: String,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

/// HMAC-signed JWT issuer.
pub struct JwtTokenIssuer {
    signing_key: Vec<u8>,
    issuer: String,
    audience: String,
    access_ttl: u64,
    refresh_ttl: u64,
}

impl JwtTokenIssuer {
    /// Create an issuer with the given signing key and token lifetimes.
    pub fn new(
        signing_key: Vec<u8>,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        access_ttl: u64,
        refresh_ttl: u64,
    ) -> Self {
        Self {
            signing_key,
            issuer: issuer.into(),
            audience: audience.into(),
            access_ttl,
            refresh_ttl,
        }
    }
}

#[async_trait]
impl TokenIssuer for JwtTokenIssuer {
    async fn issue(&self, user: &User) -> Result<SessionTokens> {
        let now = current_timestamp();
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            sub: user.id.to_string(),
            aud: self.audience.clone(),
            iat: now,
            exp: now + self.access_ttl,
            jti: Uuid::new_v4().to_string(),
        };

        let access_token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.signing_key),
        )?;

        let refresh_token = {
            use rand::RngCore;
            let mut bytes = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut bytes);
            URL_SAFE_NO_PAD.encode(bytes)
        };

        Ok(SessionTokens {
            access_token,
            refresh_token,
            access_ttl: self.access_ttl,
            refresh_ttl: self.refresh_ttl,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    fn test_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "ada".to_string(),
            email: Some("a@b.com".to_string()),
            email_verified: true,
            display_name: None,
            created_at: current_timestamp(),
        }
    }

    fn issuer() -> JwtTokenIssuer {
        JwtTokenIssuer::new(
            vec![42u8; 32],
            "sprintdeck.test",
            "sprintdeck-api",
            900,
            604800,
        )
    }

    #[tokio::test]
    async fn test_access_token_verifies() {
        let user = test_user();
        let tokens = issuer().issue(&user).await.unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&["sprintdeck.test"]);
        validation.set_audience(&["sprintdeck-api"]);

        let data = decode::<SessionClaims>(
            &tokens.access_token,
            &DecodingKey::from_secret(&[42u8; 32]),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims.sub, user.id.to_string());
        assert!(data.claims.exp > data.claims.iat);
    }

    #[tokio::test]
    async fn test_refresh_tokens_unique() {
        let user = test_user();
        let svc = issuer();
        let first = svc.issue(&user).await.unwrap();
        let second = svc.issue(&user).await.unwrap();
        assert_ne!(first.refresh_token, second.refresh_token);
        assert_eq!(first.refresh_ttl, 604800);
    }
}
