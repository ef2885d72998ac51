use anyhow::Result;
use std::net::SocketAddr;

use sprintdeck_oidc::ProviderDefinition;

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_address: SocketAddr,

    /// Public base URL of this service; the fixed OIDC redirect_uri is
    /// derived from it
    pub public_base_url: String,

    /// Frontend base URL; default post-login destination and login error page
    pub frontend_base_url: String,

    /// Login state TTL in minutes
    pub state_ttl_minutes: u64,

    /// Configured identity providers
    pub providers: Vec<ProviderDefinition>,

    /// HMAC key for access-token signing (32 bytes)
    pub session_signing_key: Vec<u8>,

    /// Access token expiry (seconds)
    pub access_token_expiry: u64,

    /// Refresh token expiry (seconds)
    pub refresh_token_expiry: u64,

    /// Deployment environment; anything but "development" sets Secure cookies
    pub environment: String,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let bind_address = std::env::var("BIND_ADDRESS")
            .unwrap_or_else(|_| "127.0.0.1:8080".to_string())
            .parse()?;

        let public_base_url = std::env::var("PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080".to_string());

        let frontend_base_url = std::env::var("FRONTEND_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:4321".to_string());

        let state_ttl_minutes = std::env::var("OIDC_STATE_TTL_MINUTES")
            .unwrap_or_else(|_| "10".to_string())
            .parse()?;

        let providers = match std::env::var("OIDC_PROVIDERS") {
            Ok(json) => serde_json::from_str(&json)
                .map_err(|e| anyhow::anyhow!("OIDC_PROVIDERS is not valid JSON: {}", e))?,
            Err(_) => Vec::new(),
        };

        let environment =
            std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let session_signing_key = match std::env::var("SESSION_SIGNING_KEY") {
            Ok(hex_key) => {
                let bytes = hex::decode(&hex_key)?;
                if bytes.len() != 32 {
                    anyhow::bail!("SESSION_SIGNING_KEY must be 32 bytes (64 hex chars)");
                }
                bytes
            }
            Err(_) if environment == "development" => {
                // Sessions will not survive a restart, acceptable for dev
                use rand::RngCore;
                let mut key = vec![0u8; 32];
                rand::thread_rng().fill_bytes(&mut key);
                key
            }
            Err(_) => {
                anyhow::bail!("SESSION_SIGNING_KEY environment variable required");
            }
        };

        let access_token_expiry = std::env::var("ACCESS_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "900".to_string()) // 15 minutes
            .parse()?;

        let refresh_token_expiry = std::env::var("REFRESH_TOKEN_TTL_SECONDS")
            .unwrap_or_else(|_| "604800".to_string()) // 7 days
            .parse()?;

        Ok(Config {
            bind_address,
            public_base_url,
            frontend_base_url,
            state_ttl_minutes,
            providers,
            session_signing_key,
            access_token_expiry,
            refresh_token_expiry,
            environment,
        })
    }

    /// Whether cookies should carry the Secure flag.
    pub fn secure_cookies(&self) -> bool {
        self.environment != "development"
    }

    /// Default post-login destination.
    pub fn default_post_login_url(&self) -> String {
        format!("{}/dashboard", self.frontend_base_url.trim_end_matches('/'))
    }

    /// Frontend login page, the target for sanitized error redirects.
    pub fn login_url(&self) -> String {
        format!("{}/login", self.frontend_base_url.trim_end_matches('/'))
    }
}
