//! OIDC provider discovery via the .well-known endpoint.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;

use crate::current_timestamp;
use crate::errors::{OidcError, Result};
use crate::types::{OidcConfiguration, ProviderConfig};

/// How long a discovery document is served from cache (seconds)
const DISCOVERY_CACHE_TTL: u64 = 3600;

/// Cache of discovery documents keyed by provider slug
pub type DiscoveryCache = Arc<RwLock<HashMap<String, (OidcConfiguration, u64)>>>;

/// Fetch the discovery document for a provider.
///
/// Uses `discovery_url` when configured, otherwise derives the standard
/// `.well-known/openid-configuration` path from the issuer URL.
pub async fn discover_oidc_config(
    http_client: &Client,
    provider: &ProviderConfig,
) -> Result<OidcConfiguration> {
    let discovery_url = provider.discovery_endpoint();

    let config: OidcConfiguration = http_client
        .get(&discovery_url)
        .send()
        .await
        .map_err(|e| OidcError::DiscoveryFailed(format!("HTTP error: {}", e)))?
        .error_for_status()
        .map_err(|e| OidcError::DiscoveryFailed(format!("Status error: {}", e)))?
        .json()
        .await
        .map_err(|e| OidcError::DiscoveryFailed(format!("JSON parse error: {}", e)))?;

    Ok(config)
}

/// Fetch the discovery document with per-slug caching.
pub async fn discover_oidc_config_cached(
    http_client: &Client,
    provider: &ProviderConfig,
    cache: &DiscoveryCache,
) -> Result<OidcConfiguration> {
    let now = current_timestamp();

    {
        let cache_read = cache.read().await;
        if let Some((config, fetched_at)) = cache_read.get(&provider.slug) {
            if now < fetched_at + DISCOVERY_CACHE_TTL {
                return Ok(config.clone());
            }
        }
    }

    let config = discover_oidc_config(http_client, provider).await?;

    {
        let mut cache_write = cache.write().await;
        cache_write.insert(provider.slug.clone(), (config.clone(), now));
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> ProviderConfig {
        ProviderConfig {
            slug: "dex".to_string(),
            name: "Dex".to_string(),
            issuer_url: "https://dex.example".to_string(),
            discovery_url: None,
            client_id: "spd-client".to_string(),
            client_secret: "s3cret".to_string(),
            scopes: vec!["openid".to_string()],
            enabled: true,
        }
    }

    #[tokio::test]
    async fn test_cached_document_served_without_refetch() {
        let cache: DiscoveryCache = Arc::new(RwLock::new(HashMap::new()));
        let document = OidcConfiguration {
            issuer: "https://dex.example".to_string(),
            authorization_endpoint: "https://dex.example/auth".to_string(),
            token_endpoint: "https://dex.example/token".to_string(),
            jwks_uri: "https://dex.example/keys".to_string(),
            userinfo_endpoint: None,
        };

        {
            let mut cache_write = cache.write().await;
            cache_write.insert(
                "dex".to_string(),
                (document.clone(), current_timestamp()),
            );
        }

        // The issuer URL is unreachable; a cache hit must not touch it.
        let http_client = Client::new();
        let config = discover_oidc_config_cached(&http_client, &provider(), &cache)
            .await
            .unwrap();
        assert_eq!(config.authorization_endpoint, document.authorization_endpoint);
    }
}
