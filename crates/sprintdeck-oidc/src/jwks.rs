//! JWKS (JSON Web Key Set) fetching and caching.

use std::collections::HashMap;
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::RwLock;

use crate::current_timestamp;
use crate::errors::{OidcError, Result};
use crate::types::{JwksCacheEntry, JwksKeySet};

/// How long a fetched JWKS is served from cache (seconds)
const JWKS_CACHE_TTL: u64 = 3600;

/// Cache of key sets keyed by provider slug
pub type JwksCache = Arc<RwLock<HashMap<String, JwksCacheEntry>>>;

/// Fetch a JWKS from the provider.
pub async fn fetch_jwks(http_client: &Client, jwks_uri: &str) -> Result<JwksKeySet> {
    let jwks: JwksKeySet = http_client
        .get(jwks_uri)
        .send()
        .await
        .map_err(|e| OidcError::JwksFetchFailed(format!("HTTP error: {}", e)))?
        .error_for_status()
        .map_err(|e| OidcError::JwksFetchFailed(format!("Status error: {}", e)))?
        .json()
        .await
        .map_err(|e| OidcError::JwksFetchFailed(format!("JSON parse error: {}", e)))?;

    Ok(jwks)
}

/// Fetch a JWKS with caching.
pub async fn fetch_jwks_cached(
    http_client: &Client,
    slug: &str,
    jwks_uri: &str,
    cache: &JwksCache,
) -> Result<JwksKeySet> {
    let current_time = current_timestamp();

    {
        let cache_read = cache.read().await;
        if let Some(entry) = cache_read.get(slug) {
            if entry.is_valid(current_time) {
                return Ok(entry.jwks.clone());
            }
        }
    }

    let jwks = fetch_jwks(http_client, jwks_uri).await?;

    {
        let mut cache_write = cache.write().await;
        cache_write.insert(
            slug.to_string(),
            JwksCacheEntry {
                jwks: jwks.clone(),
                fetched_at: current_time,
                ttl: JWKS_CACHE_TTL,
            },
        );
    }

    Ok(jwks)
}

/// Force-refresh a JWKS, invalidating any cached entry first.
///
/// Used when signature validation fails against the cached set, which is the
/// normal symptom of provider key rotation.
pub async fn fetch_jwks_fresh(
    http_client: &Client,
    slug: &str,
    jwks_uri: &str,
    cache: &JwksCache,
) -> Result<JwksKeySet> {
    {
        let mut cache_write = cache.write().await;
        cache_write.remove(slug);
    }

    let jwks = fetch_jwks(http_client, jwks_uri).await?;

    {
        let mut cache_write = cache.write().await;
        cache_write.insert(
            slug.to_string(),
            JwksCacheEntry {
                jwks: jwks.clone(),
                fetched_at: current_timestamp(),
                ttl: JWKS_CACHE_TTL,
            },
        );
    }

    Ok(jwks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::JwksKey;

    #[tokio::test]
    async fn test_valid_cache_entry_served_without_fetch() {
        let cache: JwksCache = Arc::new(RwLock::new(HashMap::new()));
        {
            let mut cache_write = cache.write().await;
            cache_write.insert(
                "dex".to_string(),
                JwksCacheEntry {
                    jwks: JwksKeySet {
                        keys: vec![JwksKey {
                            kty: "RSA".to_string(),
                            kid: Some("key1".to_string()),
                            use_: Some("sig".to_string()),
                            alg: Some("RS256".to_string()),
                            n: "test_n".to_string(),
                            e: "AQAB".to_string(),
                        }],
                    },
                    fetched_at: current_timestamp(),
                    ttl: JWKS_CACHE_TTL,
                },
            );
        }

        // The JWKS URI is unreachable; a cache hit must not touch it.
        let http_client = Client::new();
        let jwks = fetch_jwks_cached(&http_client, "dex", "https://dex.invalid/keys", &cache)
            .await
            .unwrap();
        assert_eq!(jwks.keys.len(), 1);
        assert!(jwks.find_key("key1").is_some());
    }

    #[tokio::test]
    async fn test_expired_cache_entry_triggers_fetch() {
        let cache: JwksCache = Arc::new(RwLock::new(HashMap::new()));
        {
            let mut cache_write = cache.write().await;
            cache_write.insert(
                "dex".to_string(),
                JwksCacheEntry {
                    jwks: JwksKeySet { keys: vec![] },
                    fetched_at: 1000,
                    ttl: JWKS_CACHE_TTL,
                },
            );
        }

        // Expired entry plus unreachable URI surfaces the fetch failure.
        let http_client = Client::new();
        let result = fetch_jwks_cached(&http_client, "dex", "http://127.0.0.1:1/keys", &cache).await;
        assert!(matches!(result, Err(OidcError::JwksFetchFailed(_))));
    }
}
