//! Short-lived, single-use login state.
//!
//! Every login attempt persists one `StateEntry` keyed by the opaque `state`
//! token. The callback path consumes the entry atomically so an intercepted
//! callback URL can be replayed at most zero times after the legitimate
//! request wins.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::current_timestamp;
use crate::errors::{OidcError, Result};
use crate::pkce::{generate_code_verifier, generate_nonce, generate_state_token};
use crate::types::StateEntry;

/// Server-side login state store.
///
/// Implementations must support safe concurrent access; `take` must be atomic
/// so a given token satisfies at most one callback even when two requests
/// present it simultaneously. Multi-instance deployments back this with a
/// shared TTL-capable store instead of process memory.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Create and persist a fresh state entry.
    ///
    /// Generates the state token, PKCE verifier, and nonce. Returns the token
    /// to embed in the authorization URL along with the stored entry.
    async fn create(&self, provider_slug: &str, redirect_uri: &str)
        -> Result<(String, StateEntry)>;

    /// Look up an entry without consuming it.
    ///
    /// `InvalidState` for unknown or already consumed tokens, `StateExpired`
    /// for entries past their TTL even if not yet swept.
    async fn get(&self, token: &str) -> Result<StateEntry>;

    /// Remove an entry. Idempotent.
    async fn delete(&self, token: &str) -> Result<()>;

    /// Atomically look up and remove an entry (single-use consumption).
    async fn take(&self, token: &str) -> Result<StateEntry>;
}

/// In-memory state store guarded by a mutex.
///
/// The lock is held only for map operations, never across network I/O.
pub struct MemoryStateStore {
    entries: Mutex<HashMap<String, StateEntry>>,
    ttl_seconds: u64,
}

impl MemoryStateStore {
    /// Create a store whose entries expire after `ttl_seconds`.
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_seconds,
        }
    }

    /// Drop entries past their expiry.
    ///
    /// Reclaims memory from abandoned logins; correctness does not depend on
    /// this running since lookups check expiry themselves.
    pub async fn sweep_expired(&self) -> usize {
        let now = current_timestamp();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        let swept = before - entries.len();
        if swept > 0 {
            debug!(swept, "Swept expired login states");
        }
        swept
    }

    fn check_expiry(entry: StateEntry) -> Result<StateEntry> {
        if current_timestamp() >= entry.expires_at {
            return Err(OidcError::StateExpired);
        }
        Ok(entry)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn create(
        &self,
        provider_slug: &str,
        redirect_uri: &str,
    ) -> Result<(String, StateEntry)> {
        let token = generate_state_token();
        let now = current_timestamp();
        let entry = StateEntry {
            provider_slug: provider_slug.to_string(),
            redirect_uri: redirect_uri.to_string(),
            code_verifier: generate_code_verifier(),
            nonce: generate_nonce(),
            created_at: now,
            expires_at: now + self.ttl_seconds,
        };

        let mut entries = self.entries.lock().await;
        entries.insert(token.clone(), entry.clone());

        Ok((token, entry))
    }

    async fn get(&self, token: &str) -> Result<StateEntry> {
        let mut entries = self.entries.lock().await;
        let entry = entries.get(token).cloned().ok_or(OidcError::InvalidState)?;

        if current_timestamp() >= entry.expires_at {
            // Expired entries are dead either way, reclaim on lookup
            entries.remove(token);
            return Err(OidcError::StateExpired);
        }

        Ok(entry)
    }

    async fn delete(&self, token: &str) -> Result<()> {
        self.entries.lock().await.remove(token);
        Ok(())
    }

    async fn take(&self, token: &str) -> Result<StateEntry> {
        let entry = {
            let mut entries = self.entries.lock().await;
            entries.remove(token).ok_or(OidcError::InvalidState)?
        };

        Self::check_expiry(entry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_round_trip() {
        let store = MemoryStateStore::new(600);
        let (token, created) = store.create("dex", "http://localhost:4321").await.unwrap();

        let entry = store.get(&token).await.unwrap();
        assert_eq!(entry.provider_slug, "dex");
        assert_eq!(entry.redirect_uri, "http://localhost:4321");
        assert_eq!(entry.code_verifier, created.code_verifier);
        assert_eq!(entry.nonce, created.nonce);
    }

    #[tokio::test]
    async fn test_single_use() {
        let store = MemoryStateStore::new(600);
        let (token, _) = store.create("dex", "/").await.unwrap();

        store.take(&token).await.unwrap();
        assert!(matches!(
            store.take(&token).await,
            Err(OidcError::InvalidState)
        ));
        assert!(matches!(
            store.get(&token).await,
            Err(OidcError::InvalidState)
        ));
    }

    #[tokio::test]
    async fn test_delete_idempotent() {
        let store = MemoryStateStore::new(600);
        let (token, _) = store.create("dex", "/").await.unwrap();

        store.delete(&token).await.unwrap();
        store.delete(&token).await.unwrap();
        store.delete("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_zero_ttl_expires_immediately() {
        let store = MemoryStateStore::new(0);
        let (token, _) = store.create("dex", "/").await.unwrap();

        assert!(matches!(
            store.get(&token).await,
            Err(OidcError::StateExpired)
        ));
    }

    #[tokio::test]
    async fn test_expired_take_reports_expiry() {
        let store = MemoryStateStore::new(0);
        let (token, _) = store.create("dex", "/").await.unwrap();

        assert!(matches!(
            store.take(&token).await,
            Err(OidcError::StateExpired)
        ));
    }

    #[tokio::test]
    async fn test_unknown_token_is_invalid() {
        let store = MemoryStateStore::new(600);
        assert!(matches!(
            store.get("unknown").await,
            Err(OidcError::InvalidState)
        ));
    }

    #[tokio::test]
    async fn test_sweep_reclaims_expired_entries() {
        let store = MemoryStateStore::new(0);
        store.create("dex", "/").await.unwrap();
        store.create("dex", "/").await.unwrap();

        assert_eq!(store.sweep_expired().await, 2);
        assert_eq!(store.sweep_expired().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_take_has_one_winner() {
        let store = Arc::new(MemoryStateStore::new(600));
        let (token, _) = store.create("dex", "/").await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let token = token.clone();
            handles.push(tokio::spawn(async move { store.take(&token).await.is_ok() }));
        }

        let mut winners = 0;
        for handle in handles {
            if handle.await.unwrap() {
                winners += 1;
            }
        }
        assert_eq!(winners, 1);
    }
}
