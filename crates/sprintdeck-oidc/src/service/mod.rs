//! Federated login service: authorization request building and callback
//! processing.

mod authorize;
mod callback;


use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::client::ProviderClient;
use crate::registry::ProviderRegistry;
use crate::state::StateStore;

/// Federated login service.
///
/// Owns the protocol flow between the authorize redirect and the verified
/// identity handed to the resolver. Generic over the provider client and the
/// state store so tests can inject doubles and deployments can swap the state
/// backend.
pub struct OidcLoginService<C: ProviderClient, S: StateStore> {
    pub(super) registry: Arc<ProviderRegistry>,
    pub(super) states: Arc<S>,
    pub(super) client: C,
    /// Base URL of this service; the fixed OIDC redirect_uri is derived from it
    pub(super) callback_base_url: String,
    /// Default post-login destination when the caller supplies none
    pub(super) default_redirect: String,
}

impl<C: ProviderClient, S: StateStore> OidcLoginService<C, S> {
    /// Create a login service.
    pub fn new(
        registry: Arc<ProviderRegistry>,
        states: Arc<S>,
        client: C,
        callback_base_url: impl Into<String>,
        default_redirect: impl Into<String>,
    ) -> Self {
        Self {
            registry,
            states,
            client,
            callback_base_url: callback_base_url.into().trim_end_matches('/').to_string(),
            default_redirect: default_redirect.into(),
        }
    }

    /// The fixed redirect_uri registered with providers for a given slug.
    pub fn callback_url(&self, slug: &str) -> String {
        format!("{}/auth/oidc/{}/callback", self.callback_base_url, slug)
    }
}

/// Short stable fingerprint of a state token, safe to log.
pub(super) fn state_hash_for_log(state: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(state.as_bytes());
    hex::encode(hasher.finalize())[..8].to_string()
}
