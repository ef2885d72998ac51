use std::sync::Arc;

use sprintdeck_identity::{IdentityDirectory, IdentityResolver, MemoryDirectory};
use sprintdeck_oidc::{
    HttpProviderClient, MemoryStateStore, OidcLoginService, ProviderClient, ProviderRegistry,
};

use crate::config::Config;
use crate::sessions::{JwtTokenIssuer, TokenIssuer};

/// Application state shared across all handlers
pub struct AppState<C: ProviderClient, D: IdentityDirectory> {
    pub config: Config,
    pub registry: Arc<ProviderRegistry>,
    pub states: Arc<MemoryStateStore>,
    pub oidc: OidcLoginService<C, MemoryStateStore>,
    pub resolver: IdentityResolver<D>,
    pub token_issuer: Arc<dyn TokenIssuer>,
}

impl AppState<HttpProviderClient, MemoryDirectory> {
    /// Wire the default production components.
    pub fn new(config: Config) -> Self {
        let token_issuer = Arc::new(JwtTokenIssuer::new(
            config.session_signing_key.clone(),
            config.public_base_url.clone(),
            "sprintdeck-api",
            config.access_token_expiry,
            config.refresh_token_expiry,
        ));

        Self::with_components(
            config,
            HttpProviderClient::new(),
            Arc::new(MemoryDirectory::new()),
            token_issuer,
        )
    }
}

impl<C: ProviderClient, D: IdentityDirectory> AppState<C, D> {
    /// Wire explicit components; tests inject doubles here.
    pub fn with_components(
        config: Config,
        client: C,
        directory: Arc<D>,
        token_issuer: Arc<dyn TokenIssuer>,
    ) -> Self {
        let registry = Arc::new(ProviderRegistry::new(config.providers.clone()));
        let states = Arc::new(MemoryStateStore::new(config.state_ttl_minutes * 60));

        let oidc = OidcLoginService::new(
            Arc::clone(&registry),
            Arc::clone(&states),
            client,
            config.public_base_url.clone(),
            config.default_post_login_url(),
        );

        Self {
            config,
            registry,
            states,
            oidc,
            resolver: IdentityResolver::new(directory),
            token_issuer,
        }
    }
}
