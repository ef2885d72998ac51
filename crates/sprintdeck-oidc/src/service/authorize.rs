//! Authorization request building.

use tracing::info;
use url::Url;

use super::{state_hash_for_log, OidcLoginService};
use crate::client::ProviderClient;
use crate::errors::{OidcError, Result};
use crate::pkce::code_challenge;
use crate::state::StateStore;
use crate::types::AuthorizationRequest;

impl<C: ProviderClient, S: StateStore> OidcLoginService<C, S> {
    /// Build the IdP authorization URL for a login attempt.
    ///
    /// Persists one state entry carrying the PKCE verifier, nonce, and the
    /// caller's post-login destination (falling back to the configured
    /// frontend default when empty).
    pub async fn authorize(
        &self,
        provider_slug: &str,
        redirect_uri: Option<&str>,
    ) -> Result<AuthorizationRequest> {
        let provider = self.registry.get(provider_slug)?;

        let target = match redirect_uri {
            Some(uri) if !uri.is_empty() => uri,
            _ => self.default_redirect.as_str(),
        };

        let (state, entry) = self.states.create(provider_slug, target).await?;
        let challenge = code_challenge(&entry.code_verifier);

        let oidc_config = self.client.discover(provider).await?;

        let mut auth_url = Url::parse(&oidc_config.authorization_endpoint)
            .map_err(|e| OidcError::InvalidAuthUrl(format!("{}", e)))?;

        auth_url
            .query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &provider.client_id)
            .append_pair("redirect_uri", &self.callback_url(provider_slug))
            .append_pair("scope", &provider.scopes.join(" "))
            .append_pair("state", &state)
            .append_pair("code_challenge", &challenge)
            .append_pair("code_challenge_method", "S256")
            .append_pair("nonce", &entry.nonce);

        info!(
            provider = %provider_slug,
            state_hash = %state_hash_for_log(&state),
            "Login initiated"
        );

        Ok(AuthorizationRequest {
            auth_url: auth_url.to_string(),
            state,
            code_verifier: entry.code_verifier,
        })
    }
}
