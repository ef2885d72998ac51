//! Callback processing: state consumption, code exchange, ID token validation.

use tracing::{info, warn};

use super::{state_hash_for_log, OidcLoginService};
use crate::client::ProviderClient;
use crate::errors::{OidcError, Result};
use crate::state::StateStore;
use crate::types::{CallbackOutcome, VerifiedIdentity};

impl<C: ProviderClient, S: StateStore> OidcLoginService<C, S> {
    /// Process the IdP callback for a login attempt.
    ///
    /// The state entry is consumed atomically before any network call, so a
    /// replayed callback URL fails with `InvalidState` regardless of how the
    /// rest of this function goes.
    pub async fn callback(
        &self,
        provider_slug: &str,
        code: &str,
        state: &str,
    ) -> Result<CallbackOutcome> {
        let entry = self.states.take(state).await?;

        if entry.provider_slug != provider_slug {
            warn!(
                expected = %entry.provider_slug,
                got = %provider_slug,
                state_hash = %state_hash_for_log(state),
                "Callback provider does not match login state"
            );
            return Err(OidcError::InvalidState);
        }

        let provider = self.registry.get(provider_slug)?;

        let token_response = self
            .client
            .exchange_code(
                provider,
                code,
                &entry.code_verifier,
                &self.callback_url(provider_slug),
            )
            .await?;

        let raw_id_token = token_response
            .id_token
            .as_deref()
            .ok_or(OidcError::MissingIdToken)?;

        let claims = self.client.validate_id_token(provider, raw_id_token).await?;

        // Nonce comparison happens here, not in the provider client, so no
        // client implementation can skip replay protection.
        if claims.nonce.as_deref() != Some(entry.nonce.as_str()) {
            warn!(
                provider = %provider_slug,
                state_hash = %state_hash_for_log(state),
                "ID token nonce mismatch"
            );
            return Err(OidcError::NonceMismatch);
        }

        let identity = VerifiedIdentity {
            issuer: claims.iss,
            subject: claims.sub,
            email: claims.email,
            email_verified: claims.email_verified.unwrap_or(false),
            display_name: claims.name.or(claims.given_name),
        };

        info!(
            provider = %provider_slug,
            state_hash = %state_hash_for_log(state),
            "Callback validated"
        );

        Ok(CallbackOutcome {
            identity,
            redirect_uri: entry.redirect_uri,
        })
    }
}
