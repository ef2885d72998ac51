//! Federated login endpoints.
//!
//! Three routes: provider listing, the authorize redirect, and the IdP
//! callback. This layer owns the translation from typed errors to transport:
//! JSON status codes on the authorize path, sanitized `/login?error=`
//! redirects on the callback path. Raw IdP error text is logged, never shown.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use url::Url;

use sprintdeck_identity::{IdentityDirectory, ResolvedLogin};
use sprintdeck_oidc::{OidcError, ProviderClient};

use super::helpers::{found, hash_for_log};
use crate::error::ApiError;
use crate::sessions::SessionTokens;
use crate::state::AppState;

/// Access-token cookie name
const ACCESS_COOKIE: &str = "sd_access";
/// Refresh-token cookie name
const REFRESH_COOKIE: &str = "sd_refresh";

// Sanitized user-facing messages; the only strings the callback path is
// allowed to put in a redirect.
const MSG_SESSION_EXPIRED: &str = "session_expired";
const MSG_TRY_AGAIN: &str = "try_again";
const MSG_AUTH_FAILED: &str = "authentication_failed";

#[derive(Debug, Serialize)]
pub struct ProviderSummary {
    pub slug: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AuthorizeParams {
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

/// GET /auth/oidc/providers
///
/// Enabled providers only; never exposes client credentials.
pub async fn list_providers<C: ProviderClient, D: IdentityDirectory>(
    State(state): State<Arc<AppState<C, D>>>,
) -> Json<Vec<ProviderSummary>> {
    let providers = state
        .registry
        .enabled()
        .into_iter()
        .map(|p| ProviderSummary {
            slug: p.slug.clone(),
            name: p.name.clone(),
        })
        .collect();

    Json(providers)
}

/// GET /auth/oidc/:provider/authorize
pub async fn authorize<C: ProviderClient, D: IdentityDirectory>(
    State(state): State<Arc<AppState<C, D>>>,
    Path(provider): Path<String>,
    Query(params): Query<AuthorizeParams>,
) -> Result<Response, ApiError> {
    let request = state
        .oidc
        .authorize(&provider, params.redirect_uri.as_deref())
        .await?;

    Ok(found(&request.auth_url))
}

/// GET /auth/oidc/:provider/callback
pub async fn callback<C: ProviderClient, D: IdentityDirectory>(
    State(state): State<Arc<AppState<C, D>>>,
    Path(provider): Path<String>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let login_url = state.config.login_url();

    // IdP-reported error short-circuits; no state lookup needed
    if let Some(idp_error) = &params.error {
        warn!(
            provider = %provider,
            idp_error = %idp_error,
            idp_error_description = ?params.error_description,
            "IdP reported an authorization error"
        );
        return found(&format!("{}?error={}", login_url, MSG_AUTH_FAILED));
    }

    let (code, state_token) = match (&params.code, &params.state) {
        (Some(code), Some(state_token)) => (code, state_token),
        _ => {
            warn!(provider = %provider, "Callback missing code or state");
            return found(&format!("{}?error={}", login_url, MSG_AUTH_FAILED));
        }
    };

    let outcome = match state.oidc.callback(&provider, code, state_token).await {
        Ok(outcome) => outcome,
        Err(e) => return login_failure(&login_url, &provider, state_token, &e),
    };

    let resolved = match state.resolver.resolve(&outcome.identity).await {
        Ok(resolved) => resolved,
        Err(e) => {
            error!(provider = %provider, error = %e, "Identity resolution failed");
            return found(&format!("{}?error={}", login_url, MSG_AUTH_FAILED));
        }
    };

    let tokens = match state.token_issuer.issue(&resolved.user).await {
        Ok(tokens) => tokens,
        Err(e) => {
            error!(provider = %provider, error = %e, "Token issuance failed");
            return found(&format!("{}?error={}", login_url, MSG_AUTH_FAILED));
        }
    };

    info!(
        provider = %provider,
        user_id = %resolved.user.id,
        is_new_user = resolved.is_new_user,
        linked_to_existing = resolved.linked_to_existing,
        "Login completed"
    );

    let jar = session_cookie_jar(&tokens, state.config.secure_cookies());
    let destination = post_login_redirect(&outcome.redirect_uri, &resolved, &state.config);

    (jar, found(&destination)).into_response()
}

/// Map a login error to a sanitized redirect, logging at a severity matching
/// how suspicious the failure is.
fn login_failure(login_url: &str, provider: &str, state_token: &str, e: &OidcError) -> Response {
    match e {
        // Cryptographic/claim failures signal a possible attack
        OidcError::NonceMismatch
        | OidcError::InvalidIdToken(_)
        | OidcError::InvalidAlgorithm { .. }
        | OidcError::KeyNotFound { .. } => {
            error!(
                provider = %provider,
                state_hash = %hash_for_log(state_token),
                error = %e,
                "Callback validation failed"
            );
        }
        _ => {
            warn!(
                provider = %provider,
                state_hash = %hash_for_log(state_token),
                error = %e,
                "Callback processing failed"
            );
        }
    }

    let message = match e {
        OidcError::InvalidState | OidcError::StateExpired => MSG_SESSION_EXPIRED,
        OidcError::TokenExchangeFailed(_)
        | OidcError::DiscoveryFailed(_)
        | OidcError::JwksFetchFailed(_)
        | OidcError::StoreUnavailable(_) => MSG_TRY_AGAIN,
        _ => MSG_AUTH_FAILED,
    };

    found(&format!("{}?error={}", login_url, message))
}

fn session_cookie_jar(tokens: &SessionTokens, secure: bool) -> CookieJar {
    let access = Cookie::build((ACCESS_COOKIE, tokens.access_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(tokens.access_ttl as i64))
        .build();

    let refresh = Cookie::build((REFRESH_COOKIE, tokens.refresh_token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(time::Duration::seconds(tokens.refresh_ttl as i64))
        .build();

    CookieJar::new().add(access).add(refresh)
}

/// Build the final browser destination, appending `welcome=true` for
/// first-time users.
///
/// Relative targets resolve against the frontend base. Absolute targets must
/// share the frontend origin; anything else falls back to the default so a
/// crafted authorize link cannot bounce a logged-in browser off-site.
fn post_login_redirect(
    target: &str,
    resolved: &ResolvedLogin,
    config: &crate::config::Config,
) -> String {
    let absolute = if target.starts_with('/') {
        format!(
            "{}{}",
            config.frontend_base_url.trim_end_matches('/'),
            target
        )
    } else {
        target.to_string()
    };

    let mut url = match Url::parse(&absolute) {
        Ok(url) if same_origin(&url, &config.frontend_base_url) => url,
        Ok(url) => {
            warn!(target = %url, "Post-login redirect outside frontend origin, using default");
            return default_destination(resolved, config);
        }
        Err(_) => {
            warn!(target = %target, "Unparseable post-login redirect, using default");
            return default_destination(resolved, config);
        }
    };

    if resolved.is_new_user {
        url.query_pairs_mut().append_pair("welcome", "true");
    }

    url.to_string()
}

fn same_origin(url: &Url, frontend_base_url: &str) -> bool {
    match Url::parse(frontend_base_url) {
        Ok(base) => url.origin() == base.origin(),
        Err(_) => false,
    }
}

fn default_destination(resolved: &ResolvedLogin, config: &crate::config::Config) -> String {
    match Url::parse(&config.default_post_login_url()) {
        Ok(mut url) => {
            if resolved.is_new_user {
                url.query_pairs_mut().append_pair("welcome", "true");
            }
            url.to_string()
        }
        Err(_) => config.default_post_login_url(),
    }
}
