pub mod api;
pub mod config;
pub mod error;
pub mod sessions;
pub mod state;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

use sprintdeck_identity::IdentityDirectory;
use sprintdeck_oidc::ProviderClient;

use state::AppState;

pub fn create_router<C, D>(state: Arc<AppState<C, D>>) -> Router
where
    C: ProviderClient + 'static,
    D: IdentityDirectory + 'static,
{
    Router::new()
        // Health checks
        .route("/health", get(api::health::health_check))
        // Federated login
        .route("/auth/oidc/providers", get(api::oidc::list_providers))
        .route("/auth/oidc/:provider/authorize", get(api::oidc::authorize))
        .route("/auth/oidc/:provider/callback", get(api::oidc::callback))
        // Add middleware
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
