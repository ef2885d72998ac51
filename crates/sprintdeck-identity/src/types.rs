//! Identity type definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Local user account (the subset the login subsystem touches)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: Uuid,

    /// Unique username
    pub username: String,

    /// Email address
    pub email: Option<String>,

    /// Whether the email has been verified (locally or by a trusted IdP)
    pub email_verified: bool,

    /// Display name
    pub display_name: Option<String>,

    /// Created timestamp (unix seconds)
    pub created_at: u64,
}

/// Input for creating a local user during first SSO login
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique username, already deduplicated by the resolver
    pub username: String,
    /// Email address from the IdP
    pub email: Option<String>,
    /// Whether the IdP marked the email verified
    pub email_verified: bool,
    /// Display name from the IdP
    pub display_name: Option<String>,
}

/// Persisted mapping from an external account to a local user.
///
/// `(issuer, subject)` is globally unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OidcIdentity {
    /// Identity row ID
    pub id: Uuid,

    /// Owning user
    pub user_id: Uuid,

    /// Issuer URL (`iss` claim)
    pub issuer: String,

    /// Provider-scoped user ID (`sub` claim)
    pub subject: String,

    /// Email as last reported by the provider
    pub email: Option<String>,

    /// Whether the provider marked the email verified
    pub email_verified: bool,

    /// Created timestamp (unix seconds)
    pub created_at: u64,

    /// Last updated timestamp (unix seconds)
    pub updated_at: u64,
}

/// Result of resolving a verified identity to a local user
#[derive(Debug, Clone)]
pub struct ResolvedLogin {
    /// The resolved local user
    pub user: User,

    /// A local account was created by this call
    pub is_new_user: bool,

    /// An existing user matched by verified email and gained a new identity row
    pub linked_to_existing: bool,
}
