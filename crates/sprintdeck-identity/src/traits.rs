//! Identity directory trait definitions.

use async_trait::async_trait;
use sprintdeck_oidc::VerifiedIdentity;
use uuid::Uuid;

use crate::errors::Result;
use crate::types::{NewUser, OidcIdentity, User};

/// Transactional seam to the application's account storage.
///
/// The relational repositories implement this against the `users` and
/// `oidc_identities` tables; `MemoryDirectory` implements it in process for
/// tests and single-node development. The two write operations must be
/// atomic and must surface uniqueness violations as
/// `IdentityError::Conflict` so concurrent duplicate logins can be retried
/// as lookups instead of failing the request.
#[async_trait]
pub trait IdentityDirectory: Send + Sync {
    /// Look up an identity row by `(issuer, subject)`.
    async fn find_identity(&self, issuer: &str, subject: &str) -> Result<Option<OidcIdentity>>;

    /// Look up a user by ID.
    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Look up a user whose email matches and is locally verified.
    ///
    /// Used only for the verified-email linking branch; unverified emails
    /// must never match here.
    async fn find_user_by_verified_email(&self, email: &str) -> Result<Option<User>>;

    /// Whether a username is already taken.
    async fn username_taken(&self, username: &str) -> Result<bool>;

    /// Attach a new identity row to an existing user. Atomic.
    ///
    /// Refreshes the stored email/verified flag from the identity and bumps
    /// `updated_at`. Fails with `Conflict` if `(issuer, subject)` already
    /// exists.
    async fn link_identity(
        &self,
        user_id: Uuid,
        identity: &VerifiedIdentity,
    ) -> Result<OidcIdentity>;

    /// Create a user and its first identity row in one transaction.
    ///
    /// Fails with `Conflict` on any uniqueness violation (username or
    /// `(issuer, subject)`); a crash cannot leave one without the other.
    async fn create_user_with_identity(
        &self,
        user: NewUser,
        identity: &VerifiedIdentity,
    ) -> Result<(User, OidcIdentity)>;
}
