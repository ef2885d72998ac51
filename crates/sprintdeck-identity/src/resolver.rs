//! Identity resolver: verified external identity to local user.

use std::sync::Arc;

use sprintdeck_oidc::VerifiedIdentity;
use tracing::{info, warn};

use crate::errors::{IdentityError, Result};
use crate::traits::IdentityDirectory;
use crate::types::{NewUser, ResolvedLogin};

/// Maximum numeric suffix tried when deduplicating a username
const USERNAME_DEDUP_LIMIT: u32 = 1000;

/// Resolves verified identities against the account directory.
pub struct IdentityResolver<D: IdentityDirectory> {
    directory: Arc<D>,
}

impl<D: IdentityDirectory> IdentityResolver<D> {
    /// Create a resolver over a directory.
    pub fn new(directory: Arc<D>) -> Self {
        Self { directory }
    }

    /// Resolve a verified identity to a local user.
    ///
    /// Priority order, first match wins:
    /// 1. existing `(issuer, subject)` row -> its owner
    /// 2. verified email matching an existing user -> link a new identity row
    /// 3. create a fresh user and identity row
    ///
    /// A `Conflict` from either write path means a concurrent login won the
    /// race; the whole algorithm is retried once, at which point branch 1
    /// normally resolves it.
    pub async fn resolve(&self, identity: &VerifiedIdentity) -> Result<ResolvedLogin> {
        match self.resolve_once(identity).await {
            Err(IdentityError::Conflict(detail)) => {
                warn!(
                    issuer = %identity.issuer,
                    detail = %detail,
                    "Identity write lost a race, retrying resolution"
                );
                self.resolve_once(identity).await
            }
            other => other,
        }
    }

    async fn resolve_once(&self, identity: &VerifiedIdentity) -> Result<ResolvedLogin> {
        // 1. Returning SSO user
        if let Some(existing) = self
            .directory
            .find_identity(&identity.issuer, &identity.subject)
            .await?
        {
            let user = self
                .directory
                .find_user(existing.user_id)
                .await?
                .ok_or(IdentityError::UserNotFound(existing.user_id))?;

            return Ok(ResolvedLogin {
                user,
                is_new_user: false,
                linked_to_existing: false,
            });
        }

        // 2. Verified email matching an existing account adopts SSO.
        // Unverified emails fall through to a fresh account: an IdP that lets
        // users claim arbitrary emails must not be able to take over one.
        if identity.email_verified {
            if let Some(email) = &identity.email {
                if let Some(user) = self.directory.find_user_by_verified_email(email).await? {
                    self.directory.link_identity(user.id, identity).await?;
                    info!(
                        user_id = %user.id,
                        issuer = %identity.issuer,
                        "Linked external identity to existing account"
                    );
                    return Ok(ResolvedLogin {
                        user,
                        is_new_user: false,
                        linked_to_existing: true,
                    });
                }
            }
        }

        // 3. First login from a new external account
        let username = self.derive_username(identity).await?;
        let new_user = NewUser {
            username,
            email: identity.email.clone(),
            email_verified: identity.email_verified,
            display_name: identity.display_name.clone(),
        };

        let (user, _) = self
            .directory
            .create_user_with_identity(new_user, identity)
            .await?;

        info!(
            user_id = %user.id,
            username = %user.username,
            issuer = %identity.issuer,
            "Created account for first SSO login"
        );

        Ok(ResolvedLogin {
            user,
            is_new_user: true,
            linked_to_existing: false,
        })
    }

    /// Derive a unique username from the email local-part or the subject.
    async fn derive_username(&self, identity: &VerifiedIdentity) -> Result<String> {
        let base = identity
            .email
            .as_deref()
            .and_then(|email| email.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or(&identity.subject);

        let base = sanitize_username(base);

        if !self.directory.username_taken(&base).await? {
            return Ok(base);
        }

        for suffix in 2..USERNAME_DEDUP_LIMIT {
            let candidate = format!("{}{}", base, suffix);
            if !self.directory.username_taken(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(IdentityError::Conflict(format!(
            "Could not find a free username for base '{}'",
            base
        )))
    }
}

/// Lowercase and restrict to `[a-z0-9_-]`, with a fallback for fully
/// non-representable inputs.
fn sanitize_username(raw: &str) -> String {
    let sanitized: String = raw
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    let trimmed = sanitized.trim_matches('-');
    if trimmed.is_empty() {
        "user".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::sanitize_username;

    #[test]
    fn test_sanitize_username() {
        assert_eq!(sanitize_username("Ada.B"), "ada-b");
        assert_eq!(sanitize_username("a_b-c9"), "a_b-c9");
        assert_eq!(sanitize_username("@@@"), "user");
        assert_eq!(sanitize_username("-edge-"), "edge");
    }
}
