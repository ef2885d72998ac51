//! In-memory identity directory.
//!
//! Enforces the same uniqueness the relational schema enforces in production:
//! `(issuer, subject)` on identities and `username` on users. Used by tests
//! and by single-node development deployments without a database.

use std::collections::HashMap;

use async_trait::async_trait;
use sprintdeck_oidc::{current_timestamp, VerifiedIdentity};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::errors::{IdentityError, Result};
use crate::traits::IdentityDirectory;
use crate::types::{NewUser, OidcIdentity, User};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    // Keyed by (issuer, subject), mirroring the unique constraint
    identities: HashMap<(String, String), OidcIdentity>,
}

/// Mutex-guarded in-memory directory.
#[derive(Default)]
pub struct MemoryDirectory {
    tables: Mutex<Tables>,
}

impl MemoryDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a user directly, for tests exercising the linking branch.
    pub async fn insert_user(&self, user: User) {
        self.tables.lock().await.users.insert(user.id, user);
    }

    /// Number of users, for test assertions.
    pub async fn user_count(&self) -> usize {
        self.tables.lock().await.users.len()
    }

    /// Number of identity rows, for test assertions.
    pub async fn identity_count(&self) -> usize {
        self.tables.lock().await.identities.len()
    }

    fn build_identity(user_id: Uuid, identity: &VerifiedIdentity) -> OidcIdentity {
        let now = current_timestamp();
        OidcIdentity {
            id: Uuid::new_v4(),
            user_id,
            issuer: identity.issuer.clone(),
            subject: identity.subject.clone(),
            email: identity.email.clone(),
            email_verified: identity.email_verified,
            created_at: now,
            updated_at: now,
        }
    }
}

#[async_trait]
impl IdentityDirectory for MemoryDirectory {
    async fn find_identity(&self, issuer: &str, subject: &str) -> Result<Option<OidcIdentity>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .identities
            .get(&(issuer.to_string(), subject.to_string()))
            .cloned())
    }

    async fn find_user(&self, user_id: Uuid) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn find_user_by_verified_email(&self, email: &str) -> Result<Option<User>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email_verified && u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn username_taken(&self, username: &str) -> Result<bool> {
        let tables = self.tables.lock().await;
        Ok(tables.users.values().any(|u| u.username == username))
    }

    async fn link_identity(
        &self,
        user_id: Uuid,
        identity: &VerifiedIdentity,
    ) -> Result<OidcIdentity> {
        let mut tables = self.tables.lock().await;

        let key = (identity.issuer.clone(), identity.subject.clone());
        if tables.identities.contains_key(&key) {
            return Err(IdentityError::Conflict(format!(
                "Identity already linked: ({}, {})",
                identity.issuer, identity.subject
            )));
        }
        if !tables.users.contains_key(&user_id) {
            return Err(IdentityError::UserNotFound(user_id));
        }

        let row = Self::build_identity(user_id, identity);
        tables.identities.insert(key, row.clone());
        Ok(row)
    }

    async fn create_user_with_identity(
        &self,
        user: NewUser,
        identity: &VerifiedIdentity,
    ) -> Result<(User, OidcIdentity)> {
        let mut tables = self.tables.lock().await;

        // Both checks happen under the same lock, mirroring a transaction
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(IdentityError::Conflict(format!(
                "Username already taken: {}",
                user.username
            )));
        }
        let key = (identity.issuer.clone(), identity.subject.clone());
        if tables.identities.contains_key(&key) {
            return Err(IdentityError::Conflict(format!(
                "Identity already linked: ({}, {})",
                identity.issuer, identity.subject
            )));
        }

        let new_user = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            email_verified: user.email_verified,
            display_name: user.display_name,
            created_at: current_timestamp(),
        };
        let row = Self::build_identity(new_user.id, identity);

        tables.users.insert(new_user.id, new_user.clone());
        tables.identities.insert(key, row.clone());

        Ok((new_user, row))
    }
}
