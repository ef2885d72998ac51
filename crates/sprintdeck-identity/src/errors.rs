//! Identity resolution error types.

use thiserror::Error;
use uuid::Uuid;

/// Identity resolution errors
#[derive(Debug, Error)]
pub enum IdentityError {
    /// A uniqueness constraint was violated, normally a concurrent duplicate
    /// login racing the same create/link. Callers retry the lookup.
    #[error("Uniqueness conflict: {0}")]
    Conflict(String),

    /// An identity row points at a user that does not exist
    #[error("User not found: {0}")]
    UserNotFound(Uuid),

    /// Backing store failure
    #[error("Storage error: {0}")]
    Storage(String),
}

/// Result type for identity operations
pub type Result<T> = std::result::Result<T, IdentityError>;
