//! Identity resolution for Sprintdeck federated login.
//!
//! Maps a verified external identity (issuer + subject) to a local user,
//! creating or linking accounts as needed. The `(issuer, subject)` pair is
//! the durable key from an external account to a local user; verified-email
//! linking lets password-auth users adopt SSO without duplicate accounts.

pub mod errors;
pub mod memory;
pub mod resolver;
pub mod traits;
pub mod types;


pub use errors::{IdentityError, Result};
pub use memory::MemoryDirectory;
pub use resolver::IdentityResolver;
pub use traits::IdentityDirectory;
pub use types::{NewUser, OidcIdentity, ResolvedLogin, User};
