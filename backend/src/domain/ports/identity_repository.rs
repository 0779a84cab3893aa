//! Port abstraction for the credential store: identity rows and the session
//! tokens attached to them.
use async_trait::async_trait;

use crate::domain::{CredentialHash, Email, Identity, IdentityId, NewIdentity, SessionToken};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by identity repository adapters.
    pub enum IdentityPersistenceError {
        /// Repository connection could not be established or timed out.
        Connection { message: String } => "identity repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "identity repository query failed: {message}",
        /// Another active identity already uses the email.
        DuplicateEmail { email: String } => "an active identity already uses {email}",
    }
}

/// Credential store port.
///
/// "Active" means the row has not been soft-deleted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityRepository: Send + Sync {
    /// Fetch the active identity with the given email.
    async fn find_active_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Identity>, IdentityPersistenceError>;

    /// Fetch the active identity currently holding `token`.
    async fn find_active_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Identity>, IdentityPersistenceError>;

    /// Store `token` on the identity and stamp `last_login` with the store
    /// clock, as one row update. Any previous token stops matching.
    async fn update_session(
        &self,
        id: IdentityId,
        token: &SessionToken,
    ) -> Result<(), IdentityPersistenceError>;

    /// Clear `token` from whichever identity holds it. Matching nothing is
    /// not an error.
    async fn clear_session(&self, token: &SessionToken) -> Result<(), IdentityPersistenceError>;

    /// Insert a new identity and return its id.
    async fn create(&self, identity: &NewIdentity) -> Result<IdentityId, IdentityPersistenceError>;

    /// Replace the credential hash; returns `false` when no active row matched.
    async fn update_password_hash(
        &self,
        id: IdentityId,
        credential: &CredentialHash,
    ) -> Result<bool, IdentityPersistenceError>;

    /// Soft-delete the identity and clear its session token; returns `false`
    /// when no active row matched.
    async fn soft_delete(&self, id: IdentityId) -> Result<bool, IdentityPersistenceError>;
}
