//! Port for slow, salted one-way password hashing.
use async_trait::async_trait;

use crate::domain::{CredentialHash, Password};

use super::define_port_error;

define_port_error! {
    /// Errors raised by credential hasher adapters.
    pub enum CredentialHasherError {
        /// Hashing could not be completed.
        Hashing { message: String } => "credential hashing failed: {message}",
        /// The stored hash could not be parsed.
        MalformedHash { message: String } => "stored credential hash is malformed: {message}",
    }
}

/// Password hashing port.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialHasher: Send + Sync {
    /// Produce a fresh salted hash of `password`.
    async fn hash(&self, password: &Password) -> Result<CredentialHash, CredentialHasherError>;

    /// Check `password` against `hash` in constant time. A mismatch is
    /// `Ok(false)`, not an error.
    async fn verify(
        &self,
        password: &Password,
        hash: &CredentialHash,
    ) -> Result<bool, CredentialHasherError>;
}
