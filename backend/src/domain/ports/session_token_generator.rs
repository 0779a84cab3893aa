//! Port producing fresh session tokens.
use crate::domain::SessionToken;

use super::define_port_error;

define_port_error! {
    /// Errors raised when no token could be generated.
    pub enum SessionTokenGeneratorError {
        /// The randomness source failed.
        Entropy { message: String } => "session token entropy unavailable: {message}",
    }
}

/// Source of unpredictable session tokens.
#[cfg_attr(test, mockall::automock)]
pub trait SessionTokenGenerator: Send + Sync {
    /// Produce a new token.
    fn generate(&self) -> Result<SessionToken, SessionTokenGeneratorError>;
}
