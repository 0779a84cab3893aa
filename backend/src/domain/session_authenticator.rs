//! Session authenticator: issues, validates and revokes session tokens.
//!
//! The token column on the identity row is the only session record. A token
//! is valid exactly while it matches an active identity, so sign-out, a newer
//! sign-in, or deactivation all invalidate it without extra bookkeeping.

use std::sync::Arc;

use tracing::{debug, info};

use super::error_mapping::{map_hasher_error, map_identity_error, map_token_error};
use super::ports::{CredentialHasher, IdentityRepository, SessionTokenGenerator};
use super::{Error, Identity, SessionToken, SignInCredentials};

/// Message returned for every failed sign-in, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "invalid credentials";
/// Message returned when a request carries no valid session.
pub const LOGIN_REQUIRED: &str = "login required";

/// A freshly issued session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: SessionToken,
    pub identity: Identity,
}

/// Domain service gating every protected operation.
#[derive(Clone)]
pub struct SessionAuthenticator {
    identities: Arc<dyn IdentityRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn SessionTokenGenerator>,
}

impl SessionAuthenticator {
    /// Create a new authenticator over the credential store.
    pub fn new(
        identities: Arc<dyn IdentityRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn SessionTokenGenerator>,
    ) -> Self {
        Self {
            identities,
            hasher,
            tokens,
        }
    }

    /// Verify credentials and store a new token on the identity.
    ///
    /// An unknown email and a wrong password produce the same
    /// `unauthorized` error so callers cannot probe for accounts. Concurrent
    /// sign-ins for one identity are last-writer-wins.
    pub async fn issue(&self, credentials: &SignInCredentials) -> Result<IssuedSession, Error> {
        let found = self
            .identities
            .find_active_by_email(credentials.email())
            .await
            .map_err(map_identity_error)?;
        let Some(identity) = found else {
            debug!("sign-in rejected: no active identity for email");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };

        let verified = self
            .hasher
            .verify(credentials.password(), &identity.credential)
            .await
            .map_err(map_hasher_error)?;
        if !verified {
            debug!(identity_id = %identity.id, "sign-in rejected: credential mismatch");
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }

        let token = self.tokens.generate().map_err(map_token_error)?;
        self.identities
            .update_session(identity.id, &token)
            .await
            .map_err(map_identity_error)?;

        info!(identity_id = %identity.id, "session issued");
        Ok(IssuedSession { token, identity })
    }

    /// Resolve the identity holding `raw_token`.
    ///
    /// Empty, malformed and unmatched tokens are all `unauthorized`.
    pub async fn validate(&self, raw_token: &str) -> Result<Identity, Error> {
        let Ok(token) = SessionToken::parse(raw_token) else {
            debug!("session rejected: malformed token");
            return Err(Error::unauthorized(LOGIN_REQUIRED));
        };
        self.identities
            .find_active_by_token(&token)
            .await
            .map_err(map_identity_error)?
            .ok_or_else(|| Error::unauthorized(LOGIN_REQUIRED))
    }

    /// Clear `token` from the credential store. Idempotent.
    pub async fn revoke(&self, token: &SessionToken) -> Result<(), Error> {
        self.identities
            .clear_session(token)
            .await
            .map_err(map_identity_error)?;
        info!("session revoked");
        Ok(())
    }
}

#[cfg(test)]
#[path = "session_authenticator_tests.rs"]
mod tests;
