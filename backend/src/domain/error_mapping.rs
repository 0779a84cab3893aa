//! Shared mapping from port failures to transport-agnostic domain errors.
//!
//! Connection failures (including store timeouts) are retryable and surface
//! as `service_unavailable`; query failures are unexpected and surface as
//! `internal_error`, whose message adapters redact.

use tracing::{error, warn};

use super::Error;
use super::ports::{
    BasketPersistenceError, CredentialHasherError, IdentityPersistenceError,
    MessagePersistenceError, SessionTokenGeneratorError,
};

pub(crate) const QUANTITY_LIMIT: &str = "basket quantity cannot grow any further";

pub(crate) fn map_identity_error(err: IdentityPersistenceError) -> Error {
    match err {
        IdentityPersistenceError::Connection { message } => {
            warn!(%message, "identity store unavailable");
            Error::service_unavailable("identity store unavailable")
        }
        IdentityPersistenceError::Query { message } => {
            error!(%message, "identity store query failed");
            Error::internal(message)
        }
        IdentityPersistenceError::DuplicateEmail { .. } => {
            Error::conflict("an active account already uses this email")
        }
    }
}

pub(crate) fn map_message_error(err: MessagePersistenceError) -> Error {
    match err {
        MessagePersistenceError::Connection { message } => {
            warn!(%message, "message store unavailable");
            Error::service_unavailable("message store unavailable")
        }
        MessagePersistenceError::Query { message } => {
            error!(%message, "message store query failed");
            Error::internal(message)
        }
        MessagePersistenceError::UnknownRecipient => Error::not_found("recipient not found"),
    }
}

pub(crate) fn map_basket_error(err: BasketPersistenceError) -> Error {
    match err {
        BasketPersistenceError::Connection { message } => {
            warn!(%message, "basket store unavailable");
            Error::service_unavailable("basket store unavailable")
        }
        BasketPersistenceError::Query { message } => {
            error!(%message, "basket store query failed");
            Error::internal(message)
        }
        BasketPersistenceError::UnknownProduct => Error::not_found("product not found"),
        BasketPersistenceError::QuantityLimit => Error::conflict(QUANTITY_LIMIT),
    }
}

pub(crate) fn map_hasher_error(err: CredentialHasherError) -> Error {
    error!(error = %err, "credential hasher failed");
    Error::internal(err.to_string())
}

pub(crate) fn map_token_error(err: SessionTokenGeneratorError) -> Error {
    error!(error = %err, "session token generation failed");
    Error::internal(err.to_string())
}
