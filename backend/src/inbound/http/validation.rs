//! Shared validation helpers for inbound HTTP adapters.
//!
//! Payload values are parsed into domain types before a service is called;
//! failures become `invalid_request` errors whose details name the offending
//! JSON field and a stable machine-readable code.

use serde_json::json;

use crate::domain::{CredentialValidationError, Error, IdentityValidationError};

/// Validation error codes for HTTP request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorCode {
    InvalidEmail,
    InvalidName,
    EmptyPassword,
    PasswordTooShort,
    InvalidValue,
}

impl ErrorCode {
    fn as_str(self) -> &'static str {
        match self {
            ErrorCode::InvalidEmail => "invalid_email",
            ErrorCode::InvalidName => "invalid_name",
            ErrorCode::EmptyPassword => "empty_password",
            ErrorCode::PasswordTooShort => "password_too_short",
            ErrorCode::InvalidValue => "invalid_value",
        }
    }
}

/// Newtype wrapper for HTTP field names to provide type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldName(&'static str);

impl FieldName {
    pub(crate) const fn new(name: &'static str) -> Self {
        Self(name)
    }

    fn as_str(self) -> &'static str {
        self.0
    }
}

pub(crate) fn field_error(field: FieldName, code: ErrorCode, message: impl Into<String>) -> Error {
    Error::invalid_request(message).with_details(json!({
        "field": field.as_str(),
        "code": code.as_str(),
    }))
}

/// Map a credential problem onto `field`; email problems always name `email`.
pub(crate) fn credential_error(field: FieldName, err: &CredentialValidationError) -> Error {
    match err {
        CredentialValidationError::InvalidEmail(inner) => email_error(inner),
        CredentialValidationError::EmptyPassword => {
            field_error(field, ErrorCode::EmptyPassword, err.to_string())
        }
        CredentialValidationError::PasswordTooShort { .. } => {
            field_error(field, ErrorCode::PasswordTooShort, err.to_string())
        }
    }
}

pub(crate) fn email_error(err: &IdentityValidationError) -> Error {
    field_error(FieldName::new("email"), ErrorCode::InvalidEmail, err.to_string())
}

pub(crate) fn name_error(err: &IdentityValidationError) -> Error {
    field_error(FieldName::new("name"), ErrorCode::InvalidName, err.to_string())
}

pub(crate) fn invalid_value(field: FieldName, message: impl Into<String>) -> Error {
    field_error(field, ErrorCode::InvalidValue, message)
}
