//! Authentication primitives: sign-in credentials and plaintext passwords.
//!
//! Keep inbound payload parsing outside the domain by exposing constructors
//! that validate string inputs before a handler talks to a service.

use std::fmt;

use zeroize::Zeroizing;

use super::identity::{Email, IdentityValidationError};

/// Minimum length accepted when a password is set or changed.
pub const PASSWORD_MIN: usize = 8;

/// Domain error returned when credential payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialValidationError {
    /// Email was missing or malformed.
    InvalidEmail(IdentityValidationError),
    /// Password was blank.
    EmptyPassword,
    /// A new password is shorter than [`PASSWORD_MIN`].
    PasswordTooShort { min: usize },
}

impl fmt::Display for CredentialValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidEmail(inner) => write!(f, "{inner}"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
            Self::PasswordTooShort { min } => {
                write!(f, "password must be at least {min} characters")
            }
        }
    }
}

impl std::error::Error for CredentialValidationError {}

/// Plaintext password held only for the duration of a request.
///
/// The buffer is zeroed on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(Zeroizing<String>);

impl Password {
    /// Accept any non-empty password; used when verifying an existing one.
    ///
    /// Whitespace is retained to avoid surprising credential comparisons.
    pub fn presented(raw: &str) -> Result<Self, CredentialValidationError> {
        if raw.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Accept a password that is about to be hashed and stored.
    pub fn new_secret(raw: &str) -> Result<Self, CredentialValidationError> {
        if raw.is_empty() {
            return Err(CredentialValidationError::EmptyPassword);
        }
        if raw.chars().count() < PASSWORD_MIN {
            return Err(CredentialValidationError::PasswordTooShort { min: PASSWORD_MIN });
        }
        Ok(Self(Zeroizing::new(raw.to_owned())))
    }

    /// Expose the plaintext to a hasher.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(<redacted>)")
    }
}

/// Validated sign-in credentials.
///
/// # Examples
/// ```
/// use gymdesk::domain::SignInCredentials;
///
/// let creds = SignInCredentials::try_from_parts(" Coach@Gym.Example ", "hunter22").unwrap();
/// assert_eq!(creds.email().as_ref(), "coach@gym.example");
/// assert_eq!(creds.password().expose(), "hunter22");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInCredentials {
    email: Email,
    password: Password,
}

impl SignInCredentials {
    /// Construct credentials from raw email/password inputs.
    pub fn try_from_parts(email: &str, password: &str) -> Result<Self, CredentialValidationError> {
        let email = Email::new(email).map_err(CredentialValidationError::InvalidEmail)?;
        let password = Password::presented(password)?;
        Ok(Self { email, password })
    }

    /// Normalised email used for the identity lookup.
    #[must_use]
    pub fn email(&self) -> &Email {
        &self.email
    }

    /// Password supplied by the caller.
    #[must_use]
    pub fn password(&self) -> &Password {
        &self.password
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", CredentialValidationError::InvalidEmail(IdentityValidationError::EmptyEmail))]
    #[case(
        "coach",
        "pw",
        CredentialValidationError::InvalidEmail(IdentityValidationError::MalformedEmail)
    )]
    #[case("coach@gym.example", "", CredentialValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] email: &str,
        #[case] password: &str,
        #[case] expected: CredentialValidationError,
    ) {
        let err = SignInCredentials::try_from_parts(email, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    #[case(" coach@gym.example ", " spaced ")]
    #[case("ADMIN@GYM.EXAMPLE", "x")]
    fn presented_password_is_kept_verbatim(#[case] email: &str, #[case] password: &str) {
        let creds = SignInCredentials::try_from_parts(email, password).expect("valid inputs");
        assert_eq!(creds.email().as_ref(), email.trim().to_lowercase());
        assert_eq!(creds.password().expose(), password);
    }

    #[rstest]
    #[case("short", Err(CredentialValidationError::PasswordTooShort { min: PASSWORD_MIN }))]
    #[case("", Err(CredentialValidationError::EmptyPassword))]
    #[case("long enough", Ok(()))]
    fn new_secret_enforces_length(
        #[case] raw: &str,
        #[case] expected: Result<(), CredentialValidationError>,
    ) {
        assert_eq!(Password::new_secret(raw).map(|_| ()), expected);
    }

    #[rstest]
    fn password_debug_is_redacted() {
        let password = Password::presented("top secret").expect("non-empty");
        assert!(!format!("{password:?}").contains("secret"));
    }
}
