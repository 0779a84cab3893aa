//! Identity data model: staff and admin accounts of the back office.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Validation errors returned by the identity value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityValidationError {
    NonPositiveId,
    EmptyEmail,
    MalformedEmail,
    EmailTooLong { max: usize },
    EmptyName,
    NameTooLong { max: usize },
    UnknownPermission { raw: i16 },
}

impl fmt::Display for IdentityValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveId => write!(f, "identity id must be positive"),
            Self::EmptyEmail => write!(f, "email must not be empty"),
            Self::MalformedEmail => write!(f, "email must contain a local part and a domain"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::EmptyName => write!(f, "name must not be empty"),
            Self::NameTooLong { max } => write!(f, "name must be at most {max} characters"),
            Self::UnknownPermission { raw } => write!(f, "unknown permission level {raw}"),
        }
    }
}

impl std::error::Error for IdentityValidationError {}

/// Database identifier of an identity row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct IdentityId(i64);

impl IdentityId {
    /// Validate and construct an identifier.
    pub fn new(raw: i64) -> Result<Self, IdentityValidationError> {
        if raw <= 0 {
            return Err(IdentityValidationError::NonPositiveId);
        }
        Ok(Self(raw))
    }

    /// Raw column value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for IdentityId {
    type Error = IdentityValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdentityId> for i64 {
    fn from(value: IdentityId) -> Self {
        value.0
    }
}

impl fmt::Display for IdentityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Maximum accepted email length.
pub const EMAIL_MAX: usize = 254;
/// Maximum accepted name length.
pub const NAME_MAX: usize = 100;

/// Normalised email address used as the sign-in handle.
///
/// Emails are trimmed and lower-cased so lookups are case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Email(String);

impl Email {
    /// Validate and construct an [`Email`].
    ///
    /// # Examples
    /// ```
    /// use gymdesk::domain::Email;
    ///
    /// let email = Email::new("  Coach@Gym.Example ").expect("valid email");
    /// assert_eq!(email.as_ref(), "coach@gym.example");
    /// ```
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        let normalised = raw.as_ref().trim().to_lowercase();
        if normalised.is_empty() {
            return Err(IdentityValidationError::EmptyEmail);
        }
        if normalised.chars().count() > EMAIL_MAX {
            return Err(IdentityValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        match normalised.split_once('@') {
            Some((local, domain))
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !normalised.chars().any(char::is_whitespace) =>
            {
                Ok(Self(normalised))
            }
            _ => Err(IdentityValidationError::MalformedEmail),
        }
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Email {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Email> for String {
    fn from(value: Email) -> Self {
        value.0
    }
}

/// Human readable name of an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdentityName(String);

impl IdentityName {
    /// Validate and construct a name; surrounding whitespace is trimmed.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, IdentityValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(IdentityValidationError::EmptyName);
        }
        if trimmed.chars().count() > NAME_MAX {
            return Err(IdentityValidationError::NameTooLong { max: NAME_MAX });
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for IdentityName {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl TryFrom<String> for IdentityName {
    type Error = IdentityValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdentityName> for String {
    fn from(value: IdentityName) -> Self {
        value.0
    }
}

/// Permission level attached to an identity.
///
/// Persisted as a small integer: `0` for standard staff, `1` for admins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionLevel {
    /// Regular staff member.
    Standard,
    /// Back office administrator.
    Admin,
}

impl PermissionLevel {
    /// Column value stored in the `permission` column.
    #[must_use]
    pub fn as_i16(self) -> i16 {
        match self {
            Self::Standard => 0,
            Self::Admin => 1,
        }
    }

    /// Decode the stored column value.
    pub fn from_i16(raw: i16) -> Result<Self, IdentityValidationError> {
        match raw {
            0 => Ok(Self::Standard),
            1 => Ok(Self::Admin),
            other => Err(IdentityValidationError::UnknownPermission { raw: other }),
        }
    }
}

/// Salted one-way hash of a password in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct CredentialHash(String);

impl CredentialHash {
    /// Wrap an encoded hash read from storage or produced by a hasher.
    pub fn new(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    /// Encoded PHC string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for CredentialHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CredentialHash(<redacted>)")
    }
}

/// Active identity as seen by the domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub email: Email,
    pub name: IdentityName,
    pub permission: PermissionLevel,
    pub last_login: Option<DateTime<Utc>>,
    pub credential: CredentialHash,
}

impl Identity {
    /// Whether the identity holds the admin permission level.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        matches!(self.permission, PermissionLevel::Admin)
    }
}

/// Values required to create a new identity row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity {
    pub email: Email,
    pub name: IdentityName,
    pub permission: PermissionLevel,
    pub credential: CredentialHash,
}
