//! Opaque session token proving a prior sign-in.
//!
//! A token is 32 random bytes rendered as 64 lowercase hexadecimal
//! characters. It is stored on the identity row it authenticates and carried
//! by the client inside the private session cookie.

use std::fmt;

/// Number of random bytes backing a token.
pub const SESSION_TOKEN_BYTES: usize = 32;
const SESSION_TOKEN_LEN: usize = SESSION_TOKEN_BYTES * 2;

/// Reasons a raw string is not a well-formed session token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionTokenError {
    /// The value was empty.
    #[error("session token must not be empty")]
    Empty,
    /// The value had the wrong length.
    #[error("session token must be {expected} characters, got {actual}")]
    WrongLength { expected: usize, actual: usize },
    /// The value contained characters outside `[0-9a-f]`.
    #[error("session token must be lowercase hexadecimal")]
    NotHex,
}

/// Validated session token.
///
/// # Examples
/// ```
/// use gymdesk::domain::SessionToken;
///
/// let token = SessionToken::from_bytes([0xab; 32]);
/// assert_eq!(token.as_str().len(), 64);
/// assert_eq!(SessionToken::parse(token.as_str()), Ok(token));
/// ```
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    /// Encode raw random bytes as a token.
    #[must_use]
    pub fn from_bytes(bytes: [u8; SESSION_TOKEN_BYTES]) -> Self {
        Self(hex::encode(bytes))
    }

    /// Validate a token presented by a client or read from storage.
    pub fn parse(raw: &str) -> Result<Self, SessionTokenError> {
        if raw.is_empty() {
            return Err(SessionTokenError::Empty);
        }
        let actual = raw.len();
        if actual != SESSION_TOKEN_LEN {
            return Err(SessionTokenError::WrongLength {
                expected: SESSION_TOKEN_LEN,
                actual,
            });
        }
        if !raw.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')) {
            return Err(SessionTokenError::NotHex);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Token text as stored and transmitted.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const UPPERCASE: &str = "ABCDEF0123456789ABCDEF0123456789ABCDEF0123456789ABCDEF0123456789";
    const NON_HEX: &str = "ghijklmnopqrstuvghijklmnopqrstuvghijklmnopqrstuvghijklmnopqrstuv";

    #[rstest]
    #[case("", SessionTokenError::Empty)]
    #[case("abc", SessionTokenError::WrongLength { expected: 64, actual: 3 })]
    #[case(UPPERCASE, SessionTokenError::NotHex)]
    #[case(NON_HEX, SessionTokenError::NotHex)]
    fn rejects_malformed_tokens(#[case] raw: &str, #[case] expected: SessionTokenError) {
        assert_eq!(SessionToken::parse(raw), Err(expected));
    }

    #[rstest]
    fn from_bytes_produces_lowercase_hex() {
        let token = SessionToken::from_bytes([0xfe; SESSION_TOKEN_BYTES]);
        assert_eq!(token.as_str(), "fe".repeat(SESSION_TOKEN_BYTES));
    }

    #[rstest]
    fn debug_output_hides_the_token() {
        let token = SessionToken::from_bytes([0x11; SESSION_TOKEN_BYTES]);
        assert!(!format!("{token:?}").contains("1111"));
    }
}
