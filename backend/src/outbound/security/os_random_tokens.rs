//! Session tokens drawn from operating-system randomness.

use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroize;

use crate::domain::ports::{SessionTokenGenerator, SessionTokenGeneratorError};
use crate::domain::{SESSION_TOKEN_BYTES, SessionToken};

/// `SessionTokenGenerator` backed by the OS CSPRNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct OsRandomTokenGenerator;

impl SessionTokenGenerator for OsRandomTokenGenerator {
    fn generate(&self) -> Result<SessionToken, SessionTokenGeneratorError> {
        let mut bytes = [0_u8; SESSION_TOKEN_BYTES];
        OsRng
            .try_fill_bytes(&mut bytes)
            .map_err(|err| SessionTokenGeneratorError::entropy(err.to_string()))?;
        let token = SessionToken::from_bytes(bytes);
        bytes.zeroize();
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn tokens_are_well_formed_and_distinct() {
        let generator = OsRandomTokenGenerator;
        let first = generator.generate().expect("entropy available");
        let second = generator.generate().expect("entropy available");

        assert_eq!(first.as_str().len(), SESSION_TOKEN_BYTES * 2);
        assert!(SessionToken::parse(first.as_str()).is_ok());
        assert_ne!(first, second);
    }
}
