//! Argon2id password hashing.
//!
//! Hashing is CPU-bound, so both operations run on the blocking
//! pool with the caller's trace id carried across.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use async_trait::async_trait;

use crate::domain::ports::{CredentialHasher, CredentialHasherError};
use crate::domain::{CredentialHash, Password, TraceId};

/// Argon2id cost parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argon2Settings {
    /// Memory cost in KiB.
    pub memory_kib: u32,
    /// Number of passes.
    pub iterations: u32,
    /// Degree of parallelism.
    pub parallelism: u32,
}

impl Default for Argon2Settings {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// `CredentialHasher` producing Argon2id PHC strings.
#[derive(Clone)]
pub struct Argon2Hasher {
    argon2: Argon2<'static>,
}

impl Argon2Hasher {
    /// Build a hasher with the given cost parameters.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialHasherError::Hashing`] when the parameters are out
    /// of the ranges Argon2 accepts.
    pub fn new(settings: Argon2Settings) -> Result<Self, CredentialHasherError> {
        let params = Params::new(
            settings.memory_kib,
            settings.iterations,
            settings.parallelism,
            None,
        )
        .map_err(|err| {
            CredentialHasherError::hashing(format!("invalid Argon2id parameters: {err}"))
        })?;
        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }
}

async fn run_blocking<T>(
    work: impl FnOnce() -> Result<T, CredentialHasherError> + Send + 'static,
) -> Result<T, CredentialHasherError>
where
    T: Send + 'static,
{
    let trace_id = TraceId::current();
    tokio::task::spawn_blocking(move || match trace_id {
        Some(id) => TraceId::sync_scope(id, work),
        None => work(),
    })
    .await
    .map_err(|err| CredentialHasherError::hashing(format!("hashing task failed: {err}")))?
}

#[async_trait]
impl CredentialHasher for Argon2Hasher {
    async fn hash(&self, password: &Password) -> Result<CredentialHash, CredentialHasherError> {
        let argon2 = self.argon2.clone();
        let password = password.clone();
        run_blocking(move || {
            let salt = SaltString::generate(&mut OsRng);
            argon2
                .hash_password(password.expose().as_bytes(), &salt)
                .map(|hash| CredentialHash::new(hash.to_string()))
                .map_err(|err| CredentialHasherError::hashing(err.to_string()))
        })
        .await
    }

    async fn verify(
        &self,
        password: &Password,
        hash: &CredentialHash,
    ) -> Result<bool, CredentialHasherError> {
        let argon2 = self.argon2.clone();
        let password = password.clone();
        let encoded = hash.as_str().to_owned();
        run_blocking(move || {
            let parsed = PasswordHash::new(&encoded)
                .map_err(|err| CredentialHasherError::malformed_hash(err.to_string()))?;
            match argon2.verify_password(password.expose().as_bytes(), &parsed) {
                Ok(()) => Ok(true),
                Err(argon2::password_hash::Error::Password) => Ok(false),
                Err(err) => Err(CredentialHasherError::hashing(err.to_string())),
            }
        })
        .await
    }
}
