//! Credential hashing and session token generation adapters.

mod argon2_hasher;
mod os_random_tokens;

pub use argon2_hasher::{Argon2Hasher, Argon2Settings};
pub use os_random_tokens::OsRandomTokenGenerator;
