//! Session cookie key loading and fingerprinting.
//!
//! The key file is read through `cap_std` and fed to `Key::derive_from`. Only
//! debug builds, or deployments that opt in explicitly, may fall back to a
//! random per-process key; such a key logs everyone out on restart.

use std::path::{Path, PathBuf};

use actix_web::cookie::Key;
use cap_std::{ambient_authority, fs::Dir};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tracing::warn;
use zeroize::Zeroize;

/// Minimum key material accepted in release builds.
pub const SESSION_KEY_MIN_LEN: usize = 64;
/// `Key::derive_from` panics below this length.
const DERIVE_MIN_LEN: usize = 32;
const FINGERPRINT_BYTES: usize = 8;

/// Build mode for key validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Keys down to 32 bytes and missing files are tolerated.
    Debug,
    /// Keys must exist and meet [`SESSION_KEY_MIN_LEN`].
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Errors raised while loading the session key.
#[derive(Debug, Error)]
pub enum SessionKeyError {
    /// Reading the key file failed.
    #[error("failed to read session key at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The key file is too short for the build mode.
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    TooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
}

/// Load the session key from `path`.
///
/// # Errors
///
/// Returns [`SessionKeyError::Read`] when the file cannot be read and no
/// ephemeral fallback applies, and [`SessionKeyError::TooShort`] when the
/// file holds fewer than [`SESSION_KEY_MIN_LEN`] bytes (32 in debug builds).
pub fn load_session_key(
    path: &Path,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionKeyError> {
    match read_key_file(path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            let min_len = match mode {
                BuildMode::Release => SESSION_KEY_MIN_LEN,
                BuildMode::Debug => DERIVE_MIN_LEN,
            };
            if length < min_len {
                bytes.zeroize();
                return Err(SessionKeyError::TooShort {
                    path: path.to_path_buf(),
                    length,
                    min_len,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(source) if mode == BuildMode::Debug || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %source,
                "using temporary session key; sessions end on restart"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(SessionKeyError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn read_key_file(path: &Path) -> std::io::Result<Vec<u8>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            "session key path must name a file",
        )
    })?;
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    dir.read(Path::new(file_name))
}

/// Truncated SHA-256 fingerprint of the key's signing half, as 16 hex chars.
///
/// Logged at startup so operators can tell which key is active without
/// exposing it.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use gymdesk::settings::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}
