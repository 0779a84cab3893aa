//! Process configuration loaded via OrthoConfig.
//!
//! Values layer as defaults, then an optional config file, then `GYMDESK_*`
//! environment variables, then command-line flags.

pub mod session_key;

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use actix_web::cookie::time::Duration as CookieDuration;
use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

use crate::outbound::persistence::PoolConfig;
use crate::outbound::security::Argon2Settings;

pub use session_key::{BuildMode, SessionKeyError, key_fingerprint, load_session_key};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_SESSION_KEY_FILE: &str = "/var/run/secrets/session_key";
const DEFAULT_SESSION_TTL_HOURS: u32 = 6;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_DB_STATEMENT_TIMEOUT_SECS: u64 = 5;

/// Errors raised while interpreting loaded settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// No database URL was configured.
    #[error("GYMDESK_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    /// The bind address did not parse.
    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    /// A numeric setting was zero.
    #[error("{name} must be greater than zero")]
    Zero { name: &'static str },
}

/// Settings for the gymdesk server process.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "GYMDESK")]
pub struct AppSettings {
    /// PostgreSQL connection string.
    pub database_url: Option<String>,
    /// Socket address the HTTP listener binds to.
    pub bind_addr: Option<String>,
    /// File holding the session cookie key material.
    pub session_key_file: Option<PathBuf>,
    /// Fall back to a random key when the key file is unreadable.
    #[ortho_config(default = false)]
    pub session_allow_ephemeral: bool,
    /// Mark the session cookie `Secure`; on when unset.
    pub cookie_secure: Option<bool>,
    /// Session cookie max-age in hours.
    pub session_ttl_hours: Option<u32>,
    /// Upper bound on pooled database connections.
    pub db_max_connections: Option<u32>,
    /// Per-call database budget in seconds, checkout included.
    pub db_statement_timeout_secs: Option<u64>,
    /// Apply embedded migrations before serving; on when unset.
    pub run_migrations: Option<bool>,
    /// Argon2id memory cost override in KiB.
    pub argon2_memory_kib: Option<u32>,
    /// Argon2id pass count override.
    pub argon2_iterations: Option<u32>,
    /// Argon2id parallelism override.
    pub argon2_parallelism: Option<u32>,
}

impl AppSettings {
    /// Return the configured database URL.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingDatabaseUrl`] when unset or blank.
    pub fn database_url(&self) -> Result<&str, SettingsError> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)
    }

    /// Return the bind address, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidBindAddr`] when the value is not a
    /// socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|source| SettingsError::InvalidBindAddr {
            value: raw.to_owned(),
            source,
        })
    }

    /// Return the session key file path.
    pub fn session_key_file(&self) -> &Path {
        self.session_key_file
            .as_deref()
            .unwrap_or_else(|| Path::new(DEFAULT_SESSION_KEY_FILE))
    }

    /// Whether the session cookie carries the `Secure` attribute.
    #[must_use]
    pub fn cookie_secure(&self) -> bool {
        self.cookie_secure.unwrap_or(true)
    }

    /// Whether embedded migrations run before the server starts.
    #[must_use]
    pub fn run_migrations(&self) -> bool {
        self.run_migrations.unwrap_or(true)
    }

    /// Return the session cookie max-age.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Zero`] for a zero TTL.
    pub fn session_ttl(&self) -> Result<CookieDuration, SettingsError> {
        let hours = self.session_ttl_hours.unwrap_or(DEFAULT_SESSION_TTL_HOURS);
        if hours == 0 {
            return Err(SettingsError::Zero {
                name: "session_ttl_hours",
            });
        }
        Ok(CookieDuration::hours(i64::from(hours)))
    }

    /// Build the pool configuration from the database settings.
    ///
    /// # Errors
    ///
    /// Propagates [`AppSettings::database_url`] failures and rejects a zero
    /// pool size or timeout.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let max_size = self
            .db_max_connections
            .unwrap_or(DEFAULT_DB_MAX_CONNECTIONS);
        if max_size == 0 {
            return Err(SettingsError::Zero {
                name: "db_max_connections",
            });
        }
        let timeout = self
            .db_statement_timeout_secs
            .unwrap_or(DEFAULT_DB_STATEMENT_TIMEOUT_SECS);
        if timeout == 0 {
            return Err(SettingsError::Zero {
                name: "db_statement_timeout_secs",
            });
        }
        Ok(PoolConfig::new(self.database_url()?)
            .with_max_size(max_size)
            .with_statement_timeout(Duration::from_secs(timeout)))
    }

    /// Argon2id costs with any configured overrides applied.
    #[must_use]
    pub fn argon2(&self) -> Argon2Settings {
        let defaults = Argon2Settings::default();
        Argon2Settings {
            memory_kib: self.argon2_memory_kib.unwrap_or(defaults.memory_kib),
            iterations: self.argon2_iterations.unwrap_or(defaults.iterations),
            parallelism: self.argon2_parallelism.unwrap_or(defaults.parallelism),
        }
    }
}
