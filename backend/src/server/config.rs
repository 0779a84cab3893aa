//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use actix_web::cookie::Key;
use actix_web::cookie::time::Duration;
use gymdesk::outbound::persistence::DbPool;
use gymdesk::outbound::security::Argon2Settings;

/// Everything `create_server` needs, resolved from [`gymdesk::settings::AppSettings`].
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) session_ttl: Duration,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) db_pool: DbPool,
    pub(crate) argon2: Argon2Settings,
}

impl ServerConfig {
    /// Construct a server configuration around a ready pool.
    #[must_use]
    pub fn new(key: Key, bind_addr: SocketAddr, db_pool: DbPool) -> Self {
        Self {
            key,
            cookie_secure: true,
            session_ttl: Duration::hours(6),
            bind_addr,
            db_pool,
            argon2: Argon2Settings::default(),
        }
    }

    /// Control the `Secure` flag on the session cookie.
    #[must_use]
    pub fn with_cookie_secure(mut self, cookie_secure: bool) -> Self {
        self.cookie_secure = cookie_secure;
        self
    }

    /// Set the session cookie max-age.
    #[must_use]
    pub fn with_session_ttl(mut self, session_ttl: Duration) -> Self {
        self.session_ttl = session_ttl;
        self
    }

    /// Override the Argon2id cost parameters.
    #[must_use]
    pub fn with_argon2(mut self, argon2: Argon2Settings) -> Self {
        self.argon2 = argon2;
        self
    }
}
