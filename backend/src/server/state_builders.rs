//! Wiring of the Diesel and security adapters into HTTP state.

use std::sync::Arc;

use actix_web::web;

use gymdesk::domain::ports::CredentialHasherError;
use gymdesk::inbound::http::state::{HttpState, HttpStatePorts};
use gymdesk::outbound::persistence::{
    DieselBasketRepository, DieselIdentityRepository, DieselMessageRepository,
};
use gymdesk::outbound::security::{Argon2Hasher, OsRandomTokenGenerator};

use super::ServerConfig;

/// Build the shared handler state over the configured pool.
///
/// # Errors
///
/// Returns [`CredentialHasherError`] when the Argon2id parameters are
/// rejected.
pub(super) fn build_http_state(
    config: &ServerConfig,
) -> Result<web::Data<HttpState>, CredentialHasherError> {
    let pool = &config.db_pool;
    let ports = HttpStatePorts {
        identities: Arc::new(DieselIdentityRepository::new(pool.clone())),
        messages: Arc::new(DieselMessageRepository::new(pool.clone())),
        basket: Arc::new(DieselBasketRepository::new(pool.clone())),
        hasher: Arc::new(Argon2Hasher::new(config.argon2)?),
        tokens: Arc::new(OsRandomTokenGenerator),
    };
    Ok(web::Data::new(HttpState::new(ports)))
}
