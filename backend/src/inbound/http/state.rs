//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on domain services and remain testable without I/O.

use std::sync::Arc;

use crate::domain::ports::{
    BasketRepository, CredentialHasher, IdentityRepository, MessageRepository,
    SessionTokenGenerator,
};
use crate::domain::{AccountService, AnnouncementService, BasketService, SessionAuthenticator};

/// Parameter object bundling the port implementations the services need.
#[derive(Clone)]
pub struct HttpStatePorts {
    pub identities: Arc<dyn IdentityRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub basket: Arc<dyn BasketRepository>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn SessionTokenGenerator>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub sessions: Arc<SessionAuthenticator>,
    pub accounts: Arc<AccountService>,
    pub announcements: Arc<AnnouncementService>,
    pub basket: Arc<BasketService>,
}

impl From<HttpStatePorts> for HttpState {
    fn from(ports: HttpStatePorts) -> Self {
        let HttpStatePorts {
            identities,
            messages,
            basket,
            hasher,
            tokens,
        } = ports;
        Self {
            sessions: Arc::new(SessionAuthenticator::new(
                identities.clone(),
                hasher.clone(),
                tokens,
            )),
            accounts: Arc::new(AccountService::new(identities, hasher)),
            announcements: Arc::new(AnnouncementService::new(messages)),
            basket: Arc::new(BasketService::new(basket)),
        }
    }
}

impl HttpState {
    /// Wire the domain services over the given ports.
    #[must_use]
    pub fn new(ports: HttpStatePorts) -> Self {
        Self::from(ports)
    }

    /// Build state from services that are already wired.
    #[must_use]
    pub fn from_services(
        sessions: Arc<SessionAuthenticator>,
        accounts: Arc<AccountService>,
        announcements: Arc<AnnouncementService>,
        basket: Arc<BasketService>,
    ) -> Self {
        Self {
            sessions,
            accounts,
            announcements,
            basket,
        }
    }
}
