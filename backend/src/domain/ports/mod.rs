//! Domain ports and supporting types for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod basket_repository;
mod credential_hasher;
mod identity_repository;
mod message_repository;
mod session_token_generator;

#[cfg(test)]
pub use basket_repository::MockBasketRepository;
pub use basket_repository::{BasketPersistenceError, BasketRepository};
#[cfg(test)]
pub use credential_hasher::MockCredentialHasher;
pub use credential_hasher::{CredentialHasher, CredentialHasherError};
#[cfg(test)]
pub use identity_repository::MockIdentityRepository;
pub use identity_repository::{IdentityPersistenceError, IdentityRepository};
#[cfg(test)]
pub use message_repository::MockMessageRepository;
pub use message_repository::{MessagePersistenceError, MessageRepository};
#[cfg(test)]
pub use session_token_generator::MockSessionTokenGenerator;
pub use session_token_generator::{SessionTokenGenerator, SessionTokenGeneratorError};
