//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! The persistence layer follows these principles:
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Transactional writes**: Multi-statement operations run inside
//!   `AsyncConnection::transaction`, committing only on the success path.
//! - **Bounded calls**: Each operation, checkout included, is limited by
//!   `PoolConfig::with_statement_timeout`; expiry is a connection error.
//!
//! # Example
//!
//! ```ignore
//! use gymdesk::outbound::persistence::{DbPool, PoolConfig, DieselIdentityRepository};
//!
//! let config = PoolConfig::new("postgres://localhost/gymdesk");
//! let pool = DbPool::new(config).await?;
//! let repo = DieselIdentityRepository::new(pool);
//! ```

mod diesel_basket_repository;
pub(crate) mod diesel_helpers;
mod diesel_identity_repository;
mod diesel_message_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_basket_repository::DieselBasketRepository;
pub use diesel_identity_repository::DieselIdentityRepository;
pub use diesel_message_repository::DieselMessageRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
