//! Port abstraction for basket persistence.
use async_trait::async_trait;

use crate::domain::{BasketEntryId, BasketLine, IdentityId, ProductId, Quantity, StepOutcome};

use super::define_port_error;

define_port_error! {
    /// Persistence errors raised by basket repository adapters.
    pub enum BasketPersistenceError {
        /// Repository connection could not be established or timed out.
        Connection { message: String } => "basket repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } => "basket repository query failed: {message}",
        /// The product does not exist or has been withdrawn.
        UnknownProduct => "basket referenced an unknown product",
        /// The existing entry cannot grow any further.
        QuantityLimit => "basket quantity is at its limit",
    }
}

/// Basket store port. Every operation is scoped to the owning customer.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BasketRepository: Send + Sync {
    /// Insert a row with `quantity`, or add exactly one to the existing row
    /// for the same (customer, product) pair. Atomic under concurrency.
    async fn upsert(
        &self,
        customer: IdentityId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<BasketEntryId, BasketPersistenceError>;

    /// Add one to the entry's quantity.
    async fn increment(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<StepOutcome, BasketPersistenceError>;

    /// Subtract one from the entry's quantity unless it sits at one.
    async fn decrement(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<StepOutcome, BasketPersistenceError>;

    /// Remove the entry; returns `false` when nothing matched.
    async fn delete(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<bool, BasketPersistenceError>;

    /// Fetch one entry joined with its product.
    async fn find_for_customer(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<Option<BasketLine>, BasketPersistenceError>;

    /// Every entry of the customer joined with its product, by entry id.
    async fn list_for_customer(
        &self,
        customer: IdentityId,
    ) -> Result<Vec<BasketLine>, BasketPersistenceError>;
}
