//! Basket upsert engine.
//!
//! Every operation is scoped to the signed-in customer. An entry owned by
//! someone else is indistinguishable from a missing one.

use std::sync::Arc;

use tracing::{debug, info};

use super::error_mapping::{QUANTITY_LIMIT, map_basket_error};
use super::ports::BasketRepository;
use super::{BasketEntryId, BasketLine, Error, Identity, ProductId, Quantity, StepOutcome};

const ENTRY_NOT_FOUND: &str = "basket entry not found";
const AT_MINIMUM: &str = "basket quantity cannot drop below one";

/// Domain service maintaining one quantity row per (customer, product).
#[derive(Clone)]
pub struct BasketService {
    entries: Arc<dyn BasketRepository>,
}

impl BasketService {
    /// Create a new service over the basket store.
    pub fn new(entries: Arc<dyn BasketRepository>) -> Self {
        Self { entries }
    }

    /// Add `quantity` of a product, or bump an existing entry by one.
    ///
    /// The requested quantity only applies when the pair is new; a repeat add
    /// increments by exactly one.
    pub async fn add_to_basket(
        &self,
        customer: &Identity,
        product_id: i64,
        quantity: i64,
    ) -> Result<BasketEntryId, Error> {
        let product =
            ProductId::new(product_id).map_err(|err| Error::invalid_request(err.to_string()))?;
        let quantity =
            Quantity::new(quantity).map_err(|err| Error::invalid_request(err.to_string()))?;
        let entry = self
            .entries
            .upsert(customer.id, product, quantity)
            .await
            .map_err(map_basket_error)?;
        info!(
            customer_id = %customer.id,
            product_id,
            entry_id = %entry,
            "basket entry upserted"
        );
        Ok(entry)
    }

    /// Add one to an entry.
    pub async fn increment(&self, customer: &Identity, entry_id: i64) -> Result<(), Error> {
        let entry = entry(entry_id)?;
        let outcome = self
            .entries
            .increment(customer.id, entry)
            .await
            .map_err(map_basket_error)?;
        step_result(outcome)?;
        debug!(customer_id = %customer.id, entry_id = %entry, "basket entry incremented");
        Ok(())
    }

    /// Remove one from an entry. An entry at one is left alone and reported
    /// as a conflict; removing it needs [`BasketService::delete`].
    pub async fn decrement(&self, customer: &Identity, entry_id: i64) -> Result<(), Error> {
        let entry = entry(entry_id)?;
        let outcome = self
            .entries
            .decrement(customer.id, entry)
            .await
            .map_err(map_basket_error)?;
        step_result(outcome)?;
        debug!(customer_id = %customer.id, entry_id = %entry, "basket entry decremented");
        Ok(())
    }

    /// Remove an entry.
    pub async fn delete(&self, customer: &Identity, entry_id: i64) -> Result<(), Error> {
        let entry = entry(entry_id)?;
        let removed = self
            .entries
            .delete(customer.id, entry)
            .await
            .map_err(map_basket_error)?;
        if !removed {
            return Err(Error::not_found(ENTRY_NOT_FOUND));
        }
        info!(customer_id = %customer.id, entry_id = %entry, "basket entry removed");
        Ok(())
    }

    /// One entry joined with its product.
    pub async fn get(&self, customer: &Identity, entry_id: i64) -> Result<BasketLine, Error> {
        let entry = entry(entry_id)?;
        self.entries
            .find_for_customer(customer.id, entry)
            .await
            .map_err(map_basket_error)?
            .ok_or_else(|| Error::not_found(ENTRY_NOT_FOUND))
    }

    /// Every entry of the customer joined with product data.
    pub async fn list(&self, customer: &Identity) -> Result<Vec<BasketLine>, Error> {
        self.entries
            .list_for_customer(customer.id)
            .await
            .map_err(map_basket_error)
    }
}

// Non-positive ids can never match a row.
fn entry(raw: i64) -> Result<BasketEntryId, Error> {
    BasketEntryId::new(raw).map_err(|_| Error::not_found(ENTRY_NOT_FOUND))
}

fn step_result(outcome: StepOutcome) -> Result<(), Error> {
    match outcome {
        StepOutcome::Applied => Ok(()),
        StepOutcome::Missing => Err(Error::not_found(ENTRY_NOT_FOUND)),
        StepOutcome::AtMinimum => Err(Error::conflict(AT_MINIMUM)),
        StepOutcome::AtMaximum => Err(Error::conflict(QUANTITY_LIMIT)),
    }
}
