//! Basket data model: one quantity row per (customer, product) pair.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Validation errors for basket inputs.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BasketValidationError {
    #[error("basket entry id must be positive")]
    NonPositiveEntryId,
    #[error("product id must be positive")]
    NonPositiveProductId,
    #[error("quantity must be at least 1")]
    QuantityBelowOne,
    #[error("quantity must be at most {max}")]
    QuantityTooLarge { max: i64 },
}

/// Database identifier of a basket row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct BasketEntryId(i64);

impl BasketEntryId {
    /// Validate and construct an identifier.
    pub fn new(raw: i64) -> Result<Self, BasketValidationError> {
        if raw <= 0 {
            return Err(BasketValidationError::NonPositiveEntryId);
        }
        Ok(Self(raw))
    }

    /// Raw column value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for BasketEntryId {
    type Error = BasketValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<BasketEntryId> for i64 {
    fn from(value: BasketEntryId) -> Self {
        value.0
    }
}

impl fmt::Display for BasketEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Database identifier of a product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct ProductId(i64);

impl ProductId {
    /// Validate and construct an identifier.
    pub fn new(raw: i64) -> Result<Self, BasketValidationError> {
        if raw <= 0 {
            return Err(BasketValidationError::NonPositiveProductId);
        }
        Ok(Self(raw))
    }

    /// Raw column value.
    #[must_use]
    pub fn get(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ProductId {
    type Error = BasketValidationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ProductId> for i64 {
    fn from(value: ProductId) -> Self {
        value.0
    }
}

/// Requested quantity: at least one and small enough for an `INTEGER` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Quantity(i32);

impl Quantity {
    /// Validate a caller-supplied quantity.
    ///
    /// # Examples
    /// ```
    /// use gymdesk::domain::Quantity;
    ///
    /// assert_eq!(Quantity::new(2).unwrap().get(), 2);
    /// assert!(Quantity::new(0).is_err());
    /// ```
    pub fn new(raw: i64) -> Result<Self, BasketValidationError> {
        if raw < 1 {
            return Err(BasketValidationError::QuantityBelowOne);
        }
        i32::try_from(raw)
            .map(Self)
            .map_err(|_| BasketValidationError::QuantityTooLarge {
                max: i64::from(i32::MAX),
            })
    }

    /// Stored column value.
    #[must_use]
    pub fn get(self) -> i32 {
        self.0
    }
}

/// Result of a single-step quantity change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// The quantity was changed.
    Applied,
    /// No entry with that id belongs to the customer.
    Missing,
    /// The entry exists but sits at quantity one; nothing was changed.
    AtMinimum,
    /// The entry already holds the largest storable quantity.
    AtMaximum,
}

/// A basket entry joined with the product it refers to.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BasketLine {
    pub id: BasketEntryId,
    pub product_id: ProductId,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, Err(BasketValidationError::QuantityBelowOne))]
    #[case(-3, Err(BasketValidationError::QuantityBelowOne))]
    #[case(1, Ok(1))]
    #[case(i64::from(i32::MAX), Ok(i32::MAX))]
    #[case(
        i64::from(i32::MAX) + 1,
        Err(BasketValidationError::QuantityTooLarge { max: i64::from(i32::MAX) })
    )]
    fn quantity_bounds(#[case] raw: i64, #[case] expected: Result<i32, BasketValidationError>) {
        assert_eq!(Quantity::new(raw).map(Quantity::get), expected);
    }

    #[rstest]
    fn ids_must_be_positive() {
        assert_eq!(
            BasketEntryId::new(0),
            Err(BasketValidationError::NonPositiveEntryId)
        );
        assert_eq!(
            ProductId::new(-1),
            Err(BasketValidationError::NonPositiveProductId)
        );
    }
}
