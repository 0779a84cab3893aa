//! PostgreSQL-backed `BasketRepository` implementation using Diesel ORM.
//!
//! The add path is a single `INSERT ... ON CONFLICT (customer_id, product_id)
//! DO UPDATE` so two concurrent adds of the same product can never produce a
//! second row; the unique constraint serialises them.

use std::future::Future;

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};

use crate::domain::ports::{BasketPersistenceError, BasketRepository};
use crate::domain::{BasketEntryId, BasketLine, IdentityId, ProductId, Quantity, StepOutcome};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, collect_rows, map_pool_error_message, with_timeout,
};
use super::models::{BasketLineRow, NewBasketEntryRow};
use super::pool::{DbPool, PoolError};
use super::schema::{basket_entries, products};

/// Diesel-backed implementation of the `BasketRepository` port.
#[derive(Clone)]
pub struct DieselBasketRepository {
    pool: DbPool,
}

impl DieselBasketRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T, BasketPersistenceError>>,
    ) -> Result<T, BasketPersistenceError> {
        with_timeout(
            self.pool.statement_timeout(),
            operation,
            future,
            BasketPersistenceError::connection,
        )
        .await
    }
}

/// Map pool errors to domain basket persistence errors.
fn map_pool_error(error: PoolError) -> BasketPersistenceError {
    BasketPersistenceError::connection(map_pool_error_message(error))
}

/// Map Diesel errors to domain basket persistence errors.
///
/// The customer always exists (the caller holds a live session), so a
/// foreign key violation can only come from the product column.
fn map_diesel_error(error: diesel::result::Error) -> BasketPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => BasketPersistenceError::connection(message),
        DieselFailure::ForeignKeyViolation { .. } => BasketPersistenceError::unknown_product(),
        DieselFailure::UniqueViolation { .. } => {
            BasketPersistenceError::query("duplicate basket entry")
        }
        DieselFailure::Query(message) => BasketPersistenceError::query(message),
    }
}

fn row_to_line(row: BasketLineRow) -> Result<BasketLine, String> {
    Ok(BasketLine {
        id: BasketEntryId::new(row.id).map_err(|err| format!("corrupted entry id: {err}"))?,
        product_id: ProductId::new(row.product_id)
            .map_err(|err| format!("corrupted product id: {err}"))?,
        product_name: row.product_name,
        unit_price: row.unit_price,
        quantity: row.quantity,
    })
}

/// How an upsert transaction ended.
enum Upserted {
    Entry(i64),
    UnknownProduct,
    AtLimit,
}

/// Outcome of a guarded step that changed no row.
fn unchanged(exists: bool, bound: StepOutcome) -> StepOutcome {
    if exists { bound } else { StepOutcome::Missing }
}

fn entry_id(raw: i64) -> Result<BasketEntryId, BasketPersistenceError> {
    BasketEntryId::new(raw).map_err(|err| BasketPersistenceError::query(err.to_string()))
}

/// Entry ids owned by `customer`.
macro_rules! owned_entry {
    ($customer:expr, $entry:expr) => {
        basket_entries::table
            .filter(basket_entries::id.eq($entry.get()))
            .filter(basket_entries::customer_id.eq($customer.get()))
    };
}

/// Columns of a basket entry joined with its product.
macro_rules! line_columns {
    () => {
        (
            basket_entries::id,
            basket_entries::product_id,
            products::name,
            products::price,
            basket_entries::quantity,
        )
    };
}

#[async_trait]
impl BasketRepository for DieselBasketRepository {
    async fn upsert(
        &self,
        customer: IdentityId,
        product: ProductId,
        quantity: Quantity,
    ) -> Result<BasketEntryId, BasketPersistenceError> {
        self.bounded("upsert basket entry", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let upserted = conn
                .transaction(|conn| {
                    async move {
                        // Share-lock the product so it cannot be withdrawn mid-insert.
                        let available: Option<i64> = products::table
                            .filter(products::id.eq(product.get()))
                            .filter(products::deleted_at.is_null())
                            .select(products::id)
                            .for_share()
                            .first(conn)
                            .await
                            .optional()?;
                        if available.is_none() {
                            return Ok(Upserted::UnknownProduct);
                        }

                        // A conflicting row at the column limit is left alone
                        // and returns nothing.
                        let id: Option<i64> = diesel::insert_into(basket_entries::table)
                            .values(&NewBasketEntryRow {
                                customer_id: customer.get(),
                                product_id: product.get(),
                                quantity: quantity.get(),
                            })
                            .on_conflict((basket_entries::customer_id, basket_entries::product_id))
                            .do_update()
                            .set(basket_entries::quantity.eq(basket_entries::quantity + 1))
                            .filter(basket_entries::quantity.lt(i32::MAX))
                            .returning(basket_entries::id)
                            .get_result(conn)
                            .await
                            .optional()?;
                        Ok(id.map_or(Upserted::AtLimit, Upserted::Entry))
                    }
                    .scope_boxed()
                })
                .await
                .map_err(map_diesel_error)?;
            match upserted {
                Upserted::Entry(id) => entry_id(id),
                Upserted::UnknownProduct => Err(BasketPersistenceError::unknown_product()),
                Upserted::AtLimit => Err(BasketPersistenceError::quantity_limit()),
            }
        })
        .await
    }

    async fn increment(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<StepOutcome, BasketPersistenceError> {
        self.bounded("increment basket entry", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            conn.transaction(|conn| {
                async move {
                    let updated = diesel::update(
                        owned_entry!(customer, entry)
                            .filter(basket_entries::quantity.lt(i32::MAX)),
                    )
                    .set(basket_entries::quantity.eq(basket_entries::quantity + 1))
                    .execute(conn)
                    .await?;
                    if updated > 0 {
                        return Ok(StepOutcome::Applied);
                    }
                    let exists: Option<i64> = owned_entry!(customer, entry)
                        .select(basket_entries::id)
                        .first(conn)
                        .await
                        .optional()?;
                    Ok(unchanged(exists.is_some(), StepOutcome::AtMaximum))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn decrement(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<StepOutcome, BasketPersistenceError> {
        self.bounded("decrement basket entry", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            conn.transaction(|conn| {
                async move {
                    let updated = diesel::update(
                        owned_entry!(customer, entry).filter(basket_entries::quantity.gt(1)),
                    )
                    .set(basket_entries::quantity.eq(basket_entries::quantity - 1))
                    .execute(conn)
                    .await?;
                    if updated > 0 {
                        return Ok(StepOutcome::Applied);
                    }
                    // Nothing changed: either the floor was hit or the entry is absent.
                    let exists: Option<i64> = owned_entry!(customer, entry)
                        .select(basket_entries::id)
                        .first(conn)
                        .await
                        .optional()?;
                    Ok(unchanged(exists.is_some(), StepOutcome::AtMinimum))
                }
                .scope_boxed()
            })
            .await
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn delete(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<bool, BasketPersistenceError> {
        self.bounded("delete basket entry", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let deleted = diesel::delete(owned_entry!(customer, entry))
                .execute(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn find_for_customer(
        &self,
        customer: IdentityId,
        entry: BasketEntryId,
    ) -> Result<Option<BasketLine>, BasketPersistenceError> {
        self.bounded("find basket entry", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<BasketLineRow> = basket_entries::table
                .inner_join(products::table)
                .filter(basket_entries::id.eq(entry.get()))
                .filter(basket_entries::customer_id.eq(customer.get()))
                .select(line_columns!())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            row.map(row_to_line)
                .transpose()
                .map_err(BasketPersistenceError::query)
        })
        .await
    }

    async fn list_for_customer(
        &self,
        customer: IdentityId,
    ) -> Result<Vec<BasketLine>, BasketPersistenceError> {
        self.bounded("list basket", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<BasketLineRow> = basket_entries::table
                .inner_join(products::table)
                .filter(basket_entries::customer_id.eq(customer.get()))
                .select(line_columns!())
                .order_by(basket_entries::id)
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            collect_rows(rows.into_iter().map(row_to_line), BasketPersistenceError::query)
        })
        .await
    }
}
