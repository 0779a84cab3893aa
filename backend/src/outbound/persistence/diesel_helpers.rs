//! Shared helpers for Diesel repository implementations.
//!
//! This module provides the pieces every adapter needs:
//! - Classification of Diesel errors into the failure kinds ports care about
//! - Message extraction from pool errors
//! - A bounded timeout around a whole store operation
//! - Row collection with first-error mapping

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use super::pool::PoolError;

/// Failure kinds the repository ports distinguish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DieselFailure {
    /// The connection dropped or could not be used.
    Connection(String),
    /// A unique constraint rejected the write.
    UniqueViolation { constraint: Option<String> },
    /// A foreign key rejected the write.
    ForeignKeyViolation { constraint: Option<String> },
    /// Anything else, including missing rows.
    Query(String),
}

/// Extract a readable message from a pool error.
pub(crate) fn map_pool_error_message(error: PoolError) -> String {
    match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    }
}

/// Classify a Diesel error and emit debug context.
pub(crate) fn classify_diesel_error(error: diesel::result::Error) -> DieselFailure {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::NotFound => DieselFailure::Query("record not found".to_owned()),
        DieselError::QueryBuilderError(_) => DieselFailure::Query("database query error".to_owned()),
        DieselError::DatabaseError(kind, info) => {
            let constraint = info.constraint_name().map(str::to_owned);
            match kind {
                DatabaseErrorKind::UniqueViolation => DieselFailure::UniqueViolation { constraint },
                DatabaseErrorKind::ForeignKeyViolation => {
                    DieselFailure::ForeignKeyViolation { constraint }
                }
                DatabaseErrorKind::ClosedConnection => {
                    DieselFailure::Connection("database connection error".to_owned())
                }
                _ => DieselFailure::Query("database error".to_owned()),
            }
        }
        DieselError::BrokenTransactionManager => {
            DieselFailure::Connection("transaction manager broken".to_owned())
        }
        _ => DieselFailure::Query("database error".to_owned()),
    }
}

/// Whether a constraint name (when Postgres reports one) mentions `needle`.
pub(crate) fn constraint_mentions(constraint: Option<&str>, needle: &str) -> bool {
    constraint.is_some_and(|name| name.contains(needle))
}

/// Run a whole store operation under `limit`.
///
/// Expiry drops the future, which releases the pooled connection; an open
/// transaction is rolled back by the server when the session resets.
pub(crate) async fn with_timeout<T, E>(
    limit: Duration,
    operation: &'static str,
    future: impl Future<Output = Result<T, E>>,
    on_timeout: impl FnOnce(String) -> E,
) -> Result<T, E> {
    match tokio::time::timeout(limit, future).await {
        Ok(result) => result,
        Err(_) => {
            warn!(operation, limit_ms = limit.as_millis(), "store operation timed out");
            Err(on_timeout(format!(
                "{operation} timed out after {}ms",
                limit.as_millis()
            )))
        }
    }
}

/// Collect row conversion results, mapping the first error through `map_err`.
pub(crate) fn collect_rows<T, E>(
    results: impl Iterator<Item = Result<T, String>>,
    map_err: impl FnOnce(String) -> E,
) -> Result<Vec<T>, E> {
    results.collect::<Result<Vec<_>, _>>().map_err(map_err)
}
