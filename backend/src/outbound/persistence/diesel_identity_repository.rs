//! PostgreSQL-backed `IdentityRepository` implementation using Diesel ORM.
//!
//! The session token column doubles as the session table. Every lookup is
//! restricted to active rows (`deleted_at IS NULL`) and timestamps come from
//! the database clock.

use std::future::Future;

use async_trait::async_trait;
use diesel::dsl::now;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{IdentityPersistenceError, IdentityRepository};
use crate::domain::{
    CredentialHash, Email, Identity, IdentityId, IdentityName, NewIdentity, PermissionLevel,
    SessionToken,
};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, collect_rows, map_pool_error_message, with_timeout,
};
use super::models::{IdentityRow, NewIdentityRow};
use super::pool::{DbPool, PoolError};
use super::schema::identities;

/// Diesel-backed implementation of the `IdentityRepository` port.
#[derive(Clone)]
pub struct DieselIdentityRepository {
    pool: DbPool,
}

impl DieselIdentityRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T, IdentityPersistenceError>>,
    ) -> Result<T, IdentityPersistenceError> {
        with_timeout(
            self.pool.statement_timeout(),
            operation,
            future,
            IdentityPersistenceError::connection,
        )
        .await
    }
}

/// Map pool errors to domain identity persistence errors.
fn map_pool_error(error: PoolError) -> IdentityPersistenceError {
    IdentityPersistenceError::connection(map_pool_error_message(error))
}

/// Map Diesel errors to domain identity persistence errors.
fn map_diesel_error(error: diesel::result::Error) -> IdentityPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => IdentityPersistenceError::connection(message),
        DieselFailure::UniqueViolation { constraint } => IdentityPersistenceError::query(format!(
            "unique constraint violated: {}",
            constraint.as_deref().unwrap_or("unknown")
        )),
        DieselFailure::ForeignKeyViolation { .. } => {
            IdentityPersistenceError::query("foreign key violation")
        }
        DieselFailure::Query(message) => IdentityPersistenceError::query(message),
    }
}

/// Creation can only collide on the active-email index.
fn map_create_error(error: diesel::result::Error, email: &Email) -> IdentityPersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::UniqueViolation { .. } => {
            IdentityPersistenceError::duplicate_email(email.as_ref())
        }
        DieselFailure::Connection(message) => IdentityPersistenceError::connection(message),
        DieselFailure::ForeignKeyViolation { .. } => {
            IdentityPersistenceError::query("foreign key violation")
        }
        DieselFailure::Query(message) => IdentityPersistenceError::query(message),
    }
}

/// Convert a database row to a domain identity.
fn row_to_identity(row: IdentityRow) -> Result<Identity, String> {
    let corrupt = |field: &str, err: &dyn std::fmt::Display| {
        format!("corrupted identity {} {field}: {err}", row.id)
    };
    Ok(Identity {
        id: IdentityId::new(row.id).map_err(|err| corrupt("id", &err))?,
        email: Email::new(&row.email).map_err(|err| corrupt("email", &err))?,
        name: IdentityName::new(&row.name).map_err(|err| corrupt("name", &err))?,
        permission: PermissionLevel::from_i16(row.permission)
            .map_err(|err| corrupt("permission", &err))?,
        last_login: row.last_login,
        credential: CredentialHash::new(row.password_hash),
    })
}

fn convert_optional(row: Option<IdentityRow>) -> Result<Option<Identity>, IdentityPersistenceError> {
    row.map(row_to_identity)
        .transpose()
        .map_err(IdentityPersistenceError::query)
}

#[async_trait]
impl IdentityRepository for DieselIdentityRepository {
    async fn find_active_by_email(
        &self,
        email: &Email,
    ) -> Result<Option<Identity>, IdentityPersistenceError> {
        self.bounded("find identity by email", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<IdentityRow> = identities::table
                .filter(identities::email.eq(email.as_ref()))
                .filter(identities::deleted_at.is_null())
                .select(IdentityRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            convert_optional(row)
        })
        .await
    }

    async fn find_active_by_token(
        &self,
        token: &SessionToken,
    ) -> Result<Option<Identity>, IdentityPersistenceError> {
        self.bounded("find identity by session", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row: Option<IdentityRow> = identities::table
                .filter(identities::session_token.eq(token.as_str()))
                .filter(identities::deleted_at.is_null())
                .select(IdentityRow::as_select())
                .first(&mut conn)
                .await
                .optional()
                .map_err(map_diesel_error)?;
            convert_optional(row)
        })
        .await
    }

    async fn update_session(
        &self,
        id: IdentityId,
        token: &SessionToken,
    ) -> Result<(), IdentityPersistenceError> {
        self.bounded("store session", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::update(identities::table.filter(identities::id.eq(id.get())))
                .set((
                    identities::session_token.eq(token.as_str()),
                    identities::last_login.eq(now),
                ))
                .execute(&mut conn)
                .await
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn clear_session(&self, token: &SessionToken) -> Result<(), IdentityPersistenceError> {
        self.bounded("clear session", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::update(identities::table.filter(identities::session_token.eq(token.as_str())))
                .set(identities::session_token.eq(None::<String>))
                .execute(&mut conn)
                .await
                .map(|_| ())
                .map_err(map_diesel_error)
        })
        .await
    }

    async fn create(&self, identity: &NewIdentity) -> Result<IdentityId, IdentityPersistenceError> {
        self.bounded("create identity", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let row = NewIdentityRow {
                email: identity.email.as_ref(),
                name: identity.name.as_ref(),
                password_hash: identity.credential.as_str(),
                permission: identity.permission.as_i16(),
            };
            let id: i64 = diesel::insert_into(identities::table)
                .values(&row)
                .returning(identities::id)
                .get_result(&mut conn)
                .await
                .map_err(|err| map_create_error(err, &identity.email))?;
            IdentityId::new(id).map_err(|err| IdentityPersistenceError::query(err.to_string()))
        })
        .await
    }

    async fn update_password_hash(
        &self,
        id: IdentityId,
        credential: &CredentialHash,
    ) -> Result<bool, IdentityPersistenceError> {
        self.bounded("update password", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let updated = diesel::update(
                identities::table
                    .filter(identities::id.eq(id.get()))
                    .filter(identities::deleted_at.is_null()),
            )
            .set(identities::password_hash.eq(credential.as_str()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
            Ok(updated > 0)
        })
        .await
    }

    async fn soft_delete(&self, id: IdentityId) -> Result<bool, IdentityPersistenceError> {
        self.bounded("deactivate identity", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let updated = diesel::update(
                identities::table
                    .filter(identities::id.eq(id.get()))
                    .filter(identities::deleted_at.is_null()),
            )
            .set((
                identities::deleted_at.eq(now),
                identities::session_token.eq(None::<String>),
            ))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
            Ok(updated > 0)
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for identity error mapping and row conversion.
    use super::*;
    use diesel::result::{DatabaseErrorKind, Error as DieselError};
    use rstest::rstest;

    fn row(permission: i16, email: &str) -> IdentityRow {
        IdentityRow {
            id: 9,
            email: email.to_owned(),
            name: "Coach".to_owned(),
            password_hash: "$argon2id$stub".to_owned(),
            permission,
            last_login: None,
        }
    }

    #[rstest]
    fn pool_error_maps_to_connection_error() {
        let repo_err = map_pool_error(PoolError::checkout("connection refused"));

        assert!(matches!(
            repo_err,
            IdentityPersistenceError::Connection { .. }
        ));
        assert!(repo_err.to_string().contains("connection refused"));
    }

    #[rstest]
    fn diesel_error_maps_to_query_error() {
        let repo_err = map_diesel_error(DieselError::NotFound);

        assert!(matches!(repo_err, IdentityPersistenceError::Query { .. }));
        assert!(repo_err.to_string().contains("record not found"));
    }

    #[rstest]
    fn unique_violation_on_create_is_a_duplicate_email() {
        let email = Email::new("coach@gym.example").expect("valid email");
        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::UniqueViolation,
            Box::new("duplicate key value".to_owned()),
        );

        let repo_err = map_create_error(diesel_err, &email);
        assert!(
            matches!(repo_err, IdentityPersistenceError::DuplicateEmail { .. }),
            "expected DuplicateEmail, got {repo_err:?}"
        );
    }

    #[rstest]
    fn closed_connection_maps_to_connection_error() {
        let diesel_err = DieselError::DatabaseError(
            DatabaseErrorKind::ClosedConnection,
            Box::new("server closed the connection".to_owned()),
        );
        assert!(matches!(
            map_diesel_error(diesel_err),
            IdentityPersistenceError::Connection { .. }
        ));
    }

    #[rstest]
    fn rows_convert_to_identities() {
        let identity = row_to_identity(row(1, "coach@gym.example")).expect("valid row");
        assert_eq!(identity.id.get(), 9);
        assert!(identity.is_admin());
    }

    #[rstest]
    #[case(row(7, "coach@gym.example"), "permission")]
    #[case(row(0, "not-an-email"), "email")]
    fn corrupted_rows_are_rejected(#[case] row: IdentityRow, #[case] field: &str) {
        let message = row_to_identity(row).expect_err("corrupted row");
        assert!(message.contains(field), "unexpected message: {message}");
    }
}
