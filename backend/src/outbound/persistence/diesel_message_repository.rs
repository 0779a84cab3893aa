//! PostgreSQL-backed `MessageRepository` implementation using Diesel ORM.
//!
//! A broadcast inserts the message and all of its receipts inside one
//! transaction. Any failure (including an unknown or deactivated recipient)
//! rolls the message back before the error reaches the caller.

use std::collections::BTreeMap;
use std::future::Future;

use async_trait::async_trait;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, RunQueryDsl};
use tracing::debug;

use crate::domain::ports::{MessagePersistenceError, MessageRepository};
use crate::domain::{
    AnnouncementSummary, AnnouncementText, BroadcastAudience, BroadcastReceipt, IdentityId,
    InboxAnnouncement, MessageId,
};

use super::diesel_helpers::{
    DieselFailure, classify_diesel_error, collect_rows, constraint_mentions,
    map_pool_error_message, with_timeout,
};
use super::models::{InboxRow, MessageRow, NewMessageRow, NewReceiptRow};
use super::pool::{DbPool, PoolError};
use super::schema::{identities, message_reads, messages};

/// Diesel-backed implementation of the `MessageRepository` port.
#[derive(Clone)]
pub struct DieselMessageRepository {
    pool: DbPool,
}

impl DieselMessageRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        future: impl Future<Output = Result<T, MessagePersistenceError>>,
    ) -> Result<T, MessagePersistenceError> {
        with_timeout(
            self.pool.statement_timeout(),
            operation,
            future,
            MessagePersistenceError::connection,
        )
        .await
    }
}

/// Map pool errors to domain message persistence errors.
fn map_pool_error(error: PoolError) -> MessagePersistenceError {
    MessagePersistenceError::connection(map_pool_error_message(error))
}

/// Map Diesel errors to domain message persistence errors.
///
/// The only foreign keys written by this adapter are the receipt's recipient
/// and message columns; the message id always comes from the same
/// transaction, so any recipient-side violation means an unknown recipient.
fn map_diesel_error(error: diesel::result::Error) -> MessagePersistenceError {
    match classify_diesel_error(error) {
        DieselFailure::Connection(message) => MessagePersistenceError::connection(message),
        DieselFailure::ForeignKeyViolation { constraint }
            if constraint.is_none() || constraint_mentions(constraint.as_deref(), "recipient") =>
        {
            MessagePersistenceError::unknown_recipient()
        }
        DieselFailure::ForeignKeyViolation { .. } => {
            MessagePersistenceError::query("foreign key violation")
        }
        DieselFailure::UniqueViolation { .. } => {
            MessagePersistenceError::query("duplicate receipt")
        }
        DieselFailure::Query(message) => MessagePersistenceError::query(message),
    }
}

/// Reasons a broadcast transaction rolls back.
enum BroadcastFailure {
    Diesel(diesel::result::Error),
    InactiveRecipient,
}

impl From<diesel::result::Error> for BroadcastFailure {
    fn from(error: diesel::result::Error) -> Self {
        Self::Diesel(error)
    }
}

fn map_broadcast_failure(failure: BroadcastFailure) -> MessagePersistenceError {
    match failure {
        BroadcastFailure::Diesel(error) => map_diesel_error(error),
        BroadcastFailure::InactiveRecipient => MessagePersistenceError::unknown_recipient(),
    }
}

fn message_id(raw: i64) -> Result<MessageId, String> {
    MessageId::new(raw).map_err(|err| format!("corrupted message id {raw}: {err}"))
}

fn row_to_inbox(row: InboxRow) -> Result<InboxAnnouncement, String> {
    Ok(InboxAnnouncement {
        id: message_id(row.id)?,
        body: row.body,
        sent_at: row.sent_at,
        read: row.read,
    })
}

fn count(raw: i64) -> u64 {
    u64::try_from(raw).unwrap_or_default()
}

fn summarise(
    rows: Vec<MessageRow>,
    totals: Vec<(i64, i64)>,
    reads: Vec<(i64, i64)>,
) -> Result<Vec<AnnouncementSummary>, MessagePersistenceError> {
    let totals: BTreeMap<i64, i64> = totals.into_iter().collect();
    let reads: BTreeMap<i64, i64> = reads.into_iter().collect();
    collect_rows(
        rows.into_iter().map(|row| {
            Ok(AnnouncementSummary {
                id: message_id(row.id)?,
                recipient_count: count(totals.get(&row.id).copied().unwrap_or_default()),
                read_count: count(reads.get(&row.id).copied().unwrap_or_default()),
                body: row.body,
                sent_at: row.sent_at,
            })
        }),
        MessagePersistenceError::query,
    )
}

#[async_trait]
impl MessageRepository for DieselMessageRepository {
    async fn create_broadcast(
        &self,
        text: &AnnouncementText,
        audience: &BroadcastAudience,
    ) -> Result<BroadcastReceipt, MessagePersistenceError> {
        self.bounded("create broadcast", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let (id, recipient_count) = conn
                .transaction(|conn| {
                    async move {
                        let id: i64 = diesel::insert_into(messages::table)
                            .values(&NewMessageRow {
                                body: text.as_ref(),
                            })
                            .returning(messages::id)
                            .get_result(conn)
                            .await?;

                        let recipients: Vec<i64> = match audience {
                            BroadcastAudience::AllActive => {
                                identities::table
                                    .filter(identities::deleted_at.is_null())
                                    .select(identities::id)
                                    .load(conn)
                                    .await?
                            }
                            BroadcastAudience::Explicit(ids) => {
                                let wanted: Vec<i64> =
                                    ids.iter().map(|recipient| recipient.get()).collect();
                                let active: Vec<i64> = identities::table
                                    .filter(identities::id.eq_any(&wanted))
                                    .filter(identities::deleted_at.is_null())
                                    .select(identities::id)
                                    .for_share()
                                    .load(conn)
                                    .await?;
                                if active.len() != wanted.len() {
                                    return Err(BroadcastFailure::InactiveRecipient);
                                }
                                wanted
                            }
                        };

                        if !recipients.is_empty() {
                            let receipts: Vec<NewReceiptRow> = recipients
                                .iter()
                                .map(|recipient_id| NewReceiptRow {
                                    message_id: id,
                                    recipient_id: *recipient_id,
                                })
                                .collect();
                            diesel::insert_into(message_reads::table)
                                .values(&receipts)
                                .execute(conn)
                                .await?;
                        }

                        Ok((id, recipients.len()))
                    }
                    .scope_boxed()
                })
                .await
                .map_err(map_broadcast_failure)?;

            debug!(message_id = id, recipient_count, "broadcast committed");
            Ok(BroadcastReceipt {
                message_id: message_id(id).map_err(MessagePersistenceError::query)?,
                recipient_count,
            })
        })
        .await
    }

    async fn mark_read(
        &self,
        recipient: IdentityId,
        message: MessageId,
    ) -> Result<(), MessagePersistenceError> {
        self.bounded("mark announcement read", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            diesel::update(
                message_reads::table
                    .filter(message_reads::message_id.eq(message.get()))
                    .filter(message_reads::recipient_id.eq(recipient.get())),
            )
            .set(message_reads::read.eq(true))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(map_diesel_error)
        })
        .await
    }

    async fn mark_all_read(&self, recipient: IdentityId) -> Result<u64, MessagePersistenceError> {
        self.bounded("mark announcements read", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let changed = diesel::update(
                message_reads::table
                    .filter(message_reads::recipient_id.eq(recipient.get()))
                    .filter(message_reads::read.eq(false)),
            )
            .set(message_reads::read.eq(true))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
            Ok(u64::try_from(changed).unwrap_or(u64::MAX))
        })
        .await
    }

    async fn list_for_recipient(
        &self,
        recipient: IdentityId,
    ) -> Result<Vec<InboxAnnouncement>, MessagePersistenceError> {
        self.bounded("list announcements", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            let rows: Vec<InboxRow> = message_reads::table
                .inner_join(messages::table)
                .filter(message_reads::recipient_id.eq(recipient.get()))
                .select((
                    messages::id,
                    messages::body,
                    messages::sent_at,
                    message_reads::read,
                ))
                .order_by((messages::sent_at.desc(), messages::id.desc()))
                .load(&mut conn)
                .await
                .map_err(map_diesel_error)?;
            collect_rows(
                rows.into_iter().map(row_to_inbox),
                MessagePersistenceError::query,
            )
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<AnnouncementSummary>, MessagePersistenceError> {
        self.bounded("list all announcements", async {
            let mut conn = self.pool.get().await.map_err(map_pool_error)?;
            // One snapshot so counts never reference messages the listing missed.
            let (rows, totals, reads) = conn
                .build_transaction()
                .repeatable_read()
                .read_only()
                .run(|conn| {
                    async move {
                        let rows: Vec<MessageRow> = messages::table
                            .select(MessageRow::as_select())
                            .order_by((messages::sent_at.desc(), messages::id.desc()))
                            .load(conn)
                            .await?;
                        let totals: Vec<(i64, i64)> = message_reads::table
                            .group_by(message_reads::message_id)
                            .select((message_reads::message_id, count_star()))
                            .load(conn)
                            .await?;
                        let reads: Vec<(i64, i64)> = message_reads::table
                            .filter(message_reads::read.eq(true))
                            .group_by(message_reads::message_id)
                            .select((message_reads::message_id, count_star()))
                            .load(conn)
                            .await?;
                        Ok::<_, diesel::result::Error>((rows, totals, reads))
                    }
                    .scope_boxed()
                })
                .await
                .map_err(map_diesel_error)?;
            summarise(rows, totals, reads)
        })
        .await
    }
}
