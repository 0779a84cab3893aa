//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::schema::{basket_entries, identities, message_reads, messages};

// ---------------------------------------------------------------------------
// Identity models
// ---------------------------------------------------------------------------

/// Row struct for reading active identities.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = identities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct IdentityRow {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub permission: i16,
    pub last_login: Option<DateTime<Utc>>,
}

/// Insertable struct for creating identities.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = identities)]
pub(crate) struct NewIdentityRow<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub permission: i16,
}

// ---------------------------------------------------------------------------
// Message models
// ---------------------------------------------------------------------------

/// Insertable struct for announcement bodies; `sent_at` uses the store clock.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = messages)]
pub(crate) struct NewMessageRow<'a> {
    pub body: &'a str,
}

/// Insertable struct for unread receipts.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = message_reads)]
pub(crate) struct NewReceiptRow {
    pub message_id: i64,
    pub recipient_id: i64,
}

/// An announcement joined with one recipient's receipt.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct InboxRow {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
    pub read: bool,
}

/// Row struct for reading announcement bodies.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = messages)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct MessageRow {
    pub id: i64,
    pub body: String,
    pub sent_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Basket models
// ---------------------------------------------------------------------------

/// Insertable struct for first-time basket entries.
#[derive(Debug, Clone, Copy, Insertable)]
#[diesel(table_name = basket_entries)]
pub(crate) struct NewBasketEntryRow {
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i32,
}

/// A basket entry joined with its product.
#[derive(Debug, Clone, Queryable)]
pub(crate) struct BasketLineRow {
    pub id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub unit_price: f64,
    pub quantity: i32,
}
