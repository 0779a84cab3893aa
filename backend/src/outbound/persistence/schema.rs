//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match the database migrations exactly. They are used
//! by Diesel for compile-time query validation and type-safe SQL generation.
//!
//! # Maintenance
//!
//! When migrations change the schema, this file should be regenerated or
//! manually updated to reflect those changes. The `diesel print-schema`
//! command can generate these definitions from a live database.

diesel::table! {
    /// Staff and admin accounts.
    ///
    /// The session token column is the session record: `NULL` means signed
    /// out. Rows are soft-deleted via `deleted_at`.
    identities (id) {
        id -> Int8,
        /// Lower-cased address; unique among rows with `deleted_at IS NULL`.
        email -> Varchar,
        name -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        /// 64 lowercase hex characters; unique when present.
        session_token -> Nullable<Varchar>,
        /// 0 = standard, 1 = admin.
        permission -> Int2,
        last_login -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Sellable products. Read-only for this service.
    products (id) {
        id -> Int8,
        name -> Varchar,
        price -> Float8,
        created_at -> Timestamptz,
        deleted_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// One quantity row per (customer, product) pair.
    basket_entries (id) {
        id -> Int8,
        customer_id -> Int8,
        product_id -> Int8,
        quantity -> Int4,
    }
}

diesel::table! {
    /// Immutable announcement bodies.
    messages (id) {
        id -> Int8,
        body -> Text,
        sent_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-recipient read receipts.
    message_reads (message_id, recipient_id) {
        message_id -> Int8,
        recipient_id -> Int8,
        read -> Bool,
    }
}

diesel::joinable!(basket_entries -> identities (customer_id));
diesel::joinable!(basket_entries -> products (product_id));
diesel::joinable!(message_reads -> identities (recipient_id));
diesel::joinable!(message_reads -> messages (message_id));

diesel::allow_tables_to_appear_in_same_query!(
    basket_entries,
    identities,
    message_reads,
    messages,
    products,
);
