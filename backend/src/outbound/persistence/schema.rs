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
    /// Registered accounts.
    ///
    /// `email` is stored lower-cased and carries a unique index.
    users (id) {
        id -> Uuid,
        email -> Varchar,
        display_name -> Varchar,
        photo_url -> Nullable<Text>,
        password_hash -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// Car listings.
    ///
    /// Specifications and image references are JSONB documents; `revision`
    /// backs optimistic concurrency on updates.
    listings (id) {
        id -> Uuid,
        seller_id -> Uuid,
        seller_type -> Varchar,
        seller_name -> Text,
        seller_contact -> Text,
        title -> Text,
        brand -> Text,
        model -> Text,
        year -> Int4,
        price -> Int8,
        old_price -> Nullable<Int8>,
        kilometers -> Int8,
        fuel_type -> Text,
        transmission -> Text,
        body_type -> Text,
        owners -> Int4,
        location -> Text,
        description -> Text,
        features -> Array<Text>,
        specifications -> Jsonb,
        images -> Jsonb,
        is_new -> Bool,
        is_featured -> Bool,
        is_reduced -> Bool,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        revision -> Int4,
    }
}

diesel::table! {
    /// Favourite junction rows: one per `(user, listing)` pair.
    favorites (user_id, listing_id) {
        user_id -> Uuid,
        listing_id -> Uuid,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Outstanding password reset grants, keyed by token digest.
    password_resets (token_digest) {
        token_digest -> Varchar,
        user_id -> Uuid,
        expires_at -> Timestamptz,
    }
}

diesel::joinable!(listings -> users (seller_id));
diesel::joinable!(favorites -> listings (listing_id));
diesel::joinable!(password_resets -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(users, listings, favorites, password_resets);
