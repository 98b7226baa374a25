//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. They exist solely to satisfy Diesel's
//! type requirements for queries and mutations. Conversions report failures
//! as plain strings; repositories wrap them in their own query errors.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    DisplayName, EmailAddress, Listing, ListingDetails, ListingId, ListingImage, Seller,
    SellerType, Specifications, UserAccount, UserId,
};

use super::schema::{favorites, listings, password_resets, users};

// ---------------------------------------------------------------------------
// User models
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub photo_url: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_account(self) -> Result<UserAccount, String> {
        let display_name = DisplayName::new(self.display_name)
            .map_err(|err| format!("stored display name for {}: {err}", self.id))?;
        let email = EmailAddress::new(&self.email)
            .map_err(|err| format!("stored email for {}: {err}", self.id))?;
        let photo_url = self
            .photo_url
            .as_deref()
            .map(url::Url::parse)
            .transpose()
            .map_err(|err| format!("stored photo URL for {}: {err}", self.id))?;
        Ok(
            UserAccount::new(UserId::from_uuid(self.id), display_name, email, self.created_at)
                .with_photo_url(photo_url),
        )
    }
}

/// Insertable struct for creating new user records.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub email: &'a str,
    pub display_name: &'a str,
    pub photo_url: Option<&'a str>,
    pub password_hash: &'a str,
    pub created_at: DateTime<Utc>,
}

/// Changeset for profile edits. `None` clears the photo.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserProfileChangeset<'a> {
    pub display_name: &'a str,
    pub photo_url: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Listing models
// ---------------------------------------------------------------------------

/// Full listing row, used for reads, inserts and revision-checked updates.
#[derive(Debug, Clone, Queryable, Selectable, Insertable, AsChangeset)]
#[diesel(table_name = listings)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub(crate) struct ListingRow {
    pub id: Uuid,
    pub seller_id: Uuid,
    pub seller_type: String,
    pub seller_name: String,
    pub seller_contact: String,
    pub title: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub price: i64,
    pub old_price: Option<i64>,
    pub kilometers: i64,
    pub fuel_type: String,
    pub transmission: String,
    pub body_type: String,
    pub owners: i32,
    pub location: String,
    pub description: String,
    pub features: Vec<String>,
    pub specifications: serde_json::Value,
    pub images: serde_json::Value,
    pub is_new: bool,
    pub is_featured: bool,
    pub is_reduced: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: i32,
}

/// Cast a domain revision to the database column type.
pub(crate) fn revision_for_db(revision: u32) -> Result<i32, String> {
    i32::try_from(revision).map_err(|_| format!("revision {revision} exceeds column range"))
}

impl ListingRow {
    pub(crate) fn from_listing(listing: &Listing) -> Result<Self, String> {
        let details = &listing.details;
        let specifications = serde_json::to_value(&details.specifications)
            .map_err(|err| format!("encode specifications: {err}"))?;
        let images = serde_json::to_value(&listing.images)
            .map_err(|err| format!("encode images: {err}"))?;
        Ok(Self {
            id: *listing.id.as_uuid(),
            seller_id: *listing.seller.user_id.as_uuid(),
            seller_type: listing.seller.seller_type.as_str().to_owned(),
            seller_name: listing.seller.name.clone(),
            seller_contact: listing.seller.contact.clone(),
            title: details.title.clone(),
            brand: details.brand.clone(),
            model: details.model.clone(),
            year: details.year,
            price: details.price,
            old_price: details.old_price,
            kilometers: details.kilometers,
            fuel_type: details.fuel_type.clone(),
            transmission: details.transmission.clone(),
            body_type: details.body_type.clone(),
            owners: details.owners,
            location: details.location.clone(),
            description: details.description.clone(),
            features: details.features.clone(),
            specifications,
            images,
            is_new: details.is_new,
            is_featured: details.is_featured,
            is_reduced: details.is_reduced,
            created_at: listing.created_at,
            updated_at: listing.updated_at,
            revision: revision_for_db(listing.revision)?,
        })
    }

    pub(crate) fn into_listing(self) -> Result<Listing, String> {
        let seller_type: SellerType = self
            .seller_type
            .parse()
            .map_err(|err| format!("listing {}: {err}", self.id))?;
        let specifications: Specifications = serde_json::from_value(self.specifications)
            .map_err(|err| format!("listing {} specifications: {err}", self.id))?;
        let images: Vec<ListingImage> = serde_json::from_value(self.images)
            .map_err(|err| format!("listing {} images: {err}", self.id))?;
        let revision = u32::try_from(self.revision)
            .map_err(|_| format!("listing {} has negative revision", self.id))?;
        Ok(Listing {
            id: ListingId::from_uuid(self.id),
            details: ListingDetails {
                title: self.title,
                brand: self.brand,
                model: self.model,
                year: self.year,
                price: self.price,
                old_price: self.old_price,
                kilometers: self.kilometers,
                fuel_type: self.fuel_type,
                transmission: self.transmission,
                body_type: self.body_type,
                owners: self.owners,
                location: self.location,
                description: self.description,
                features: self.features,
                specifications,
                is_new: self.is_new,
                is_featured: self.is_featured,
                is_reduced: self.is_reduced,
            },
            seller: Seller {
                user_id: UserId::from_uuid(self.seller_id),
                seller_type,
                name: self.seller_name,
                contact: self.seller_contact,
            },
            images,
            created_at: self.created_at,
            updated_at: self.updated_at,
            revision,
        })
    }
}

// ---------------------------------------------------------------------------
// Favourite and password reset models
// ---------------------------------------------------------------------------

/// Insertable favourite pair; `created_at` defaults in the database.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = favorites)]
pub(crate) struct NewFavoriteRow {
    pub user_id: Uuid,
    pub listing_id: Uuid,
}

/// Password reset grant row.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = password_resets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct PasswordResetRow {
    pub token_digest: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}
