//! Car listing aggregate.
//!
//! A listing is a single car-for-sale record owned by the seller who created
//! it. Images are stored out-of-band in the image store and referenced here by
//! object key and public URL; the image list is always present, possibly
//! empty.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use super::user::UserId;

/// Earliest model year accepted (the first production automobile).
pub const MIN_MODEL_YEAR: i32 = 1886;
/// Maximum number of images attached to one listing.
pub const MAX_IMAGES: usize = 20;
/// Maximum size of one uploaded image.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;
/// Accepted seating capacity bounds.
pub const SEATING_CAPACITY_RANGE: std::ops::RangeInclusive<i32> = 1..=100;

/// Server-assigned listing identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ListingId(Uuid);

impl ListingId {
    /// Generate a fresh identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ListingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl FromStr for ListingId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

/// Whether the listing was posted by a dealership or a private seller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SellerType {
    Dealer,
    Individual,
}

impl SellerType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dealer => "dealer",
            Self::Individual => "individual",
        }
    }
}

impl FromStr for SellerType {
    type Err = ListingValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dealer" => Ok(Self::Dealer),
            "individual" => Ok(Self::Individual),
            _ => Err(ListingValidationError::InvalidSellerType),
        }
    }
}

/// Seller reference fields copied onto the listing at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seller {
    pub user_id: UserId,
    pub seller_type: SellerType,
    pub name: String,
    pub contact: String,
}

/// Technical specification block shown on the detail page.
///
/// Free-text values are kept as entered ("1998 cc", "187 bhp") because the
/// marketplace displays them verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specifications {
    pub engine: String,
    pub max_power: String,
    pub max_torque: String,
    pub fuel_tank: String,
    pub seating_capacity: i32,
    pub boot_space: String,
    pub mileage: String,
    pub ground_clearance: String,
    pub color: String,
}

/// Reference to a stored image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingImage {
    /// Object key inside the image store.
    pub key: String,
    /// Public URL the image is served from.
    pub url: Url,
}

/// Seller-editable listing content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingDetails {
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
    pub specifications: Specifications,
    pub is_new: bool,
    pub is_featured: bool,
    pub is_reduced: bool,
}

/// Field-level validation failures for listing input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingValidationError {
    /// A required text field was blank.
    MissingField { field: &'static str },
    YearOutOfRange { min: i32, max: i32 },
    NonPositivePrice,
    OldPriceNotAbovePrice,
    NegativeKilometers,
    NegativeOwners,
    SeatingCapacityOutOfRange,
    InvalidSellerType,
    TooManyImages { max: usize },
    EmptyImage { index: usize },
    ImageTooLarge { index: usize, max: usize },
    UnsupportedImageType { index: usize },
}

impl ListingValidationError {
    /// Request field the error refers to, in the camelCase wire spelling.
    pub fn field(&self) -> &'static str {
        match self {
            Self::MissingField { field } => field,
            Self::YearOutOfRange { .. } => "year",
            Self::NonPositivePrice => "price",
            Self::OldPriceNotAbovePrice => "oldPrice",
            Self::NegativeKilometers => "kilometers",
            Self::NegativeOwners => "owners",
            Self::SeatingCapacityOutOfRange => "specifications.seatingCapacity",
            Self::InvalidSellerType => "sellerType",
            Self::TooManyImages { .. }
            | Self::EmptyImage { .. }
            | Self::ImageTooLarge { .. }
            | Self::UnsupportedImageType { .. } => "images",
        }
    }
}

impl fmt::Display for ListingValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "{field} must not be empty"),
            Self::YearOutOfRange { min, max } => {
                write!(f, "year must be between {min} and {max}")
            }
            Self::NonPositivePrice => write!(f, "price must be greater than zero"),
            Self::OldPriceNotAbovePrice => {
                write!(f, "oldPrice must be greater than price")
            }
            Self::NegativeKilometers => write!(f, "kilometers must not be negative"),
            Self::NegativeOwners => write!(f, "owners must not be negative"),
            Self::SeatingCapacityOutOfRange => write!(
                f,
                "seatingCapacity must be between {} and {}",
                SEATING_CAPACITY_RANGE.start(),
                SEATING_CAPACITY_RANGE.end()
            ),
            Self::InvalidSellerType => write!(f, "sellerType must be dealer or individual"),
            Self::TooManyImages { max } => write!(f, "a listing may have at most {max} images"),
            Self::EmptyImage { index } => write!(f, "image {index} is empty"),
            Self::ImageTooLarge { index, max } => {
                write!(f, "image {index} exceeds the {max} byte limit")
            }
            Self::UnsupportedImageType { index } => {
                write!(f, "image {index} must have an image/* content type")
            }
        }
    }
}

impl std::error::Error for ListingValidationError {}

fn require(value: &str, field: &'static str) -> Result<(), ListingValidationError> {
    if value.trim().is_empty() {
        return Err(ListingValidationError::MissingField { field });
    }
    Ok(())
}

impl ListingDetails {
    /// Check field invariants. `now` bounds the model year to next year.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), ListingValidationError> {
        require(&self.title, "title")?;
        require(&self.brand, "brand")?;
        require(&self.model, "model")?;
        require(&self.location, "location")?;

        let max_year = now.year() + 1;
        if !(MIN_MODEL_YEAR..=max_year).contains(&self.year) {
            return Err(ListingValidationError::YearOutOfRange {
                min: MIN_MODEL_YEAR,
                max: max_year,
            });
        }
        if self.price <= 0 {
            return Err(ListingValidationError::NonPositivePrice);
        }
        if self.old_price.is_some_and(|old| old <= self.price) {
            return Err(ListingValidationError::OldPriceNotAbovePrice);
        }
        if self.kilometers < 0 {
            return Err(ListingValidationError::NegativeKilometers);
        }
        if self.owners < 0 {
            return Err(ListingValidationError::NegativeOwners);
        }
        if !SEATING_CAPACITY_RANGE.contains(&self.specifications.seating_capacity) {
            return Err(ListingValidationError::SeatingCapacityOutOfRange);
        }
        Ok(())
    }
}

/// Image payload awaiting upload.
#[derive(Clone, PartialEq, Eq)]
pub struct NewImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for NewImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewImage")
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Validate a batch of uploads that will be appended to `existing` images.
pub fn validate_new_images(
    images: &[NewImage],
    existing: usize,
) -> Result<(), ListingValidationError> {
    if existing + images.len() > MAX_IMAGES {
        return Err(ListingValidationError::TooManyImages { max: MAX_IMAGES });
    }
    for (index, image) in images.iter().enumerate() {
        if image.bytes.is_empty() {
            return Err(ListingValidationError::EmptyImage { index });
        }
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(ListingValidationError::ImageTooLarge {
                index,
                max: MAX_IMAGE_BYTES,
            });
        }
        if !image.content_type.starts_with("image/") {
            return Err(ListingValidationError::UnsupportedImageType { index });
        }
    }
    Ok(())
}

/// Persisted listing.
///
/// ## Invariants
/// - `images` is never absent; a listing without pictures has an empty list.
/// - `revision` starts at 1 and increments on every successful write.
/// - `updated_at` strictly increases across writes (see [`next_timestamp`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub id: ListingId,
    pub details: ListingDetails,
    pub seller: Seller,
    pub images: Vec<ListingImage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub revision: u32,
}

impl Listing {
    /// Whether `user` owns this listing.
    pub fn is_owned_by(&self, user: &UserId) -> bool {
        &self.seller.user_id == user
    }
}

/// Timestamp for the next write, strictly after `previous`.
///
/// A clock that has not advanced (or moved backwards) yields `previous` plus
/// one microsecond; storage keeps microsecond precision.
pub fn next_timestamp(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    let now = truncate_to_micros(now);
    if now > previous {
        now
    } else {
        previous + Duration::microseconds(1)
    }
}

/// Drop sub-microsecond precision so in-memory values match stored values.
pub fn truncate_to_micros(at: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(at.timestamp_micros()).unwrap_or(at)
}

/// Partial update of the seller-editable fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPatch {
    pub title: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub price: Option<i64>,
    /// `Some(None)` clears the previous price.
    pub old_price: Option<Option<i64>>,
    pub kilometers: Option<i64>,
    pub fuel_type: Option<String>,
    pub transmission: Option<String>,
    pub body_type: Option<String>,
    pub owners: Option<i32>,
    pub location: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub specifications: Option<Specifications>,
    pub is_new: Option<bool>,
    pub is_featured: Option<bool>,
    pub is_reduced: Option<bool>,
    pub seller_type: Option<SellerType>,
    pub seller_name: Option<String>,
    pub seller_contact: Option<String>,
}

macro_rules! patch_fields {
    ($patch:ident, $target:ident; $($field:ident),* $(,)?) => {
        $(
            if let Some(value) = $patch.$field {
                $target.$field = value;
            }
        )*
    };
}

impl ListingPatch {
    /// Apply the patch to `listing`, returning the updated copy.
    pub fn apply_to(self, listing: &Listing) -> Listing {
        let mut updated = listing.clone();
        let details = &mut updated.details;
        let patch = self;
        if let Some(seller_type) = patch.seller_type {
            updated.seller.seller_type = seller_type;
        }
        if let Some(name) = patch.seller_name {
            updated.seller.name = name;
        }
        if let Some(contact) = patch.seller_contact {
            updated.seller.contact = contact;
        }
        patch_fields!(
            patch, details;
            title, brand, model, year, price, old_price, kilometers, fuel_type,
            transmission, body_type, owners, location, description, features,
            specifications, is_new, is_featured, is_reduced,
        );
        updated
    }
}
