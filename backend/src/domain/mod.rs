//! Domain primitives, aggregates and services.
//!
//! Purpose: Define strongly typed marketplace entities (listings, accounts,
//! favourites) and the services that drive them through ports. Keep types
//! immutable where possible and document invariants and serialisation
//! contracts (serde) in each type's Rustdoc.
//!
//! Public surface:
//! - Error (alias to `error::Error`): API error response payload.
//! - ErrorCode (alias to `error::ErrorCode`): stable error identifier.
//! - Listing and its value types: the car-for-sale aggregate.
//! - ListingQuery / QueryPlan: filtered, keyset-paginated searches.
//! - UserAccount and credentials: registered users and auth inputs.
//! - Services implementing the driving ports in [`ports`].

pub mod account_service;
pub mod auth;
pub mod error;
pub mod favorites_service;
pub mod listing;
pub mod listing_catalogue_service;
pub mod listing_command_service;
pub mod listing_query;
pub mod ports;
pub mod trace_id;
pub mod user;

#[cfg(test)]
pub(crate) mod test_support;

pub use self::account_service::{AccountService, RESET_TOKEN_TTL_SECS};
pub use self::auth::{
    AuthValidationError, LoginCredentials, PASSWORD_MIN_LEN, Password,
    PasswordResetConfirmation, Registration, ResetToken,
};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::favorites_service::FavoritesService;
pub use self::listing::{
    Listing, ListingDetails, ListingId, ListingImage, ListingPatch, ListingValidationError,
    MAX_IMAGE_BYTES, MAX_IMAGES, MIN_MODEL_YEAR, NewImage, SEATING_CAPACITY_RANGE, Seller,
    SellerType, Specifications, next_timestamp, truncate_to_micros, validate_new_images,
};
pub use self::listing_catalogue_service::ListingCatalogueService;
pub use self::listing_command_service::ListingCommandService;
pub use self::listing_query::{
    ListingCursor, ListingFilter, ListingPage, ListingQuery, ListingQueryError, ListingSort,
    NumericRange, QueryPlan, RangeField, SortDirection, SortField, StoreQuery, sort_value,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    DISPLAY_NAME_MAX, DISPLAY_NAME_MIN, DisplayName, EmailAddress, ProfileUpdate, UserAccount,
    UserId, UserValidationError, parse_photo_url,
};

/// Convenient API result alias.
///
/// # Examples
/// ```
/// use actix_web::HttpResponse;
/// use carlot::domain::{ApiResult, Error};
///
/// fn handler() -> ApiResult<HttpResponse> {
///     Err(Error::forbidden("nope"))
/// }
/// ```
pub type ApiResult<T> = Result<T, Error>;
