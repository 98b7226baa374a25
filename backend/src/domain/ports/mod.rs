//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driving ports (`ListingsQuery`, `ListingsCommand`, `FavoritesCommand`,
//! `FavoritesQuery`, `AuthService`, `UserProfileQuery`, `UserProfileCommand`)
//! are implemented by domain services and called by inbound adapters. Driven
//! ports (repositories, the image store, the password hasher and the reset
//! notifier) are implemented by outbound adapters.

mod macros;
pub(crate) use macros::define_port_error;

mod auth_service;
mod favorites;
mod favorites_repository;
mod image_store;
mod listing_repository;
mod listings_command;
mod listings_query;
mod password_hasher;
mod password_reset_notifier;
mod password_reset_repository;
mod user_profile;
mod user_repository;

#[cfg(test)]
pub use auth_service::MockAuthService;
pub use auth_service::AuthService;
#[cfg(test)]
pub use favorites::{MockFavoritesCommand, MockFavoritesQuery};
pub use favorites::{FavoritesCommand, FavoritesQuery};
#[cfg(test)]
pub use favorites_repository::MockFavoritesRepository;
pub use favorites_repository::{FavoritesRepository, FavoritesRepositoryError};
#[cfg(test)]
pub use image_store::MockImageStore;
pub use image_store::{
    ImageStore, ImageStoreError, StoredImage, content_type_for, extension_for,
};
#[cfg(test)]
pub use listing_repository::MockListingRepository;
pub use listing_repository::{ListingRepository, ListingRepositoryError};
#[cfg(test)]
pub use listings_command::MockListingsCommand;
pub use listings_command::{
    CreateListingRequest, ListingsCommand, UpdateListingRequest, UpdateListingResponse,
};
#[cfg(test)]
pub use listings_query::MockListingsQuery;
pub use listings_query::{ListingsQuery, SIMILAR_LIMIT};
#[cfg(test)]
pub use password_hasher::MockPasswordHasher;
pub use password_hasher::{PasswordHasher, PasswordHasherError};
#[cfg(test)]
pub use password_reset_notifier::MockPasswordResetNotifier;
pub use password_reset_notifier::{PasswordResetNotifier, PasswordResetNotifierError};
#[cfg(test)]
pub use password_reset_repository::MockPasswordResetRepository;
pub use password_reset_repository::{
    PasswordResetRecord, PasswordResetRepository, PasswordResetRepositoryError,
};
#[cfg(test)]
pub use user_profile::{MockUserProfileCommand, MockUserProfileQuery};
pub use user_profile::{UserProfileCommand, UserProfileQuery};
#[cfg(test)]
pub use user_repository::MockUserRepository;
pub use user_repository::{StoredCredentials, UserRepository, UserRepositoryError};
