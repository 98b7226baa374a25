//! Port for the user/listing favourite relation.
//!
//! Favourites are stored as `(user, listing)` pairs with set semantics:
//! adding an existing pair and removing an absent one are no-ops, so
//! concurrent toggles from several sessions never lose each other's writes.

use async_trait::async_trait;

use crate::domain::{ListingId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by favourites repository adapters.
    pub enum FavoritesRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "favorites repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "favorites repository query failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesRepository: Send + Sync {
    /// Insert the pair if absent. Returns `true` when a row was added.
    async fn add(&self, user: &UserId, listing: &ListingId)
    -> Result<bool, FavoritesRepositoryError>;

    /// Delete the pair if present. Returns `true` when a row was removed.
    async fn remove(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, FavoritesRepositoryError>;

    async fn contains(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, FavoritesRepositoryError>;

    /// Favourite listing ids of `user`, most recently added first.
    async fn listing_ids(&self, user: &UserId) -> Result<Vec<ListingId>, FavoritesRepositoryError>;

    /// Drop every favourite pointing at `listing`, returning the count removed.
    async fn remove_listing(&self, listing: &ListingId) -> Result<usize, FavoritesRepositoryError>;
}
