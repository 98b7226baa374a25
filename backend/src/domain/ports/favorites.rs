//! Driving ports for favourites.

use async_trait::async_trait;

use crate::domain::{Error, Listing, ListingId, UserId};

/// Commands changing a user's favourites.
///
/// Every method returns the favourite state after the call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesCommand: Send + Sync {
    /// Set the favourite state explicitly; repeating a call is a no-op.
    async fn set_favorite(
        &self,
        user: &UserId,
        listing: &ListingId,
        favorite: bool,
    ) -> Result<bool, Error>;

    /// Flip the favourite state.
    async fn toggle_favorite(&self, user: &UserId, listing: &ListingId) -> Result<bool, Error>;
}

/// Queries over a user's favourites.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait FavoritesQuery: Send + Sync {
    async fn favorite_ids(&self, user: &UserId) -> Result<Vec<ListingId>, Error>;

    /// Favourite listings, most recently added first.
    async fn favorite_listings(&self, user: &UserId) -> Result<Vec<Listing>, Error>;
}
