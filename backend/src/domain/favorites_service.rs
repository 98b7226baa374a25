//! Per-user favourite listings.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::listing_catalogue_service::map_listing_error;
use crate::domain::listing_command_service::map_favorites_error;
use crate::domain::ports::{
    FavoritesCommand, FavoritesQuery, FavoritesRepository, ListingRepository,
};
use crate::domain::{Error, Listing, ListingId, UserId};

/// Favourites service implementing both favourite ports.
#[derive(Clone)]
pub struct FavoritesService<F, L> {
    favorites: Arc<F>,
    listings: Arc<L>,
}

impl<F, L> FavoritesService<F, L> {
    /// Create a new service.
    pub fn new(favorites: Arc<F>, listings: Arc<L>) -> Self {
        Self {
            favorites,
            listings,
        }
    }
}

impl<F, L> FavoritesService<F, L>
where
    F: FavoritesRepository,
    L: ListingRepository,
{
    async fn ensure_listing_exists(&self, listing: &ListingId) -> Result<(), Error> {
        match self.listings.find(listing).await.map_err(map_listing_error)? {
            Some(_) => Ok(()),
            None => Err(Error::not_found(format!("listing {listing} not found"))),
        }
    }
}

#[async_trait]
impl<F, L> FavoritesCommand for FavoritesService<F, L>
where
    F: FavoritesRepository,
    L: ListingRepository,
{
    async fn set_favorite(
        &self,
        user: &UserId,
        listing: &ListingId,
        favorite: bool,
    ) -> Result<bool, Error> {
        if favorite {
            self.ensure_listing_exists(listing).await?;
            self.favorites
                .add(user, listing)
                .await
                .map_err(map_favorites_error)?;
        } else {
            // Unfavouriting a deleted listing is harmless.
            self.favorites
                .remove(user, listing)
                .await
                .map_err(map_favorites_error)?;
        }
        Ok(favorite)
    }

    async fn toggle_favorite(&self, user: &UserId, listing: &ListingId) -> Result<bool, Error> {
        let current = self
            .favorites
            .contains(user, listing)
            .await
            .map_err(map_favorites_error)?;
        self.set_favorite(user, listing, !current).await
    }
}

#[async_trait]
impl<F, L> FavoritesQuery for FavoritesService<F, L>
where
    F: FavoritesRepository,
    L: ListingRepository,
{
    async fn favorite_ids(&self, user: &UserId) -> Result<Vec<ListingId>, Error> {
        self.favorites
            .listing_ids(user)
            .await
            .map_err(map_favorites_error)
    }

    async fn favorite_listings(&self, user: &UserId) -> Result<Vec<Listing>, Error> {
        let ids = self.favorite_ids(user).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut found: HashMap<ListingId, Listing> = self
            .listings
            .find_many(&ids)
            .await
            .map_err(map_listing_error)?
            .into_iter()
            .map(|listing| (listing.id, listing))
            .collect();
        // Favourites whose listing has gone are skipped.
        Ok(ids.iter().filter_map(|id| found.remove(id)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::ports::{FavoritesRepositoryError, MockFavoritesRepository};
    use crate::domain::test_support::{listing_fixture, seed};
    use crate::outbound::memory::{InMemoryFavoritesRepository, InMemoryListingRepository};
    use rstest::rstest;

    type Service = FavoritesService<InMemoryFavoritesRepository, InMemoryListingRepository>;

    async fn service_with(listings: Vec<Listing>) -> Service {
        let repo = Arc::new(InMemoryListingRepository::new());
        seed(&repo, listings).await;
        FavoritesService::new(Arc::new(InMemoryFavoritesRepository::new()), repo)
    }

    #[rstest]
    #[tokio::test]
    async fn toggle_flips_membership() {
        let listing = listing_fixture(|_| {});
        let service = service_with(vec![listing.clone()]).await;
        let user = UserId::random();

        assert!(service.toggle_favorite(&user, &listing.id).await.expect("on"));
        assert_eq!(
            service.favorite_ids(&user).await.expect("ids"),
            vec![listing.id]
        );
        assert!(!service.toggle_favorite(&user, &listing.id).await.expect("off"));
        assert!(service.favorite_ids(&user).await.expect("ids").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn favouriting_a_missing_listing_is_not_found() {
        let service = service_with(Vec::new()).await;
        let err = service
            .set_favorite(&UserId::random(), &ListingId::random(), true)
            .await
            .expect_err("missing listing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn setting_is_idempotent() {
        let listing = listing_fixture(|_| {});
        let service = service_with(vec![listing.clone()]).await;
        let user = UserId::random();

        for _ in 0..2 {
            assert!(service.set_favorite(&user, &listing.id, true).await.expect("set"));
        }
        assert_eq!(service.favorite_ids(&user).await.expect("ids").len(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn favorite_listings_follow_favourite_order_and_skip_deleted() {
        let first = listing_fixture(|_| {});
        let second = listing_fixture(|_| {});
        let gone = listing_fixture(|_| {});
        let listings = Arc::new(InMemoryListingRepository::new());
        seed(&listings, [first.clone(), second.clone(), gone.clone()]).await;
        let service = FavoritesService::new(
            Arc::new(InMemoryFavoritesRepository::new()),
            listings.clone(),
        );
        let user = UserId::random();
        for id in [first.id, gone.id, second.id] {
            service.set_favorite(&user, &id, true).await.expect("set");
        }
        listings
            .delete(&gone.id, gone.revision)
            .await
            .expect("delete");

        let found: Vec<ListingId> = service
            .favorite_listings(&user)
            .await
            .expect("listings")
            .into_iter()
            .map(|listing| listing.id)
            .collect();

        assert_eq!(found, vec![second.id, first.id]);
    }

    #[rstest]
    #[tokio::test]
    async fn repository_outage_maps_to_service_unavailable() {
        let mut favorites = MockFavoritesRepository::new();
        favorites
            .expect_listing_ids()
            .times(1)
            .return_once(|_| Err(FavoritesRepositoryError::connection("refused")));
        let service = FavoritesService::new(
            Arc::new(favorites),
            Arc::new(InMemoryListingRepository::new()),
        );

        let err = service
            .favorite_ids(&UserId::random())
            .await
            .expect_err("outage");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
