//! In-memory favourites relation.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{FavoritesRepository, FavoritesRepositoryError};
use crate::domain::{ListingId, UserId};

/// `(user, listing)` pairs kept in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryFavoritesRepository {
    pairs: RwLock<Vec<(UserId, ListingId)>>,
}

impl InMemoryFavoritesRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl FavoritesRepository for InMemoryFavoritesRepository {
    async fn add(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, FavoritesRepositoryError> {
        let mut pairs = self.pairs.write().await;
        if pairs.iter().any(|(u, l)| u == user && l == listing) {
            return Ok(false);
        }
        pairs.push((user.clone(), *listing));
        Ok(true)
    }

    async fn remove(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, FavoritesRepositoryError> {
        let mut pairs = self.pairs.write().await;
        let before = pairs.len();
        pairs.retain(|(u, l)| !(u == user && l == listing));
        Ok(pairs.len() != before)
    }

    async fn contains(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, FavoritesRepositoryError> {
        let pairs = self.pairs.read().await;
        Ok(pairs.iter().any(|(u, l)| u == user && l == listing))
    }

    async fn listing_ids(&self, user: &UserId) -> Result<Vec<ListingId>, FavoritesRepositoryError> {
        let pairs = self.pairs.read().await;
        Ok(pairs
            .iter()
            .rev()
            .filter(|(u, _)| u == user)
            .map(|(_, listing)| *listing)
            .collect())
    }

    async fn remove_listing(&self, listing: &ListingId) -> Result<usize, FavoritesRepositoryError> {
        let mut pairs = self.pairs.write().await;
        let before = pairs.len();
        pairs.retain(|(_, l)| l != listing);
        Ok(before - pairs.len())
    }
}
