//! In-memory listing repository.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::ports::{ListingRepository, ListingRepositoryError};
use crate::domain::{Listing, ListingId, StoreQuery};

/// Listing store backed by a hash map.
#[derive(Debug, Default)]
pub struct InMemoryListingRepository {
    listings: RwLock<HashMap<ListingId, Listing>>,
}

impl InMemoryListingRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored listings.
    pub async fn len(&self) -> usize {
        self.listings.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.listings.read().await.is_empty()
    }
}

#[async_trait]
impl ListingRepository for InMemoryListingRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), ListingRepositoryError> {
        let mut listings = self.listings.write().await;
        if listings.contains_key(&listing.id) {
            return Err(ListingRepositoryError::query(format!(
                "listing {} already exists",
                listing.id
            )));
        }
        listings.insert(listing.id, listing.clone());
        Ok(())
    }

    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, ListingRepositoryError> {
        Ok(self.listings.read().await.get(id).cloned())
    }

    async fn find_many(&self, ids: &[ListingId]) -> Result<Vec<Listing>, ListingRepositoryError> {
        let listings = self.listings.read().await;
        Ok(ids.iter().filter_map(|id| listings.get(id).cloned()).collect())
    }

    async fn search(&self, query: &StoreQuery) -> Result<Vec<Listing>, ListingRepositoryError> {
        let listings = self.listings.read().await;
        let mut matches: Vec<Listing> = listings
            .values()
            .filter(|listing| query.filter.matches(listing))
            .filter(|listing| query.after.is_none_or(|cursor| cursor.admits(listing)))
            .cloned()
            .collect();
        matches.sort_by(|a, b| query.sort.compare(a, b));
        matches.truncate(query.fetch);
        Ok(matches)
    }

    async fn update(
        &self,
        listing: &Listing,
        expected_revision: u32,
    ) -> Result<(), ListingRepositoryError> {
        let mut listings = self.listings.write().await;
        let stored = listings
            .get_mut(&listing.id)
            .ok_or_else(|| ListingRepositoryError::missing(listing.id.to_string()))?;
        check_revision(stored, expected_revision)?;
        *stored = listing.clone();
        Ok(())
    }

    async fn delete(
        &self,
        id: &ListingId,
        expected_revision: u32,
    ) -> Result<(), ListingRepositoryError> {
        let mut listings = self.listings.write().await;
        let stored = listings
            .get(id)
            .ok_or_else(|| ListingRepositoryError::missing(id.to_string()))?;
        check_revision(stored, expected_revision)?;
        listings.remove(id);
        Ok(())
    }
}

fn check_revision(stored: &Listing, expected_revision: u32) -> Result<(), ListingRepositoryError> {
    if stored.revision == expected_revision {
        Ok(())
    } else {
        Err(ListingRepositoryError::revision_mismatch(
            expected_revision,
            stored.revision,
        ))
    }
}
