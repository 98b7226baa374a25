//! Port for listing persistence.
//!
//! Adapters store listings and answer keyset searches described by
//! [`StoreQuery`]. Writes use optimistic concurrency: an update or delete
//! names the revision it was based on and fails with
//! [`ListingRepositoryError::RevisionMismatch`] when another writer got there
//! first.

use async_trait::async_trait;

use crate::domain::{Listing, ListingId, StoreQuery};

use super::define_port_error;

define_port_error! {
    /// Errors raised by listing repository adapters.
    pub enum ListingRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "listing repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "listing repository query failed: {message}",
        /// The listing no longer exists.
        Missing { id: String } => "listing {id} not found",
        /// Optimistic concurrency check failed.
        RevisionMismatch { expected: u32, actual: u32 } =>
            "revision mismatch: expected {expected}, found {actual}",
    }
}

/// Port for listing storage and search.
///
/// # Search contract
///
/// [`ListingRepository::search`] returns at most `query.fetch` listings that
/// satisfy `query.filter`, ordered by `query.sort` with the listing id as a
/// tie breaker, starting strictly after `query.after`. The filter carries at
/// most one range predicate.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingRepository: Send + Sync {
    /// Persist a new listing.
    async fn insert(&self, listing: &Listing) -> Result<(), ListingRepositoryError>;

    /// Fetch one listing.
    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, ListingRepositoryError>;

    /// Fetch several listings; unknown ids are skipped and order is unspecified.
    async fn find_many(&self, ids: &[ListingId]) -> Result<Vec<Listing>, ListingRepositoryError>;

    /// Run a keyset search.
    async fn search(&self, query: &StoreQuery) -> Result<Vec<Listing>, ListingRepositoryError>;

    /// Replace a listing if its stored revision equals `expected_revision`.
    ///
    /// The caller sets `listing.revision` to the new value.
    async fn update(
        &self,
        listing: &Listing,
        expected_revision: u32,
    ) -> Result<(), ListingRepositoryError>;

    /// Delete a listing if its stored revision equals `expected_revision`.
    ///
    /// Fails with [`ListingRepositoryError::Missing`] when the listing is
    /// absent and [`ListingRepositoryError::RevisionMismatch`] when it changed.
    async fn delete(
        &self,
        id: &ListingId,
        expected_revision: u32,
    ) -> Result<(), ListingRepositoryError>;
}
