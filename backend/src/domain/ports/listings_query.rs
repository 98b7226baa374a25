//! Driving port for reading listings.
//!
//! Inbound adapters use this port for the browse, detail and "similar cars"
//! views without touching persistence concerns.

use async_trait::async_trait;

use crate::domain::{Error, Listing, ListingId, ListingPage, ListingQuery};

/// Number of listings returned by [`ListingsQuery::similar`].
pub const SIMILAR_LIMIT: usize = 3;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingsQuery: Send + Sync {
    /// Run a filtered, sorted, paginated search.
    async fn search(&self, query: ListingQuery) -> Result<ListingPage, Error>;

    /// Fetch one listing or fail with `not_found`.
    async fn get(&self, id: &ListingId) -> Result<Listing, Error>;

    /// Up to [`SIMILAR_LIMIT`] listings sharing the body type, topped up with
    /// listings of the same brand. The listing itself is never included.
    async fn similar(&self, id: &ListingId) -> Result<Vec<Listing>, Error>;
}
