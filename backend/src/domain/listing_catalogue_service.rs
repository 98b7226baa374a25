//! Read side of the listing catalogue.
//!
//! Implements [`ListingsQuery`] over a [`ListingRepository`]. Searches are
//! planned by [`QueryPlan::from_query`]; when a range filter is held back for
//! post-fetch evaluation this service scans store batches until the page is
//! full, the store is exhausted, or [`MAX_SCAN_BATCHES`] batches were read.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::domain::listing_query::MAX_SCAN_BATCHES;
use crate::domain::ports::{
    ListingRepository, ListingRepositoryError, ListingsQuery, SIMILAR_LIMIT,
};
use crate::domain::{
    Error, Listing, ListingCursor, ListingFilter, ListingId, ListingPage, ListingQuery,
    ListingSort, QueryPlan, StoreQuery,
};

/// Listing query service implementing the driving port.
#[derive(Clone)]
pub struct ListingCatalogueService<L> {
    listings: Arc<L>,
}

impl<L> ListingCatalogueService<L> {
    /// Create a new service over the given repository.
    pub fn new(listings: Arc<L>) -> Self {
        Self { listings }
    }
}

/// Map repository failures onto domain errors.
pub(crate) fn map_listing_error(error: ListingRepositoryError) -> Error {
    match error {
        ListingRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("listing repository unavailable: {message}"))
        }
        ListingRepositoryError::Query { message } => {
            Error::internal(format!("listing repository error: {message}"))
        }
        ListingRepositoryError::Missing { id } => Error::not_found(format!("listing {id} not found")),
        ListingRepositoryError::RevisionMismatch { expected, actual } => {
            revision_conflict(expected, actual)
        }
    }
}

pub(crate) fn revision_conflict(expected: u32, actual: u32) -> Error {
    Error::conflict("revision mismatch").with_details(json!({
        "expectedRevision": expected,
        "actualRevision": actual,
        "code": "revision_mismatch",
    }))
}

impl<L> ListingCatalogueService<L>
where
    L: ListingRepository,
{
    async fn fetch(&self, query: &StoreQuery) -> Result<Vec<Listing>, Error> {
        self.listings.search(query).await.map_err(map_listing_error)
    }

    async fn single_batch_page(&self, plan: QueryPlan) -> Result<ListingPage, Error> {
        let mut listings = self.fetch(&plan.store).await?;
        let next = if listings.len() > plan.limit {
            listings.truncate(plan.limit);
            listings
                .last()
                .map(|last| ListingCursor::after(last, plan.store.sort))
        } else {
            None
        };
        Ok(ListingPage {
            listings,
            next,
            limit: plan.limit,
        })
    }

    async fn scanning_page(&self, plan: QueryPlan) -> Result<ListingPage, Error> {
        let sort = plan.store.sort;
        let mut store = plan.store.clone();
        let mut listings = Vec::with_capacity(plan.limit);
        let mut last_scanned: Option<ListingCursor> = None;

        for _ in 0..MAX_SCAN_BATCHES {
            let batch = self.fetch(&store).await?;
            let exhausted = batch.len() < store.fetch;
            let mut rows = batch.into_iter();

            while let Some(listing) = rows.next() {
                let position = ListingCursor::after(&listing, sort);
                last_scanned = Some(position);
                if plan.post_filter_accepts(&listing) {
                    listings.push(listing);
                }
                if listings.len() == plan.limit {
                    let more = rows.len() > 0 || !exhausted;
                    return Ok(ListingPage {
                        listings,
                        next: more.then_some(position),
                        limit: plan.limit,
                    });
                }
            }

            if exhausted {
                return Ok(ListingPage {
                    listings,
                    next: None,
                    limit: plan.limit,
                });
            }
            store.after = last_scanned;
        }

        tracing::debug!(
            scanned_batches = MAX_SCAN_BATCHES,
            returned = listings.len(),
            "listing scan budget exhausted; resuming from last scanned row"
        );
        Ok(ListingPage {
            listings,
            next: last_scanned,
            limit: plan.limit,
        })
    }

    async fn top_up(
        &self,
        picks: &mut Vec<Listing>,
        source: &Listing,
        filter: ListingFilter,
    ) -> Result<(), Error> {
        let wanted = SIMILAR_LIMIT - picks.len();
        let query = StoreQuery {
            filter,
            sort: ListingSort::default(),
            after: None,
            fetch: wanted + picks.len() + 1,
        };
        for candidate in self.fetch(&query).await? {
            if picks.len() == SIMILAR_LIMIT {
                break;
            }
            let duplicate = candidate.id == source.id || picks.iter().any(|p| p.id == candidate.id);
            if !duplicate {
                picks.push(candidate);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<L> ListingsQuery for ListingCatalogueService<L>
where
    L: ListingRepository,
{
    async fn search(&self, query: ListingQuery) -> Result<ListingPage, Error> {
        let plan = QueryPlan::from_query(query)
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        if plan.post_filter.is_some() {
            self.scanning_page(plan).await
        } else {
            self.single_batch_page(plan).await
        }
    }

    async fn get(&self, id: &ListingId) -> Result<Listing, Error> {
        self.listings
            .find(id)
            .await
            .map_err(map_listing_error)?
            .ok_or_else(|| Error::not_found(format!("listing {id} not found")))
    }

    async fn similar(&self, id: &ListingId) -> Result<Vec<Listing>, Error> {
        let source = self.get(id).await?;
        let mut picks = Vec::with_capacity(SIMILAR_LIMIT);

        let same_body = ListingFilter {
            body_types: vec![source.details.body_type.clone()],
            ..ListingFilter::default()
        };
        self.top_up(&mut picks, &source, same_body).await?;

        if picks.len() < SIMILAR_LIMIT {
            let same_brand = ListingFilter {
                brands: vec![source.details.brand.clone()],
                ..ListingFilter::default()
            };
            self.top_up(&mut picks, &source, same_brand).await?;
        }
        Ok(picks)
    }
}

#[cfg(test)]
#[path = "listing_catalogue_service_tests.rs"]
mod tests;
