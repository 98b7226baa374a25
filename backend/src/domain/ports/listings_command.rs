//! Driving port for listing writes.
//!
//! Create, update and delete are multi-step writes spanning the listing
//! repository and the image store. Implementations compensate completed steps
//! when a later step fails so callers never observe a half-written listing.

use async_trait::async_trait;

use crate::domain::{
    Error, Listing, ListingDetails, ListingId, ListingPatch, NewImage, Seller, UserId,
};

/// Request to publish a new listing.
#[derive(Debug, Clone)]
pub struct CreateListingRequest {
    pub seller: Seller,
    pub details: ListingDetails,
    pub images: Vec<NewImage>,
}

/// Request to modify an existing listing.
#[derive(Debug, Clone)]
pub struct UpdateListingRequest {
    pub listing_id: ListingId,
    pub user_id: UserId,
    pub patch: ListingPatch,
    pub new_images: Vec<NewImage>,
    /// Images to drop, named by public URL or object key.
    pub remove_images: Vec<String>,
    pub expected_revision: u32,
}

/// Result of a successful update.
#[derive(Debug, Clone)]
pub struct UpdateListingResponse {
    pub listing: Listing,
    /// Keys of removed images whose objects could not be deleted.
    pub orphaned_keys: Vec<String>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ListingsCommand: Send + Sync {
    async fn create(&self, request: CreateListingRequest) -> Result<Listing, Error>;

    async fn update(&self, request: UpdateListingRequest) -> Result<UpdateListingResponse, Error>;

    /// Delete a listing owned by `user_id` together with its images and
    /// favourites.
    async fn delete(&self, listing_id: &ListingId, user_id: &UserId) -> Result<(), Error>;
}
