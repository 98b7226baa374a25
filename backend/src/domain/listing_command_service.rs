//! Write side of the listing catalogue.
//!
//! Listing writes span two stores: the listing repository and the image
//! store. Each operation runs as a saga whose completed steps are undone when
//! a later step fails:
//!
//! - create: insert the document with no images, upload, attach images.
//!   A failure after the insert deletes the uploaded objects and the document.
//! - update: upload new images, then write the document with a revision
//!   check. A failed write deletes the new uploads. Removed images are
//!   deleted after the write commits; objects that cannot be deleted are
//!   reported back as orphaned keys.
//! - delete: delete images first. When any deletion fails the listing keeps
//!   the images that remain and the call fails with `service_unavailable`,
//!   so a retry can finish the job. The document delete is revision-checked;
//!   if a concurrent update won, the listing is reloaded and its images swept
//!   again. Favourites go last.
//!
//! Every committed document write bumps the revision, so a listing created
//! with images is at revision 2 once they are attached.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use serde_json::json;
use uuid::Uuid;

use crate::domain::listing_catalogue_service::{map_listing_error, revision_conflict};
use crate::domain::ports::{
    CreateListingRequest, FavoritesRepository, FavoritesRepositoryError, ImageStore,
    ImageStoreError, ListingRepository, ListingRepositoryError, ListingsCommand, UpdateListingRequest,
    UpdateListingResponse, extension_for,
};
use crate::domain::{
    Error, Listing, ListingId, ListingImage, ListingValidationError, NewImage, UserId,
    next_timestamp, truncate_to_micros, validate_new_images,
};

/// Sweeps a delete may run before giving up with a conflict.
const DELETE_ATTEMPTS: usize = 3;

/// Listing command service implementing the driving port.
#[derive(Clone)]
pub struct ListingCommandService<L, F, S> {
    listings: Arc<L>,
    favorites: Arc<F>,
    images: Arc<S>,
    clock: Arc<dyn Clock>,
}

impl<L, F, S> ListingCommandService<L, F, S> {
    /// Create a new service.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use carlot::domain::ListingCommandService;
    /// use carlot::outbound::memory::{
    ///     InMemoryFavoritesRepository, InMemoryImageStore, InMemoryListingRepository,
    /// };
    /// use mockable::DefaultClock;
    /// use url::Url;
    ///
    /// let base = Url::parse("http://localhost:8080/media/").expect("valid URL");
    /// let _service = ListingCommandService::new(
    ///     Arc::new(InMemoryListingRepository::new()),
    ///     Arc::new(InMemoryFavoritesRepository::new()),
    ///     Arc::new(InMemoryImageStore::new(base)),
    ///     Arc::new(DefaultClock),
    /// );
    /// ```
    pub fn new(
        listings: Arc<L>,
        favorites: Arc<F>,
        images: Arc<S>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            listings,
            favorites,
            images,
            clock,
        }
    }
}

pub(crate) fn invalid_listing(error: ListingValidationError) -> Error {
    Error::invalid_request(error.to_string()).with_details(json!({ "field": error.field() }))
}

pub(crate) fn map_image_error(error: ImageStoreError) -> Error {
    match error {
        ImageStoreError::Unavailable { message } => {
            Error::service_unavailable(format!("image store unavailable: {message}"))
        }
        ImageStoreError::Io { key, message } => {
            Error::service_unavailable(format!("image store failed for {key}: {message}"))
        }
        ImageStoreError::InvalidKey { key } => Error::internal(format!("invalid object key: {key}")),
    }
}

pub(crate) fn map_favorites_error(error: FavoritesRepositoryError) -> Error {
    match error {
        FavoritesRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("favorites repository unavailable: {message}"))
        }
        FavoritesRepositoryError::Query { message } => {
            Error::internal(format!("favorites repository error: {message}"))
        }
    }
}

fn names_image(name: &str, image: &ListingImage) -> bool {
    name == image.key || name == image.url.as_str()
}

fn object_key(listing: &ListingId, content_type: &str) -> String {
    format!(
        "listings/{listing}/{}.{}",
        Uuid::new_v4(),
        extension_for(content_type)
    )
}

impl<L, F, S> ListingCommandService<L, F, S>
where
    L: ListingRepository,
    F: FavoritesRepository,
    S: ImageStore,
{
    fn now(&self) -> chrono::DateTime<chrono::Utc> {
        truncate_to_micros(self.clock.utc())
    }

    async fn load_owned(&self, id: &ListingId, user: &UserId) -> Result<Listing, Error> {
        let listing = self
            .listings
            .find(id)
            .await
            .map_err(map_listing_error)?
            .ok_or_else(|| Error::not_found(format!("listing {id} not found")))?;
        if !listing.is_owned_by(user) {
            return Err(Error::forbidden("only the seller may modify this listing"));
        }
        Ok(listing)
    }

    /// Upload every image. On failure, objects uploaded so far are deleted
    /// before the error is returned.
    async fn upload_all(
        &self,
        listing: &ListingId,
        images: Vec<NewImage>,
    ) -> Result<Vec<ListingImage>, Error> {
        let mut uploaded = Vec::with_capacity(images.len());
        for image in images {
            let key = object_key(listing, &image.content_type);
            match self.images.put(&key, &image.content_type, image.bytes).await {
                Ok(url) => uploaded.push(ListingImage { key, url }),
                Err(err) => {
                    tracing::warn!(
                        listing_id = %listing,
                        key = %key,
                        error = %err,
                        "image upload failed; removing uploads from this request"
                    );
                    self.discard_uploads(&uploaded).await;
                    return Err(map_image_error(err));
                }
            }
        }
        Ok(uploaded)
    }

    /// Best-effort deletion of objects written by a failed step.
    async fn discard_uploads(&self, uploaded: &[ListingImage]) {
        for image in uploaded {
            if let Err(err) = self.images.delete(&image.key).await {
                tracing::error!(
                    key = %image.key,
                    error = %err,
                    "compensating image delete failed; object is orphaned"
                );
            }
        }
    }

    /// Undo a create after the document was inserted.
    async fn abandon_create(&self, listing: &ListingId, revision: u32, uploaded: &[ListingImage]) {
        self.discard_uploads(uploaded).await;
        if let Err(err) = self.listings.delete(listing, revision).await {
            tracing::error!(
                listing_id = %listing,
                error = %err,
                "compensating listing delete failed"
            );
        }
    }

    /// Delete objects, returning the images that could not be deleted.
    async fn delete_objects(
        &self,
        listing: &ListingId,
        images: Vec<ListingImage>,
    ) -> Vec<ListingImage> {
        let mut remaining = Vec::new();
        for image in images {
            if let Err(err) = self.images.delete(&image.key).await {
                tracing::warn!(
                    listing_id = %listing,
                    key = %image.key,
                    error = %err,
                    "image delete failed"
                );
                remaining.push(image);
            }
        }
        remaining
    }

    /// Delete every object of `current`. When some survive, the listing is
    /// rewritten to reference only those and the call fails so a retry can
    /// finish.
    async fn sweep_images(&self, current: &Listing) -> Result<(), Error> {
        let image_count = current.images.len();
        let remaining = self
            .delete_objects(&current.id, current.images.clone())
            .await;
        if remaining.is_empty() {
            return Ok(());
        }

        let remaining_count = remaining.len();
        let mut partial = current.clone();
        partial.images = remaining;
        partial.revision = current.revision + 1;
        partial.updated_at = next_timestamp(current.updated_at, self.clock.utc());
        if let Err(err) = self.listings.update(&partial, current.revision).await {
            tracing::error!(
                listing_id = %current.id,
                error = %err,
                "recording remaining images failed"
            );
        }
        Err(Error::service_unavailable(format!(
            "deleted {} of {image_count} images; retry to finish deleting the listing",
            image_count - remaining_count
        ))
        .with_details(json!({ "remainingImages": remaining_count })))
    }
}

#[async_trait]
impl<L, F, S> ListingsCommand for ListingCommandService<L, F, S>
where
    L: ListingRepository,
    F: FavoritesRepository,
    S: ImageStore,
{
    async fn create(&self, request: CreateListingRequest) -> Result<Listing, Error> {
        let CreateListingRequest {
            seller,
            details,
            images,
        } = request;
        let now = self.now();
        details.validate(now).map_err(invalid_listing)?;
        validate_new_images(&images, 0).map_err(invalid_listing)?;

        let draft = Listing {
            id: ListingId::random(),
            details,
            seller,
            images: Vec::new(),
            created_at: now,
            updated_at: now,
            revision: 1,
        };
        self.listings
            .insert(&draft)
            .await
            .map_err(map_listing_error)?;
        if images.is_empty() {
            return Ok(draft);
        }

        let uploaded = match self.upload_all(&draft.id, images).await {
            Ok(uploaded) => uploaded,
            Err(err) => {
                self.abandon_create(&draft.id, draft.revision, &[]).await;
                return Err(err);
            }
        };

        let mut listing = draft.clone();
        listing.images.clone_from(&uploaded);
        listing.revision = draft.revision + 1;
        listing.updated_at = next_timestamp(draft.updated_at, self.clock.utc());
        if let Err(err) = self.listings.update(&listing, draft.revision).await {
            tracing::warn!(
                listing_id = %listing.id,
                error = %err,
                "attaching images failed; rolling back listing"
            );
            self.abandon_create(&listing.id, draft.revision, &uploaded).await;
            return Err(map_listing_error(err));
        }
        Ok(listing)
    }

    async fn update(&self, request: UpdateListingRequest) -> Result<UpdateListingResponse, Error> {
        let UpdateListingRequest {
            listing_id,
            user_id,
            patch,
            new_images,
            remove_images,
            expected_revision,
        } = request;
        let current = self.load_owned(&listing_id, &user_id).await?;
        if current.revision != expected_revision {
            return Err(revision_conflict(expected_revision, current.revision));
        }

        let (removed, kept): (Vec<ListingImage>, Vec<ListingImage>) = current
            .images
            .iter()
            .cloned()
            .partition(|image| remove_images.iter().any(|name| names_image(name, image)));
        if let Some(unknown) = remove_images
            .iter()
            .find(|name| !removed.iter().any(|image| names_image(name, image)))
        {
            return Err(Error::invalid_request(format!(
                "image is not attached to this listing: {unknown}"
            ))
            .with_details(json!({ "field": "removeImages" })));
        }

        let mut updated = patch.apply_to(&current);
        updated
            .details
            .validate(self.now())
            .map_err(invalid_listing)?;
        validate_new_images(&new_images, kept.len()).map_err(invalid_listing)?;

        let uploaded = self.upload_all(&listing_id, new_images).await?;
        updated.images = kept;
        updated.images.extend(uploaded.iter().cloned());
        updated.revision = current.revision + 1;
        updated.updated_at = next_timestamp(current.updated_at, self.clock.utc());

        if let Err(err) = self.listings.update(&updated, expected_revision).await {
            self.discard_uploads(&uploaded).await;
            return Err(map_listing_error(err));
        }

        let orphaned_keys = self
            .delete_objects(&listing_id, removed)
            .await
            .into_iter()
            .map(|image| image.key)
            .collect();
        Ok(UpdateListingResponse {
            listing: updated,
            orphaned_keys,
        })
    }

    async fn delete(&self, listing_id: &ListingId, user_id: &UserId) -> Result<(), Error> {
        let mut current = self.load_owned(listing_id, user_id).await?;
        for attempt in 1..=DELETE_ATTEMPTS {
            self.sweep_images(&current).await?;
            match self.listings.delete(listing_id, current.revision).await {
                Ok(()) => break,
                Err(ListingRepositoryError::RevisionMismatch { expected, actual })
                    if attempt < DELETE_ATTEMPTS =>
                {
                    tracing::info!(
                        listing_id = %listing_id,
                        expected,
                        actual,
                        "listing changed during delete; sweeping images again"
                    );
                    current = self.load_owned(listing_id, user_id).await?;
                }
                Err(err) => return Err(map_listing_error(err)),
            }
        }

        if let Err(err) = self.favorites.remove_listing(listing_id).await {
            tracing::warn!(
                listing_id = %listing_id,
                error = %err,
                "removing favourites of a deleted listing failed"
            );
            return Err(map_favorites_error(err));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "listing_command_service_tests.rs"]
mod tests;
