//! Listing HTTP handlers.
//!
//! ```text
//! GET /api/v1/listings?brand=BMW,Audi&price=500000-1000000&sort=price&order=asc
//! POST /api/v1/listings
//! GET /api/v1/listings/{id}
//! PATCH /api/v1/listings/{id}
//! DELETE /api/v1/listings/{id}
//! GET /api/v1/listings/{id}/similar
//! ```

use actix_web::http::header;
use actix_web::{HttpRequest, HttpResponse, delete, get, patch, post, web};
use pagination::{Paginated, PaginationLinks};
use serde::Deserialize;
use url::Url;

use crate::domain::ports::{CreateListingRequest, UpdateListingRequest};
use crate::domain::{Error, ListingId, ListingPage, Seller};
use crate::inbound::http::ApiResult;
use crate::inbound::http::listings_dto::{
    CreateListingBody, CreateListingParts, ListingPageResponse, ListingResponse,
    ListingSearchParams, UpdateListingBody, UpdateListingParts, UpdateListingResponseBody,
};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, encode_cursor, parse_listing_id};

#[derive(Debug, Deserialize)]
pub(super) struct ListingPath {
    id: String,
}

fn parse_path(path: ListingPath) -> Result<ListingId, Error> {
    parse_listing_id(&path.id, FieldName::new("id"))
}

/// Absolute URL of the current request, for pagination links.
fn request_url(req: &HttpRequest) -> Result<Url, Error> {
    let info = req.connection_info();
    Url::parse(&format!("{}://{}{}", info.scheme(), info.host(), req.uri()))
        .map_err(|err| Error::internal(format!("invalid request URL: {err}")))
}

/// Wrap a domain page in the pagination envelope.
pub(crate) fn listing_page_response(
    req: &HttpRequest,
    page: ListingPage,
) -> ApiResult<ListingPageResponse> {
    let next = page.next.map(encode_cursor).transpose()?;
    let links = PaginationLinks::from_request(&request_url(req)?, page.limit, next.as_deref());
    let data = page
        .listings
        .into_iter()
        .map(ListingResponse::from)
        .collect();
    Ok(Paginated::new(data, page.limit, links).into())
}

/// Search listings with filters, sort and keyset pagination.
#[utoipa::path(
    get,
    path = "/api/v1/listings",
    params(ListingSearchParams),
    responses(
        (status = 200, description = "One page of listings", body = ListingPageResponse),
        (status = 400, description = "Invalid filter, sort or cursor", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["listings"],
    operation_id = "searchListings",
    security([])
)]
#[get("/listings")]
pub async fn search_listings(
    state: web::Data<HttpState>,
    req: HttpRequest,
    params: web::Query<ListingSearchParams>,
) -> ApiResult<web::Json<ListingPageResponse>> {
    let query = params.into_inner().into_query(None)?;
    let page = state.listings.search(query).await?;
    Ok(web::Json(listing_page_response(&req, page)?))
}

/// Create a listing for the signed-in seller.
///
/// Images travel inline as base64. A failed upload rolls the whole listing
/// back, so a `5xx` here never leaves a partial listing behind.
#[utoipa::path(
    post,
    path = "/api/v1/listings",
    request_body = CreateListingBody,
    responses(
        (status = 201, description = "Listing created", body = ListingResponse,
            headers(("Location" = String, description = "Listing URL"))),
        (status = 400, description = "Invalid listing", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["listings"],
    operation_id = "createListing"
)]
#[post("/listings")]
pub async fn create_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateListingBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let parts = CreateListingParts::try_from(payload.into_inner())?;
    let listing = state
        .listings_command
        .create(CreateListingRequest {
            seller: Seller {
                user_id,
                seller_type: parts.seller_type,
                name: parts.seller_name,
                contact: parts.seller_contact,
            },
            details: parts.details,
            images: parts.images,
        })
        .await?;
    let location = format!("/api/v1/listings/{}", listing.id);
    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location))
        .json(ListingResponse::from(listing)))
}

/// Fetch one listing.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Listing", body = ListingResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["listings"],
    operation_id = "getListing",
    security([])
)]
#[get("/listings/{id}")]
pub async fn get_listing(
    state: web::Data<HttpState>,
    path: web::Path<ListingPath>,
) -> ApiResult<web::Json<ListingResponse>> {
    let id = parse_path(path.into_inner())?;
    let listing = state.listings.get(&id).await?;
    Ok(web::Json(listing.into()))
}

/// Update a listing owned by the signed-in user.
#[utoipa::path(
    patch,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    request_body = UpdateListingBody,
    responses(
        (status = 200, description = "Updated listing", body = UpdateListingResponseBody),
        (status = 400, description = "Invalid update", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Revision mismatch", body = Error),
        (status = 503, description = "Service unavailable", body = Error)
    ),
    tags = ["listings"],
    operation_id = "updateListing"
)]
#[patch("/listings/{id}")]
pub async fn update_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ListingPath>,
    payload: web::Json<UpdateListingBody>,
) -> ApiResult<web::Json<UpdateListingResponseBody>> {
    let user_id = session.require_user_id()?;
    let listing_id = parse_path(path.into_inner())?;
    let parts = UpdateListingParts::try_from(payload.into_inner())?;
    let response = state
        .listings_command
        .update(UpdateListingRequest {
            listing_id,
            user_id,
            patch: parts.patch,
            new_images: parts.new_images,
            remove_images: parts.remove_images,
            expected_revision: parts.expected_revision,
        })
        .await?;
    Ok(web::Json(UpdateListingResponseBody {
        listing: response.listing.into(),
        orphaned_keys: response.orphaned_keys,
    }))
}

/// Delete a listing owned by the signed-in user, with its images and
/// favourites.
#[utoipa::path(
    delete,
    path = "/api/v1/listings/{id}",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 403, description = "Not the owner", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 503, description = "Image deletion failed; retry", body = Error)
    ),
    tags = ["listings"],
    operation_id = "deleteListing"
)]
#[delete("/listings/{id}")]
pub async fn delete_listing(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<ListingPath>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let listing_id = parse_path(path.into_inner())?;
    state.listings_command.delete(&listing_id, &user_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

/// Up to three listings resembling the given one.
#[utoipa::path(
    get,
    path = "/api/v1/listings/{id}/similar",
    params(("id" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Similar listings", body = [ListingResponse]),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["listings"],
    operation_id = "similarListings",
    security([])
)]
#[get("/listings/{id}/similar")]
pub async fn similar_listings(
    state: web::Data<HttpState>,
    path: web::Path<ListingPath>,
) -> ApiResult<web::Json<Vec<ListingResponse>>> {
    let id = parse_path(path.into_inner())?;
    let similar = state.listings.similar(&id).await?;
    Ok(web::Json(
        similar.into_iter().map(ListingResponse::from).collect(),
    ))
}

#[cfg(test)]
#[path = "listings_tests.rs"]
mod tests;
