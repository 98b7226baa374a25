//! Favourite listing handlers.
//!
//! ```text
//! GET /api/v1/users/me/favorites
//! PUT /api/v1/users/me/favorites/{listingId}
//! DELETE /api/v1/users/me/favorites/{listingId}
//! POST /api/v1/users/me/favorites/{listingId}/toggle
//! ```
//!
//! Favourites have set semantics: adding twice or removing an absent entry
//! both succeed.

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{Error, ListingId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::listings_dto::ListingResponse;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_listing_id};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct FavoritePath {
    listing_id: String,
}

fn parse_path(path: FavoritePath) -> Result<ListingId, Error> {
    parse_listing_id(&path.listing_id, FieldName::new("listingId"))
}

/// Favourite listings plus their ids.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoritesResponse {
    pub listing_ids: Vec<String>,
    pub listings: Vec<ListingResponse>,
}

/// Favourite state after a write.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteStateResponse {
    pub listing_id: String,
    pub favorite: bool,
}

/// List the signed-in user's favourites.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/favorites",
    responses(
        (status = 200, description = "Favourites", body = FavoritesResponse),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["favorites"],
    operation_id = "listFavorites"
)]
#[get("/users/me/favorites")]
pub async fn list_favorites(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<FavoritesResponse>> {
    let user_id = session.require_user_id()?;
    let ids = state.favorites.favorite_ids(&user_id).await?;
    let listings = state.favorites.favorite_listings(&user_id).await?;
    Ok(web::Json(FavoritesResponse {
        listing_ids: ids.iter().map(ToString::to_string).collect(),
        listings: listings.into_iter().map(ListingResponse::from).collect(),
    }))
}

async fn set_favorite(
    state: &HttpState,
    session: &SessionContext,
    path: FavoritePath,
    favorite: bool,
) -> ApiResult<web::Json<FavoriteStateResponse>> {
    let user_id = session.require_user_id()?;
    let listing_id = parse_path(path)?;
    let favorite = state
        .favorites_command
        .set_favorite(&user_id, &listing_id, favorite)
        .await?;
    Ok(web::Json(FavoriteStateResponse {
        listing_id: listing_id.to_string(),
        favorite,
    }))
}

/// Add a listing to the signed-in user's favourites.
#[utoipa::path(
    put,
    path = "/api/v1/users/me/favorites/{listingId}",
    params(("listingId" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Favourite state", body = FavoriteStateResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Listing not found", body = Error)
    ),
    tags = ["favorites"],
    operation_id = "addFavorite"
)]
#[put("/users/me/favorites/{listingId}")]
pub async fn add_favorite(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<FavoritePath>,
) -> ApiResult<web::Json<FavoriteStateResponse>> {
    set_favorite(&state, &session, path.into_inner(), true).await
}

/// Remove a listing from the signed-in user's favourites.
#[utoipa::path(
    delete,
    path = "/api/v1/users/me/favorites/{listingId}",
    params(("listingId" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Favourite state", body = FavoriteStateResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["favorites"],
    operation_id = "removeFavorite"
)]
#[delete("/users/me/favorites/{listingId}")]
pub async fn remove_favorite(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<FavoritePath>,
) -> ApiResult<web::Json<FavoriteStateResponse>> {
    set_favorite(&state, &session, path.into_inner(), false).await
}

/// Flip the favourite state of a listing.
#[utoipa::path(
    post,
    path = "/api/v1/users/me/favorites/{listingId}/toggle",
    params(("listingId" = String, Path, description = "Listing id")),
    responses(
        (status = 200, description = "Favourite state", body = FavoriteStateResponse),
        (status = 400, description = "Invalid id", body = Error),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 404, description = "Listing not found", body = Error)
    ),
    tags = ["favorites"],
    operation_id = "toggleFavorite"
)]
#[post("/users/me/favorites/{listingId}/toggle")]
pub async fn toggle_favorite(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<FavoritePath>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let listing_id = parse_path(path.into_inner())?;
    let favorite = state
        .favorites_command
        .toggle_favorite(&user_id, &listing_id)
        .await?;
    Ok(HttpResponse::Ok().json(FavoriteStateResponse {
        listing_id: listing_id.to_string(),
        favorite,
    }))
}
