//! Current-user API handlers.
//!
//! ```text
//! GET /api/v1/users/me
//! PATCH /api/v1/users/me {"displayName":"Ada","photoUrl":null}
//! GET /api/v1/users/me/listings?limit=12
//! ```

use actix_web::{HttpRequest, get, patch, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::{
    DisplayName, Error, ProfileUpdate, UserAccount, UserValidationError, parse_photo_url,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::listings::listing_page_response;
use crate::inbound::http::listings_dto::{ListingPageResponse, ListingSearchParams, timestamp};
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::explicit_null;

/// Account as shown to its owner.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[schema(example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    pub id: String,
    #[schema(example = "Ada Lovelace")]
    pub display_name: String,
    #[schema(example = "ada@example.com")]
    pub email: String,
    pub photo_url: Option<String>,
    pub created_at: String,
}

impl From<UserAccount> for UserResponse {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id().to_string(),
            display_name: account.display_name().to_string(),
            email: account.email().to_string(),
            photo_url: account.photo_url().map(|url| url.to_string()),
            created_at: timestamp(account.created_at()),
        }
    }
}

/// Body of `PATCH /api/v1/users/me`.
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdateRequest {
    pub display_name: Option<String>,
    /// `null` removes the photo.
    #[serde(default, deserialize_with = "explicit_null")]
    #[schema(value_type = Option<String>)]
    pub photo_url: Option<Option<String>>,
}

impl TryFrom<ProfileUpdateRequest> for ProfileUpdate {
    type Error = UserValidationError;

    fn try_from(value: ProfileUpdateRequest) -> Result<Self, Self::Error> {
        let display_name = value.display_name.map(DisplayName::new).transpose()?;
        let photo_url = value
            .photo_url
            .map(|photo| photo.as_deref().map(parse_photo_url).transpose())
            .transpose()?;
        Ok(Self {
            display_name,
            photo_url,
        })
    }
}

pub(crate) fn map_user_validation_error(err: UserValidationError) -> Error {
    let (field, code) = match &err {
        UserValidationError::EmptyId | UserValidationError::InvalidId => ("id", "invalid_id"),
        UserValidationError::EmptyDisplayName => ("displayName", "empty_display_name"),
        UserValidationError::DisplayNameTooShort { .. } => {
            ("displayName", "display_name_too_short")
        }
        UserValidationError::DisplayNameTooLong { .. } => ("displayName", "display_name_too_long"),
        UserValidationError::DisplayNameInvalidCharacters => {
            ("displayName", "display_name_invalid_characters")
        }
        UserValidationError::InvalidEmail => ("email", "invalid_email"),
        UserValidationError::InvalidPhotoUrl => ("photoUrl", "invalid_photo_url"),
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field, "code": code }))
}

/// Return the signed-in user; `401` doubles as the "signed out" answer.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorised", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let account = state.profile.fetch_profile(&user_id).await?;
    Ok(web::Json(account.into()))
}

/// Update the signed-in user's display name or photo.
#[utoipa::path(
    patch,
    path = "/api/v1/users/me",
    request_body = ProfileUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "updateCurrentUser"
)]
#[patch("/users/me")]
pub async fn update_current_user(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ProfileUpdateRequest>,
) -> ApiResult<web::Json<UserResponse>> {
    let user_id = session.require_user_id()?;
    let update = ProfileUpdate::try_from(payload.into_inner()).map_err(map_user_validation_error)?;
    let account = state.profile_command.update_profile(&user_id, update).await?;
    Ok(web::Json(account.into()))
}

/// Listings posted by the signed-in user, with the usual filters.
#[utoipa::path(
    get,
    path = "/api/v1/users/me/listings",
    params(ListingSearchParams),
    responses(
        (status = 200, description = "One page of the user's listings", body = ListingPageResponse),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorised", body = Error)
    ),
    tags = ["users"],
    operation_id = "myListings"
)]
#[get("/users/me/listings")]
pub async fn my_listings(
    state: web::Data<HttpState>,
    session: SessionContext,
    req: HttpRequest,
    params: web::Query<ListingSearchParams>,
) -> ApiResult<web::Json<ListingPageResponse>> {
    let user_id = session.require_user_id()?;
    let query = params.into_inner().into_query(Some(user_id))?;
    let page = state.listings.search(query).await?;
    Ok(web::Json(listing_page_response(&req, page)?))
}
