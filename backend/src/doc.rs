//! OpenAPI documentation configuration.
//!
//! This module defines the [`ApiDoc`] struct which generates the OpenAPI
//! specification for the REST API. It registers:
//!
//! - **Paths**: every HTTP endpoint from the inbound layer (auth, users,
//!   favourites, listings, media, health)
//! - **Schemas**: request and response DTOs plus the domain error payload
//! - **Security**: Session cookie authentication scheme
//!
//! The generated specification is used by Swagger UI (debug builds) and
//! exported via `cargo run --bin openapi-dump` for external tooling.

use crate::domain::{Error, ErrorCode};
use crate::inbound::http::auth::{
    LoginRequest, PasswordResetConfirmRequest, PasswordResetRequest, RegisterRequest,
};
use crate::inbound::http::favorites::{FavoriteStateResponse, FavoritesResponse};
use crate::inbound::http::listings_dto::{
    CreateListingBody, ImageResponse, ImageUpload, ListingPageResponse, ListingResponse,
    PageLinksResponse, SpecificationsDto, UpdateListingBody, UpdateListingResponseBody,
};
use crate::inbound::http::users::{ProfileUpdateRequest, UserResponse};
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/auth/login or /api/v1/auth/register.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
/// Swagger UI is enabled in debug builds only and used by tooling.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Carlot marketplace API",
        description = "Car listings, favourites and session-authenticated accounts.",
        license(
            name = "Apache-2.0",
            url = "https://www.apache.org/licenses/LICENSE-2.0.html"
        )
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::auth::register,
        crate::inbound::http::auth::login,
        crate::inbound::http::auth::logout,
        crate::inbound::http::auth::request_password_reset,
        crate::inbound::http::auth::confirm_password_reset,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::update_current_user,
        crate::inbound::http::users::my_listings,
        crate::inbound::http::favorites::list_favorites,
        crate::inbound::http::favorites::add_favorite,
        crate::inbound::http::favorites::remove_favorite,
        crate::inbound::http::favorites::toggle_favorite,
        crate::inbound::http::listings::search_listings,
        crate::inbound::http::listings::create_listing,
        crate::inbound::http::listings::get_listing,
        crate::inbound::http::listings::update_listing,
        crate::inbound::http::listings::delete_listing,
        crate::inbound::http::listings::similar_listings,
        crate::inbound::http::media::get_media,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        Error,
        ErrorCode,
        RegisterRequest,
        LoginRequest,
        PasswordResetRequest,
        PasswordResetConfirmRequest,
        UserResponse,
        ProfileUpdateRequest,
        FavoritesResponse,
        FavoriteStateResponse,
        SpecificationsDto,
        ImageResponse,
        ImageUpload,
        ListingResponse,
        PageLinksResponse,
        ListingPageResponse,
        CreateListingBody,
        UpdateListingBody,
        UpdateListingResponseBody,
    )),
    tags(
        (name = "auth", description = "Registration, login and password resets"),
        (name = "users", description = "The signed-in user's account"),
        (name = "favorites", description = "Bookmarked listings"),
        (name = "listings", description = "Cars for sale"),
        (name = "media", description = "Stored listing images"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    //! Tests verifying the generated OpenAPI document.

    use super::*;
    use rstest::{fixture, rstest};
    use utoipa::openapi::RefOr;
    use utoipa::openapi::schema::Schema;

    #[fixture]
    fn doc() -> utoipa::openapi::OpenApi {
        ApiDoc::openapi()
    }

    fn schema<'a>(doc: &'a utoipa::openapi::OpenApi, name: &str) -> &'a RefOr<Schema> {
        doc.components
            .as_ref()
            .expect("components")
            .schemas
            .get(name)
            .unwrap_or_else(|| panic!("schema {name} registered"))
    }

    fn assert_object_schema_has_field(schema: &RefOr<Schema>, field: &str) {
        match schema {
            RefOr::T(Schema::Object(obj)) => {
                assert!(
                    obj.properties.contains_key(field),
                    "schema should have field '{field}'"
                );
            }
            _ => panic!("expected Object schema"),
        }
    }

    #[rstest]
    #[case("/api/v1/auth/register")]
    #[case("/api/v1/auth/password-reset/confirm")]
    #[case("/api/v1/users/me")]
    #[case("/api/v1/users/me/listings")]
    #[case("/api/v1/users/me/favorites/{listingId}/toggle")]
    #[case("/api/v1/listings")]
    #[case("/api/v1/listings/{id}")]
    #[case("/api/v1/listings/{id}/similar")]
    #[case("/media/{key}")]
    #[case("/health/ready")]
    fn documents_every_route(doc: utoipa::openapi::OpenApi, #[case] path: &str) {
        assert!(doc.paths.paths.contains_key(path), "missing path {path}");
    }

    #[rstest]
    #[case("Error", "code")]
    #[case("Error", "traceId")]
    #[case("UserResponse", "displayName")]
    #[case("ListingResponse", "sellerType")]
    #[case("ListingPageResponse", "links")]
    #[case("PageLinksResponse", "self")]
    #[case("UpdateListingBody", "expectedRevision")]
    fn schemas_use_wire_field_names(
        doc: utoipa::openapi::OpenApi,
        #[case] name: &str,
        #[case] field: &str,
    ) {
        assert_object_schema_has_field(schema(&doc, name), field);
    }

    #[rstest]
    fn session_cookie_scheme_is_registered(doc: utoipa::openapi::OpenApi) {
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
