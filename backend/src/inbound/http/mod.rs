//! HTTP inbound adapter exposing REST endpoints.

use actix_web::web;

pub mod auth;
pub mod error;
pub mod favorites;
pub mod health;
pub mod listings;
pub mod listings_dto;
pub mod media;
pub mod session;
pub mod session_config;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;

/// Register every `/api/v1` handler on `cfg`.
///
/// The caller owns the scope and its session middleware, so tests and the
/// server mount the same routes.
///
/// # Examples
/// ```
/// use actix_web::{App, web};
/// use carlot::inbound::http::configure_api;
///
/// let _app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::register)
        .service(auth::login)
        .service(auth::logout)
        .service(auth::request_password_reset)
        .service(auth::confirm_password_reset)
        .service(users::current_user)
        .service(users::update_current_user)
        .service(users::my_listings)
        .service(favorites::list_favorites)
        .service(favorites::add_favorite)
        .service(favorites::remove_favorite)
        .service(favorites::toggle_favorite)
        .service(listings::search_listings)
        .service(listings::create_listing)
        .service(listings::get_listing)
        .service(listings::update_listing)
        .service(listings::delete_listing)
        .service(listings::similar_listings);
}
