//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::body::MessageBody;
use actix_web::cookie::{Cookie, Key};
use actix_web::dev::{Service, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, test, web};
use mockable::DefaultClock;
use serde_json::json;
use url::Url;

use super::configure_api;
use super::error::{json_config, path_config, query_config};
use super::state::{DrivenAdapters, HttpState};
use crate::domain::Password;
use crate::domain::ports::{PasswordHasher, PasswordHasherError};
use crate::outbound::memory::{
    InMemoryFavoritesRepository, InMemoryImageStore, InMemoryListingRepository,
    InMemoryPasswordResetRepository, InMemoryUserRepository,
};
use crate::outbound::notify::TracingResetNotifier;

pub const TEST_MEDIA_BASE: &str = "http://localhost/media/";
const TEST_JSON_LIMIT: usize = 1024 * 1024;

/// Build a session middleware configured for tests.
///
/// - Generates a fresh signing/encryption key per invocation.
/// - Sets the cookie name to `session` and disables the `Secure` flag for
///   local HTTP tests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Session cookie set by `res`, if any.
pub fn session_cookie<B>(res: &ServiceResponse<B>) -> Option<Cookie<'static>> {
    res.response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .map(Cookie::into_owned)
}

/// Reversible "hash" so handler tests skip Argon2's deliberate slowness.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextHasher;

impl PasswordHasher for PlainTextHasher {
    fn hash(&self, password: &Password) -> Result<String, PasswordHasherError> {
        Ok(format!("plain${}", password.expose()))
    }

    fn verify(&self, password: &Password, hash: &str) -> Result<bool, PasswordHasherError> {
        hash.strip_prefix("plain$")
            .map(|stored| stored == password.expose())
            .ok_or_else(|| PasswordHasherError::malformed_hash("not a plain test hash"))
    }
}

/// Memory-backed services plus handles on the stores tests inspect.
pub struct TestBackend {
    pub state: HttpState,
    pub listings: Arc<InMemoryListingRepository>,
    pub favorites: Arc<InMemoryFavoritesRepository>,
    pub images: Arc<InMemoryImageStore>,
}

/// Wire every driving port over fresh in-memory adapters.
pub fn test_backend() -> TestBackend {
    let base = Url::parse(TEST_MEDIA_BASE).unwrap_or_else(|err| panic!("media base: {err}"));
    let listings = Arc::new(InMemoryListingRepository::new());
    let favorites = Arc::new(InMemoryFavoritesRepository::new());
    let images = Arc::new(InMemoryImageStore::new(base));
    let state = HttpState::from_adapters(DrivenAdapters {
        listings: listings.clone(),
        favorites: favorites.clone(),
        users: Arc::new(InMemoryUserRepository::new()),
        resets: Arc::new(InMemoryPasswordResetRepository::new()),
        images: images.clone(),
        hasher: Arc::new(PlainTextHasher),
        notifier: Arc::new(TracingResetNotifier),
        clock: Arc::new(DefaultClock),
    });
    TestBackend {
        state,
        listings,
        favorites,
        images,
    }
}

/// Application mounting the full API under `/api/v1`, as the server does.
pub fn test_app(
    state: HttpState,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(state))
        .app_data(json_config(TEST_JSON_LIMIT))
        .app_data(query_config())
        .app_data(path_config())
        .service(
            web::scope("/api/v1")
                .wrap(test_session_middleware())
                .configure(configure_api),
        )
}

/// Register `email` through the API and return the signed-in session cookie.
pub async fn sign_up<S, B>(app: &S, email: &str) -> Cookie<'static>
where
    S: Service<actix_http::Request, Response = ServiceResponse<B>, Error = actix_web::Error>,
    B: MessageBody,
{
    let res = test::call_service(
        app,
        test::TestRequest::post()
            .uri("/api/v1/auth/register")
            .set_json(json!({
                "email": email,
                "password": "hunter22",
                "displayName": "Test Seller",
            }))
            .to_request(),
    )
    .await;
    assert!(
        res.status().is_success(),
        "registration failed: {}",
        res.status()
    );
    session_cookie(&res).unwrap_or_else(|| panic!("registration sets a session cookie"))
}
