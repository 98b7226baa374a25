//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on driving ports (and the image store for media reads) and remain
//! testable without I/O.

use std::sync::Arc;

use mockable::Clock;

use crate::domain::ports::{
    AuthService, FavoritesCommand, FavoritesQuery, FavoritesRepository, ImageStore,
    ListingRepository, ListingsCommand, ListingsQuery, PasswordHasher, PasswordResetNotifier,
    PasswordResetRepository, UserProfileCommand, UserProfileQuery, UserRepository,
};
use crate::domain::{
    AccountService, FavoritesService, ListingCatalogueService, ListingCommandService,
};

/// Parameter object bundling the driven adapters the services run on.
pub struct DrivenAdapters<L, F, U, R, S, H, N> {
    pub listings: Arc<L>,
    pub favorites: Arc<F>,
    pub users: Arc<U>,
    pub resets: Arc<R>,
    pub images: Arc<S>,
    pub hasher: Arc<H>,
    pub notifier: Arc<N>,
    pub clock: Arc<dyn Clock>,
}

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub listings: Arc<dyn ListingsQuery>,
    pub listings_command: Arc<dyn ListingsCommand>,
    pub favorites: Arc<dyn FavoritesQuery>,
    pub favorites_command: Arc<dyn FavoritesCommand>,
    pub auth: Arc<dyn AuthService>,
    pub profile: Arc<dyn UserProfileQuery>,
    pub profile_command: Arc<dyn UserProfileCommand>,
    pub media: Arc<dyn ImageStore>,
}

impl HttpState {
    /// Wire the domain services over a set of driven adapters.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    ///
    /// use carlot::inbound::http::state::{DrivenAdapters, HttpState};
    /// use carlot::outbound::memory::{
    ///     InMemoryFavoritesRepository, InMemoryImageStore, InMemoryListingRepository,
    ///     InMemoryPasswordResetRepository, InMemoryUserRepository,
    /// };
    /// use carlot::outbound::notify::TracingResetNotifier;
    /// use carlot::outbound::security::Argon2PasswordHasher;
    /// use mockable::DefaultClock;
    /// use url::Url;
    ///
    /// let base = Url::parse("http://localhost:8080/media/").expect("valid URL");
    /// let state = HttpState::from_adapters(DrivenAdapters {
    ///     listings: Arc::new(InMemoryListingRepository::new()),
    ///     favorites: Arc::new(InMemoryFavoritesRepository::new()),
    ///     users: Arc::new(InMemoryUserRepository::new()),
    ///     resets: Arc::new(InMemoryPasswordResetRepository::new()),
    ///     images: Arc::new(InMemoryImageStore::new(base)),
    ///     hasher: Arc::new(Argon2PasswordHasher::new()),
    ///     notifier: Arc::new(TracingResetNotifier),
    ///     clock: Arc::new(DefaultClock),
    /// });
    /// let _auth = state.auth.clone();
    /// ```
    pub fn from_adapters<L, F, U, R, S, H, N>(adapters: DrivenAdapters<L, F, U, R, S, H, N>) -> Self
    where
        L: ListingRepository + 'static,
        F: FavoritesRepository + 'static,
        U: UserRepository + 'static,
        R: PasswordResetRepository + 'static,
        S: ImageStore + 'static,
        H: PasswordHasher + 'static,
        N: PasswordResetNotifier + 'static,
    {
        let DrivenAdapters {
            listings,
            favorites,
            users,
            resets,
            images,
            hasher,
            notifier,
            clock,
        } = adapters;

        let catalogue = Arc::new(ListingCatalogueService::new(listings.clone()));
        let commands = Arc::new(ListingCommandService::new(
            listings.clone(),
            favorites.clone(),
            images.clone(),
            clock.clone(),
        ));
        let favourites = Arc::new(FavoritesService::new(favorites, listings));
        let accounts = Arc::new(AccountService::new(users, resets, hasher, notifier, clock));

        Self {
            listings: catalogue,
            listings_command: commands,
            favorites: favourites.clone(),
            favorites_command: favourites,
            auth: accounts.clone(),
            profile: accounts.clone(),
            profile_command: accounts,
            media: images,
        }
    }
}
