//! Builders wiring driven adapters into the HTTP state.
//!
//! A database URL selects the Diesel repositories (after applying pending
//! migrations); without one the server runs on in-memory repositories. The
//! image store is chosen independently from the media root setting.

use std::io;
use std::sync::Arc;

use mockable::{Clock, DefaultClock};
use tracing::{info, warn};

use carlot::domain::ports::ImageStore;
use carlot::inbound::http::state::{DrivenAdapters, HttpState};
use carlot::outbound::memory::{
    InMemoryFavoritesRepository, InMemoryImageStore, InMemoryListingRepository,
    InMemoryPasswordResetRepository, InMemoryUserRepository,
};
use carlot::outbound::notify::TracingResetNotifier;
use carlot::outbound::persistence::{
    DbPool, DieselFavoritesRepository, DieselListingRepository, DieselPasswordResetRepository,
    DieselUserRepository, PoolConfig, run_migrations,
};
use carlot::outbound::security::Argon2PasswordHasher;
use carlot::outbound::storage::FilesystemImageStore;
use carlot::settings::ServerSettings;

/// Build the HTTP state for `settings`.
///
/// # Errors
///
/// Returns [`io::Error`] when the media directory cannot be opened, the
/// media URL is malformed, or the database cannot be migrated or pooled.
pub async fn build_http_state(settings: &ServerSettings) -> io::Result<HttpState> {
    let base_url = settings.media_base_url().map_err(io::Error::other)?;
    match settings.media_root() {
        Some(root) => {
            let store = FilesystemImageStore::open(root, base_url).map_err(io::Error::other)?;
            info!(root = %root.display(), "serving media from disk");
            build_with_images(settings, Arc::new(store)).await
        }
        None => {
            warn!("no media root configured; uploaded images are lost on restart");
            build_with_images(settings, Arc::new(InMemoryImageStore::new(base_url))).await
        }
    }
}

async fn build_with_images<S>(settings: &ServerSettings, images: Arc<S>) -> io::Result<HttpState>
where
    S: ImageStore + 'static,
{
    let hasher = Arc::new(Argon2PasswordHasher::new());
    let notifier = Arc::new(TracingResetNotifier);
    let clock: Arc<dyn Clock> = Arc::new(DefaultClock);

    let Some(database_url) = settings.database_url() else {
        warn!("no database configured; using in-memory repositories");
        return Ok(HttpState::from_adapters(DrivenAdapters {
            listings: Arc::new(InMemoryListingRepository::new()),
            favorites: Arc::new(InMemoryFavoritesRepository::new()),
            users: Arc::new(InMemoryUserRepository::new()),
            resets: Arc::new(InMemoryPasswordResetRepository::new()),
            images,
            hasher,
            notifier,
            clock,
        }));
    };

    run_migrations(database_url)
        .await
        .map_err(io::Error::other)?;
    let pool = DbPool::new(PoolConfig::new(database_url))
        .await
        .map_err(io::Error::other)?;
    info!("connected to PostgreSQL");

    Ok(HttpState::from_adapters(DrivenAdapters {
        listings: Arc::new(DieselListingRepository::new(pool.clone())),
        favorites: Arc::new(DieselFavoritesRepository::new(pool.clone())),
        users: Arc::new(DieselUserRepository::new(pool.clone())),
        resets: Arc::new(DieselPasswordResetRepository::new(pool)),
        images,
        hasher,
        notifier,
        clock,
    }))
}
