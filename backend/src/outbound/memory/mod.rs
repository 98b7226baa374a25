//! In-process adapters for every driven port.
//!
//! The server wires these in when no database URL is configured, and tests
//! use them wherever a real store would only add setup. State lives behind
//! `tokio::sync::RwLock`, so each adapter is `Send + Sync` and cheap to share
//! through `Arc`.

mod favorites;
mod images;
mod listings;
mod password_resets;
mod users;

pub use favorites::InMemoryFavoritesRepository;
pub use images::InMemoryImageStore;
pub use listings::InMemoryListingRepository;
pub use password_resets::InMemoryPasswordResetRepository;
pub use users::InMemoryUserRepository;
