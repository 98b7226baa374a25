//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! This module provides concrete implementations of domain repository ports
//! backed by PostgreSQL via the Diesel ORM with async support through
//! `diesel-async` and `bb8` connection pooling.
//!
//! # Architecture
//!
//! The persistence layer follows these principles:
//!
//! - **Thin adapters**: Repository implementations only translate between
//!   Diesel models and domain types. No business logic resides here.
//! - **Internal models**: Diesel row structs (`models.rs`) and schema
//!   definitions (`schema.rs`) are internal implementation details, never
//!   exposed to the domain layer.
//! - **Async-safe pooling**: Connections are managed via `bb8` pools with
//!   proper async integration through `diesel-async`.
//! - **Strongly typed errors**: All database errors are mapped to the port
//!   error enums.
//!
//! # Example
//!
//! ```ignore
//! use carlot::outbound::persistence::{DbPool, PoolConfig, DieselListingRepository};
//!
//! let config = PoolConfig::new("postgres://localhost/carlot");
//! carlot::outbound::persistence::run_migrations(config.database_url()).await?;
//! let pool = DbPool::new(config).await?;
//! let repo = DieselListingRepository::new(pool);
//! ```

mod diesel_error_mapping;
mod diesel_favorites_repository;
mod diesel_listing_repository;
mod diesel_password_reset_repository;
mod diesel_user_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_favorites_repository::DieselFavoritesRepository;
pub use diesel_listing_repository::DieselListingRepository;
pub use diesel_password_reset_repository::DieselPasswordResetRepository;
pub use diesel_user_repository::DieselUserRepository;
pub use migrations::{MigrationError, run_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
