//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! This module follows the hexagonal architecture pattern, providing concrete
//! implementations of domain port traits for various infrastructure concerns:
//!
//! - **persistence**: PostgreSQL-backed repositories using Diesel ORM
//! - **memory**: in-process repositories and image store for development
//!   and tests
//! - **storage**: filesystem image store rooted at the media directory
//! - **security**: Argon2id password hashing
//! - **notify**: password reset delivery
//!
//! Adapters are thin translators that convert between domain types and
//! infrastructure-specific representations. They contain no business logic.

pub mod memory;
pub mod notify;
pub mod persistence;
pub mod security;
pub mod storage;
