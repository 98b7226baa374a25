//! Port for user account persistence.
//!
//! Accounts are stored together with their Argon2 password hash. The hash is
//! only ever read back through [`StoredCredentials`] during login.

use async_trait::async_trait;

use crate::domain::{EmailAddress, UserAccount, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by user repository adapters.
    pub enum UserRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "user repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "user repository query failed: {message}",
        /// Another account already uses this email address.
        DuplicateEmail { email: String } =>
            "email already registered: {email}",
        /// The account no longer exists.
        Missing { id: String } => "user {id} not found",
    }
}

/// Account plus its password hash, as read for login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredentials {
    pub account: UserAccount,
    pub password_hash: String,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create an account. Fails with `DuplicateEmail` when the address is taken.
    async fn insert(
        &self,
        account: &UserAccount,
        password_hash: &str,
    ) -> Result<(), UserRepositoryError>;

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserRepositoryError>;

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError>;

    /// Persist display name and photo changes.
    async fn update_profile(&self, account: &UserAccount) -> Result<(), UserRepositoryError>;

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<(), UserRepositoryError>;
}
