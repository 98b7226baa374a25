//! Driving port for account authentication.
//!
//! Session handling stays in the inbound adapter: implementations only decide
//! who the caller is.

use async_trait::async_trait;

use crate::domain::{
    EmailAddress, Error, LoginCredentials, PasswordResetConfirmation, Registration, UserAccount,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an account. An address already in use yields `conflict`.
    async fn register(&self, registration: Registration) -> Result<UserAccount, Error>;

    /// Authenticate. Unknown emails and wrong passwords fail identically with
    /// `unauthorized`.
    async fn login(&self, credentials: LoginCredentials) -> Result<UserAccount, Error>;

    /// Issue a reset token when an account exists. Succeeds either way.
    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), Error>;

    /// Replace the password using a reset token.
    async fn confirm_password_reset(
        &self,
        confirmation: PasswordResetConfirmation,
    ) -> Result<(), Error>;
}
