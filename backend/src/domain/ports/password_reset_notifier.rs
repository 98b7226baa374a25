//! Port for delivering password reset tokens to account holders.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{EmailAddress, ResetToken};

use super::define_port_error;

define_port_error! {
    /// Errors raised by reset notifier adapters.
    pub enum PasswordResetNotifierError {
        /// The message could not be delivered.
        Delivery { message: String } => "password reset delivery failed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetNotifier: Send + Sync {
    async fn send_reset(
        &self,
        email: &EmailAddress,
        token: &ResetToken,
        expires_at: DateTime<Utc>,
    ) -> Result<(), PasswordResetNotifierError>;
}
