//! Password reset delivery.
//!
//! No mail transport is wired in; the token is written to the structured
//! log at `info` level under the `carlot::reset` target so operators (or a
//! log-shipping mailer) can pick it up. Deployments that must not log
//! secrets should filter that target out.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::domain::ports::{PasswordResetNotifier, PasswordResetNotifierError};
use crate::domain::{EmailAddress, ResetToken};

/// Notifier that emits reset tokens as tracing events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingResetNotifier;

#[async_trait]
impl PasswordResetNotifier for TracingResetNotifier {
    async fn send_reset(
        &self,
        email: &EmailAddress,
        token: &ResetToken,
        expires_at: DateTime<Utc>,
    ) -> Result<(), PasswordResetNotifierError> {
        info!(
            target: "carlot::reset",
            %email,
            token = token.expose(),
            %expires_at,
            "password reset token issued"
        );
        Ok(())
    }
}
