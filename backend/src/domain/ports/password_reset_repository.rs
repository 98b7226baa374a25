//! Port for outstanding password reset tokens.
//!
//! Only a digest of each token is stored. Consuming a token removes it, so a
//! token works at most once.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::UserId;

use super::define_port_error;

define_port_error! {
    /// Errors raised by password reset repository adapters.
    pub enum PasswordResetRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "password reset repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "password reset repository query failed: {message}",
    }
}

/// Stored reset grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordResetRecord {
    /// Hex-encoded SHA-256 digest of the token.
    pub token_digest: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    async fn store(&self, record: &PasswordResetRecord) -> Result<(), PasswordResetRepositoryError>;

    /// Remove the grant for `token_digest` and return its user when it had not
    /// expired at `now`. Expired grants are removed too.
    async fn consume(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, PasswordResetRepositoryError>;
}
