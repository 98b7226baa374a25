//! Account lifecycle: registration, login, password reset and profile edits.
//!
//! Passwords only ever reach storage as hashes produced by the
//! [`PasswordHasher`] port. Reset tokens are random, handed to the
//! [`PasswordResetNotifier`] in clear text, and stored as SHA-256 digests so a
//! leaked table cannot be replayed. A reset request for an unknown email
//! succeeds silently so callers cannot discover accounts, and a login for an
//! unknown email still verifies against a dummy hash so response times match.
//!
//! Hashing is CPU bound and runs on Tokio's blocking pool.

use std::sync::Arc;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, TimeDelta, Utc};
use mockable::Clock;
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use tokio::sync::OnceCell;

use crate::domain::ports::{
    AuthService, PasswordHasher, PasswordHasherError, PasswordResetNotifier,
    PasswordResetRecord, PasswordResetRepository, PasswordResetRepositoryError,
    UserProfileCommand, UserProfileQuery, UserRepository, UserRepositoryError,
};
use crate::domain::{
    EmailAddress, Error, LoginCredentials, Password, PasswordResetConfirmation, ProfileUpdate,
    Registration, ResetToken, UserAccount, UserId,
};

/// Lifetime of a password reset token, in seconds.
pub const RESET_TOKEN_TTL_SECS: i64 = 60 * 60;

const RESET_TOKEN_BYTES: usize = 32;
const INVALID_CREDENTIALS: &str = "invalid email or password";
const DUMMY_PASSWORD: &str = "carlot-unknown-account";

/// Account service implementing the authentication and profile ports.
#[derive(Clone)]
pub struct AccountService<U, R, H, N> {
    users: Arc<U>,
    resets: Arc<R>,
    hasher: Arc<H>,
    notifier: Arc<N>,
    clock: Arc<dyn Clock>,
    dummy_hash: Arc<OnceCell<String>>,
}

impl<U, R, H, N> AccountService<U, R, H, N> {
    /// Create a new service.
    pub fn new(
        users: Arc<U>,
        resets: Arc<R>,
        hasher: Arc<H>,
        notifier: Arc<N>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            users,
            resets,
            hasher,
            notifier,
            clock,
            dummy_hash: Arc::new(OnceCell::new()),
        }
    }
}

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserRepositoryError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserRepositoryError::DuplicateEmail { .. } => Error::conflict("email already in use"),
        UserRepositoryError::Missing { id } => Error::not_found(format!("user {id} not found")),
    }
}

fn map_reset_error(error: PasswordResetRepositoryError) -> Error {
    match error {
        PasswordResetRepositoryError::Connection { message } => Error::service_unavailable(
            format!("password reset repository unavailable: {message}"),
        ),
        PasswordResetRepositoryError::Query { message } => {
            Error::internal(format!("password reset repository error: {message}"))
        }
    }
}

fn map_hasher_error(error: PasswordHasherError) -> Error {
    Error::internal(error.to_string())
}

fn token_digest(token: &ResetToken) -> String {
    hex::encode(Sha256::digest(token.expose().as_bytes()))
}

fn generate_reset_token() -> Result<ResetToken, Error> {
    let mut bytes = [0_u8; RESET_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    ResetToken::new(&URL_SAFE_NO_PAD.encode(bytes)).map_err(|err| Error::internal(err.to_string()))
}

fn invalid_reset_token() -> Error {
    Error::invalid_request("reset token is invalid or expired")
}

impl<U, R, H, N> AccountService<U, R, H, N>
where
    U: UserRepository,
{
    fn now(&self) -> DateTime<Utc> {
        self.clock.utc()
    }

    async fn session_account(&self, user_id: &UserId) -> Result<UserAccount, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::unauthorized("login required"))
    }
}

impl<U, R, H, N> AccountService<U, R, H, N>
where
    H: PasswordHasher + 'static,
{
    async fn hash_password(&self, password: &Password) -> Result<String, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.clone();
        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(|err| Error::internal(format!("password hashing task failed: {err}")))?
            .map_err(map_hasher_error)
    }

    async fn verify_password(&self, password: &Password, hash: String) -> Result<bool, Error> {
        let hasher = Arc::clone(&self.hasher);
        let password = password.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|err| Error::internal(format!("password verify task failed: {err}")))?
            .map_err(map_hasher_error)
    }

    /// Hash checked when the email is unknown, computed on first use.
    async fn dummy_hash(&self) -> Result<String, Error> {
        self.dummy_hash
            .get_or_try_init(|| async {
                let password =
                    Password::any(DUMMY_PASSWORD).map_err(|err| Error::internal(err.to_string()))?;
                self.hash_password(&password).await
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl<U, R, H, N> AuthService for AccountService<U, R, H, N>
where
    U: UserRepository,
    R: PasswordResetRepository,
    H: PasswordHasher + 'static,
    N: PasswordResetNotifier,
{
    async fn register(&self, registration: Registration) -> Result<UserAccount, Error> {
        let password_hash = self.hash_password(registration.password()).await?;
        let account = UserAccount::new(
            UserId::random(),
            registration.display_name().clone(),
            registration.email().clone(),
            self.now(),
        );
        self.users
            .insert(&account, &password_hash)
            .await
            .map_err(map_user_error)?;
        tracing::info!(user_id = %account.id(), "account registered");
        Ok(account)
    }

    async fn login(&self, credentials: LoginCredentials) -> Result<UserAccount, Error> {
        let Some(stored) = self
            .users
            .find_credentials(credentials.email())
            .await
            .map_err(map_user_error)?
        else {
            let dummy = self.dummy_hash().await?;
            self.verify_password(credentials.password(), dummy).await?;
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        };
        let matches = self
            .verify_password(credentials.password(), stored.password_hash)
            .await?;
        if !matches {
            return Err(Error::unauthorized(INVALID_CREDENTIALS));
        }
        Ok(stored.account)
    }

    async fn request_password_reset(&self, email: &EmailAddress) -> Result<(), Error> {
        let Some(stored) = self
            .users
            .find_credentials(email)
            .await
            .map_err(map_user_error)?
        else {
            tracing::debug!("password reset requested for unknown email");
            return Ok(());
        };

        let token = generate_reset_token()?;
        let expires_at = self.now() + TimeDelta::seconds(RESET_TOKEN_TTL_SECS);
        let record = PasswordResetRecord {
            token_digest: token_digest(&token),
            user_id: stored.account.id().clone(),
            expires_at,
        };
        self.resets.store(&record).await.map_err(map_reset_error)?;

        // Delivery problems stay server-side; the caller always sees success.
        if let Err(err) = self.notifier.send_reset(email, &token, expires_at).await {
            tracing::error!(
                user_id = %record.user_id,
                error = %err,
                "password reset delivery failed"
            );
        }
        Ok(())
    }

    async fn confirm_password_reset(
        &self,
        confirmation: PasswordResetConfirmation,
    ) -> Result<(), Error> {
        let user_id = self
            .resets
            .consume(&token_digest(confirmation.token()), self.now())
            .await
            .map_err(map_reset_error)?
            .ok_or_else(invalid_reset_token)?;
        let password_hash = self.hash_password(confirmation.new_password()).await?;
        match self.users.update_password_hash(&user_id, &password_hash).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "password reset completed");
                Ok(())
            }
            Err(UserRepositoryError::Missing { .. }) => Err(invalid_reset_token()),
            Err(err) => Err(map_user_error(err)),
        }
    }
}

#[async_trait]
impl<U, R, H, N> UserProfileQuery for AccountService<U, R, H, N>
where
    U: UserRepository,
    R: Send + Sync,
    H: Send + Sync,
    N: Send + Sync,
{
    async fn fetch_profile(&self, user_id: &UserId) -> Result<UserAccount, Error> {
        self.session_account(user_id).await
    }
}

#[async_trait]
impl<U, R, H, N> UserProfileCommand for AccountService<U, R, H, N>
where
    U: UserRepository,
    R: Send + Sync,
    H: Send + Sync,
    N: Send + Sync,
{
    async fn update_profile(
        &self,
        user_id: &UserId,
        update: ProfileUpdate,
    ) -> Result<UserAccount, Error> {
        let mut account = self.session_account(user_id).await?;
        if update.is_empty() {
            return Ok(account);
        }
        account.apply_profile(update);
        self.users
            .update_profile(&account)
            .await
            .map_err(map_user_error)?;
        Ok(account)
    }
}

#[cfg(test)]
#[path = "account_service_tests.rs"]
mod tests;
