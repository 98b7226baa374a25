//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Emails are stored lower-cased (the domain normalises them) and guarded by
//! the `users_email_key` unique index; a violation surfaces as
//! `DuplicateEmail` rather than a generic query failure.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{StoredCredentials, UserRepository, UserRepositoryError};
use crate::domain::{EmailAddress, UserAccount, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, unique_violation};
use super::models::{NewUserRow, UserProfileChangeset, UserRow};
use super::pool::{DbPool, PoolError};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Clone)]
pub struct DieselUserRepository {
    pool: DbPool,
}

impl DieselUserRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> UserRepositoryError {
    map_pool_error(error, |message| UserRepositoryError::connection(message))
}

fn diesel_error(error: diesel::result::Error) -> UserRepositoryError {
    map_diesel_error(
        error,
        |message| UserRepositoryError::query(message),
        |message| UserRepositoryError::connection(message),
    )
}

fn row_error(message: String) -> UserRepositoryError {
    UserRepositoryError::query(message)
}

fn missing(id: &UserId) -> UserRepositoryError {
    UserRepositoryError::missing(id.as_ref())
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    async fn insert(
        &self,
        account: &UserAccount,
        password_hash: &str,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = NewUserRow {
            id: *account.id().as_uuid(),
            email: account.email().as_ref(),
            display_name: account.display_name().as_ref(),
            photo_url: account.photo_url().map(url::Url::as_str),
            password_hash,
            created_at: account.created_at(),
        };
        match diesel::insert_into(users::table)
            .values(&row)
            .execute(&mut conn)
            .await
        {
            Ok(_) => Ok(()),
            Err(err) if unique_violation(&err).is_some_and(|name| name.contains("email")) => {
                Err(UserRepositoryError::duplicate_email(account.email().as_ref()))
            }
            Err(err) => Err(diesel_error(err)),
        }
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<UserAccount>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .find(*id.as_uuid())
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(UserRow::into_account).transpose().map_err(row_error)
    }

    async fn find_credentials(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<StoredCredentials>, UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<UserRow> = users::table
            .filter(users::email.eq(email.as_ref()))
            .select(UserRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let password_hash = row.password_hash.clone();
        let account = row.into_account().map_err(row_error)?;
        Ok(Some(StoredCredentials {
            account,
            password_hash,
        }))
    }

    async fn update_profile(&self, account: &UserAccount) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let changes = UserProfileChangeset {
            display_name: account.display_name().as_ref(),
            photo_url: account.photo_url().map(url::Url::as_str),
        };
        let updated = diesel::update(users::table.find(*account.id().as_uuid()))
            .set((&changes, users::updated_at.eq(diesel::dsl::now)))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(missing(account.id()));
        }
        Ok(())
    }

    async fn update_password_hash(
        &self,
        id: &UserId,
        password_hash: &str,
    ) -> Result<(), UserRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let updated = diesel::update(users::table.find(*id.as_uuid()))
            .set((
                users::password_hash.eq(password_hash),
                users::updated_at.eq(diesel::dsl::now),
            ))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        if updated == 0 {
            return Err(missing(id));
        }
        Ok(())
    }
}
