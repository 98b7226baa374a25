//! PostgreSQL-backed `PasswordResetRepository`.
//!
//! Consumption is a single `DELETE ... RETURNING`, so a token can be
//! redeemed at most once even under concurrent confirmations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::UserId;
use crate::domain::ports::{
    PasswordResetRecord, PasswordResetRepository, PasswordResetRepositoryError,
};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::PasswordResetRow;
use super::pool::{DbPool, PoolError};
use super::schema::password_resets;

/// Diesel-backed implementation of the `PasswordResetRepository` port.
#[derive(Clone)]
pub struct DieselPasswordResetRepository {
    pool: DbPool,
}

impl DieselPasswordResetRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> PasswordResetRepositoryError {
    map_pool_error(error, |message| PasswordResetRepositoryError::connection(message))
}

fn diesel_error(error: diesel::result::Error) -> PasswordResetRepositoryError {
    map_diesel_error(
        error,
        |message| PasswordResetRepositoryError::query(message),
        |message| PasswordResetRepositoryError::connection(message),
    )
}

#[async_trait]
impl PasswordResetRepository for DieselPasswordResetRepository {
    async fn store(&self, record: &PasswordResetRecord) -> Result<(), PasswordResetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row = PasswordResetRow {
            token_digest: record.token_digest.clone(),
            user_id: *record.user_id.as_uuid(),
            expires_at: record.expires_at,
        };
        diesel::insert_into(password_resets::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn consume(
        &self,
        token_digest: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserId>, PasswordResetRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let grant: Option<PasswordResetRow> =
            diesel::delete(password_resets::table.find(token_digest))
                .returning(PasswordResetRow::as_returning())
                .get_result(&mut conn)
                .await
                .optional()
                .map_err(diesel_error)?;
        Ok(grant
            .filter(|row| row.expires_at > now)
            .map(|row| UserId::from_uuid(row.user_id)))
    }
}
