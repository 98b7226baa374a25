//! PostgreSQL-backed `FavoritesRepository` using the `favorites` junction table.
//!
//! Add is `INSERT ... ON CONFLICT DO NOTHING` and remove is a plain delete, so
//! concurrent toggles never rewrite a whole favourite list.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{FavoritesRepository, FavoritesRepositoryError};
use crate::domain::{ListingId, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::NewFavoriteRow;
use super::pool::{DbPool, PoolError};
use super::schema::favorites;

/// Diesel-backed implementation of the `FavoritesRepository` port.
#[derive(Clone)]
pub struct DieselFavoritesRepository {
    pool: DbPool,
}

impl DieselFavoritesRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> FavoritesRepositoryError {
    map_pool_error(error, |message| FavoritesRepositoryError::connection(message))
}

fn diesel_error(error: diesel::result::Error) -> FavoritesRepositoryError {
    map_diesel_error(
        error,
        |message| FavoritesRepositoryError::query(message),
        |message| FavoritesRepositoryError::connection(message),
    )
}

#[async_trait]
impl FavoritesRepository for DieselFavoritesRepository {
    async fn add(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, FavoritesRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let inserted = diesel::insert_into(favorites::table)
            .values(NewFavoriteRow {
                user_id: *user.as_uuid(),
                listing_id: *listing.as_uuid(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(inserted > 0)
    }

    async fn remove(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, FavoritesRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(favorites::table.find((*user.as_uuid(), *listing.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(deleted > 0)
    }

    async fn contains(
        &self,
        user: &UserId,
        listing: &ListingId,
    ) -> Result<bool, FavoritesRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::select(diesel::dsl::exists(
            favorites::table.find((*user.as_uuid(), *listing.as_uuid())),
        ))
        .get_result(&mut conn)
        .await
        .map_err(diesel_error)
    }

    async fn listing_ids(&self, user: &UserId) -> Result<Vec<ListingId>, FavoritesRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let ids: Vec<Uuid> = favorites::table
            .filter(favorites::user_id.eq(user.as_uuid()))
            .order_by((favorites::created_at.desc(), favorites::listing_id.desc()))
            .select(favorites::listing_id)
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(ids.into_iter().map(ListingId::from_uuid).collect())
    }

    async fn remove_listing(&self, listing: &ListingId) -> Result<usize, FavoritesRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::delete(favorites::table.filter(favorites::listing_id.eq(listing.as_uuid())))
            .execute(&mut conn)
            .await
            .map_err(diesel_error)
    }
}
