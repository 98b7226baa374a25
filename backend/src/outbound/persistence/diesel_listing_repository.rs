//! PostgreSQL-backed `ListingRepository` implementation using Diesel ORM.
//!
//! Searches translate a [`StoreQuery`] into a boxed Diesel query: inclusion
//! lists become `IN` predicates, the single range becomes bounds on its
//! column, and the cursor becomes a keyset predicate over
//! `(sort column, id)` matching the ORDER BY. Updates and deletes are
//! revision-checked.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::Pg;
use diesel::prelude::*;
use diesel_async::{AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{ListingRepository, ListingRepositoryError};
use crate::domain::{Listing, ListingFilter, ListingId, SortDirection, SortField, StoreQuery};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error};
use super::models::{ListingRow, revision_for_db};
use super::pool::{DbPool, PoolError};
use super::schema::listings;

type BoxedListings = listings::BoxedQuery<'static, Pg>;

/// Diesel-backed implementation of the `ListingRepository` port.
#[derive(Clone)]
pub struct DieselListingRepository {
    pool: DbPool,
}

impl DieselListingRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn pool_error(error: PoolError) -> ListingRepositoryError {
    map_pool_error(error, |message| ListingRepositoryError::connection(message))
}

fn diesel_error(error: diesel::result::Error) -> ListingRepositoryError {
    map_diesel_error(
        error,
        |message| ListingRepositoryError::query(message),
        |message| ListingRepositoryError::connection(message),
    )
}

fn row_error(message: String) -> ListingRepositoryError {
    ListingRepositoryError::query(message)
}

fn rows_to_listings(rows: Vec<ListingRow>) -> Result<Vec<Listing>, ListingRepositoryError> {
    rows.into_iter()
        .map(ListingRow::into_listing)
        .collect::<Result<Vec<_>, _>>()
        .map_err(row_error)
}

/// Saturating conversion for year bounds and cursors.
fn clamp_to_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

fn micros_to_timestamp(micros: i64) -> Result<DateTime<Utc>, ListingRepositoryError> {
    DateTime::<Utc>::from_timestamp_micros(micros)
        .ok_or_else(|| ListingRepositoryError::query(format!("cursor timestamp {micros} out of range")))
}

fn filtered(filter: &ListingFilter) -> BoxedListings {
    let mut query = listings::table.into_boxed();
    if !filter.brands.is_empty() {
        query = query.filter(listings::brand.eq_any(filter.brands.clone()));
    }
    if !filter.models.is_empty() {
        query = query.filter(listings::model.eq_any(filter.models.clone()));
    }
    if !filter.body_types.is_empty() {
        query = query.filter(listings::body_type.eq_any(filter.body_types.clone()));
    }
    if !filter.fuel_types.is_empty() {
        query = query.filter(listings::fuel_type.eq_any(filter.fuel_types.clone()));
    }
    if !filter.transmissions.is_empty() {
        query = query.filter(listings::transmission.eq_any(filter.transmissions.clone()));
    }
    if let Some(flag) = filter.is_new {
        query = query.filter(listings::is_new.eq(flag));
    }
    if let Some(flag) = filter.is_featured {
        query = query.filter(listings::is_featured.eq(flag));
    }
    if let Some(seller) = &filter.seller {
        query = query.filter(listings::seller_id.eq(*seller.as_uuid()));
    }
    if let Some(range) = filter.price {
        query = query.filter(listings::price.ge(range.min));
        if let Some(max) = range.max {
            query = query.filter(listings::price.le(max));
        }
    }
    if let Some(range) = filter.year {
        query = query.filter(listings::year.ge(clamp_to_i32(range.min)));
        if let Some(max) = range.max {
            query = query.filter(listings::year.le(clamp_to_i32(max)));
        }
    }
    query
}

/// Apply the keyset predicate and ORDER BY for one sort column.
macro_rules! keyset {
    ($query:expr, $column:expr, $after:expr, $direction:expr) => {{
        let mut query = $query;
        if let Some((value, id)) = $after {
            query = match $direction {
                SortDirection::Asc => query.filter(
                    $column
                        .gt(value)
                        .or($column.eq(value).and(listings::id.gt(id))),
                ),
                SortDirection::Desc => query.filter(
                    $column
                        .lt(value)
                        .or($column.eq(value).and(listings::id.lt(id))),
                ),
            };
        }
        match $direction {
            SortDirection::Asc => query.order_by(($column.asc(), listings::id.asc())),
            SortDirection::Desc => query.order_by(($column.desc(), listings::id.desc())),
        }
    }};
}

fn search_query(query: &StoreQuery) -> Result<BoxedListings, ListingRepositoryError> {
    let base = filtered(&query.filter);
    let direction = query.sort.direction;
    let after = query.after.map(|cursor| (cursor.value, cursor.id));
    let ordered = match query.sort.field {
        SortField::CreatedAt => {
            let after = after
                .map(|(micros, id)| micros_to_timestamp(micros).map(|at| (at, id)))
                .transpose()?;
            keyset!(base, listings::created_at, after, direction)
        }
        SortField::Price => keyset!(base, listings::price, after, direction),
        SortField::Year => {
            let after = after.map(|(year, id)| (clamp_to_i32(year), id));
            keyset!(base, listings::year, after, direction)
        }
        SortField::Kilometers => keyset!(base, listings::kilometers, after, direction),
    };
    let fetch = i64::try_from(query.fetch).unwrap_or(i64::MAX);
    Ok(ordered.limit(fetch))
}

/// Classify a revision-guarded write that touched no rows: either the
/// listing is gone or another writer moved the revision on.
async fn explain_missed_write(
    conn: &mut AsyncPgConnection,
    id: &ListingId,
    expected_revision: u32,
) -> ListingRepositoryError {
    let current: Result<Option<i32>, _> = listings::table
        .find(*id.as_uuid())
        .select(listings::revision)
        .first(conn)
        .await
        .optional();
    match current {
        Ok(Some(actual)) => ListingRepositoryError::revision_mismatch(
            expected_revision,
            u32::try_from(actual).unwrap_or_default(),
        ),
        Ok(None) => ListingRepositoryError::missing(id.to_string()),
        Err(err) => diesel_error(err),
    }
}

#[async_trait]
impl ListingRepository for DieselListingRepository {
    async fn insert(&self, listing: &Listing) -> Result<(), ListingRepositoryError> {
        let row = ListingRow::from_listing(listing).map_err(row_error)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        diesel::insert_into(listings::table)
            .values(&row)
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find(&self, id: &ListingId) -> Result<Option<Listing>, ListingRepositoryError> {
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let row: Option<ListingRow> = listings::table
            .find(*id.as_uuid())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(ListingRow::into_listing)
            .transpose()
            .map_err(row_error)
    }

    async fn find_many(&self, ids: &[ListingId]) -> Result<Vec<Listing>, ListingRepositoryError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let uuids: Vec<uuid::Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<ListingRow> = listings::table
            .filter(listings::id.eq_any(uuids))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        rows_to_listings(rows)
    }

    async fn search(&self, query: &StoreQuery) -> Result<Vec<Listing>, ListingRepositoryError> {
        let statement = search_query(query)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let rows: Vec<ListingRow> = statement.load(&mut conn).await.map_err(diesel_error)?;
        rows_to_listings(rows)
    }

    async fn update(
        &self,
        listing: &Listing,
        expected_revision: u32,
    ) -> Result<(), ListingRepositoryError> {
        let row = ListingRow::from_listing(listing).map_err(row_error)?;
        let expected = revision_for_db(expected_revision).map_err(row_error)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;

        let updated_rows = diesel::update(
            listings::table.filter(
                listings::id
                    .eq(row.id)
                    .and(listings::revision.eq(expected)),
            ),
        )
        .set(&row)
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        if updated_rows > 0 {
            return Ok(());
        }
        Err(explain_missed_write(&mut conn, &listing.id, expected_revision).await)
    }

    async fn delete(
        &self,
        id: &ListingId,
        expected_revision: u32,
    ) -> Result<(), ListingRepositoryError> {
        let expected = revision_for_db(expected_revision).map_err(row_error)?;
        let mut conn = self.pool.get().await.map_err(pool_error)?;
        let deleted = diesel::delete(
            listings::table.filter(
                listings::id
                    .eq(*id.as_uuid())
                    .and(listings::revision.eq(expected)),
            ),
        )
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        if deleted > 0 {
            return Ok(());
        }
        Err(explain_missed_write(&mut conn, id, expected_revision).await)
    }
}

#[cfg(test)]
mod tests {
    //! Query construction coverage; no database required.
    use super::*;
    use crate::domain::{ListingCursor, ListingSort, NumericRange};
    use crate::domain::test_support::listing_fixture;
    use diesel::debug_query;
    use rstest::rstest;

    fn sql_for(query: &StoreQuery) -> String {
        let statement = search_query(query).expect("query builds");
        debug_query::<Pg, _>(&statement).to_string()
    }

    fn store_query(sort: ListingSort) -> StoreQuery {
        StoreQuery {
            filter: ListingFilter::default(),
            sort,
            after: None,
            fetch: 13,
        }
    }

    #[rstest]
    fn default_search_orders_newest_first_with_id_tie_breaker() {
        let sql = sql_for(&store_query(ListingSort::default()));
        assert!(sql.contains(r#"ORDER BY "listings"."created_at" DESC, "listings"."id" DESC"#));
        assert!(sql.contains("LIMIT"));
    }

    #[rstest]
    fn cursor_becomes_a_keyset_predicate() {
        let sort = ListingSort {
            field: SortField::Price,
            direction: SortDirection::Asc,
        };
        let mut query = store_query(sort);
        query.after = Some(ListingCursor::after(&listing_fixture(|_| {}), sort));

        let sql = sql_for(&query);
        assert!(sql.contains(r#""listings"."price" > $"#));
        assert!(sql.contains(r#""listings"."id" > $"#));
    }

    #[rstest]
    fn filters_become_predicates() {
        let mut query = store_query(ListingSort::default());
        query.filter = ListingFilter {
            brands: vec!["Kia".to_owned()],
            year: Some(NumericRange {
                min: 2018,
                max: Some(2022),
            }),
            is_new: Some(true),
            ..ListingFilter::default()
        };

        let sql = sql_for(&query);
        assert!(sql.contains(r#""listings"."brand" = ANY"#) || sql.contains(r#""listings"."brand" IN"#));
        assert!(sql.contains(r#""listings"."year" >= $"#));
        assert!(sql.contains(r#""listings"."year" <= $"#));
        assert!(sql.contains(r#""listings"."is_new" = $"#));
    }

    #[rstest]
    #[case(i64::MAX, i32::MAX)]
    #[case(i64::MIN, i32::MIN)]
    #[case(2024, 2024)]
    fn year_bounds_saturate(#[case] input: i64, #[case] expected: i32) {
        assert_eq!(clamp_to_i32(input), expected);
    }

    #[rstest]
    fn pool_errors_are_connection_errors() {
        let err = pool_error(PoolError::checkout("refused"));
        assert!(matches!(err, ListingRepositoryError::Connection { .. }));
    }
}
