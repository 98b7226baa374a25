//! Listing search: filters, sort order, keyset cursors and the query plan
//! handed to listing repositories.
//!
//! Repositories receive at most one numeric range predicate. When a caller
//! asks for both a price and a year range, [`QueryPlan::from_query`] pushes
//! the range on the sort field (or price when sorting by neither) to the
//! store and keeps the other as a post-fetch filter that the catalogue
//! service applies while scanning batches.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use pagination::PageLimit;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::listing::Listing;
use super::user::UserId;

/// Store batch size used while a post-fetch filter is active.
pub const SCAN_BATCH_SIZE: usize = 50;
/// Maximum store batches scanned to fill one page.
pub const MAX_SCAN_BATCHES: usize = 8;

/// Listing attribute a search may be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    CreatedAt,
    Price,
    Year,
    Kilometers,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CreatedAt => "createdAt",
            Self::Price => "price",
            Self::Year => "year",
            Self::Kilometers => "kilometers",
        }
    }

    /// Range field matching this sort, if any.
    fn range_field(self) -> Option<RangeField> {
        match self {
            Self::Price => Some(RangeField::Price),
            Self::Year => Some(RangeField::Year),
            Self::CreatedAt | Self::Kilometers => None,
        }
    }
}

impl FromStr for SortField {
    type Err = ListingQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "createdAt" => Ok(Self::CreatedAt),
            "price" => Ok(Self::Price),
            "year" => Ok(Self::Year),
            "kilometers" => Ok(Self::Kilometers),
            other => Err(ListingQueryError::UnknownSortField(other.to_owned())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl FromStr for SortDirection {
    type Err = ListingQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            other => Err(ListingQueryError::UnknownSortDirection(other.to_owned())),
        }
    }
}

/// Sort order of a search. Defaults to newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ListingSort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for ListingSort {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

impl ListingSort {
    /// Total order over listings: sort value, then id as a tie breaker, both
    /// in the requested direction.
    pub fn compare(&self, a: &Listing, b: &Listing) -> Ordering {
        let ordering = sort_value(a, self.field)
            .cmp(&sort_value(b, self.field))
            .then_with(|| a.id.cmp(&b.id));
        match self.direction {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Value of `field` for keyset comparisons. Timestamps use microseconds.
pub fn sort_value(listing: &Listing, field: SortField) -> i64 {
    match field {
        SortField::CreatedAt => listing.created_at.timestamp_micros(),
        SortField::Price => listing.details.price,
        SortField::Year => i64::from(listing.details.year),
        SortField::Kilometers => listing.details.kilometers,
    }
}

/// Numeric attribute a range filter applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeField {
    Price,
    Year,
}

impl RangeField {
    pub fn value_of(self, listing: &Listing) -> i64 {
        match self {
            Self::Price => listing.details.price,
            Self::Year => i64::from(listing.details.year),
        }
    }
}

/// Inclusive numeric range written `"min-max"` or `"min+"`.
///
/// # Examples
/// ```
/// use carlot::domain::NumericRange;
///
/// let bounded: NumericRange = "500000-1000000".parse().unwrap();
/// assert!(bounded.contains(1_000_000));
/// let open: NumericRange = "2020+".parse().unwrap();
/// assert_eq!(open.max, None);
/// assert!("10-5".parse::<NumericRange>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumericRange {
    pub min: i64,
    pub max: Option<i64>,
}

impl NumericRange {
    pub fn contains(&self, value: i64) -> bool {
        value >= self.min && self.max.is_none_or(|max| value <= max)
    }
}

impl FromStr for NumericRange {
    type Err = ListingQueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let malformed = || ListingQueryError::MalformedRange(raw.to_owned());
        let parse = |part: &str| part.trim().parse::<i64>().map_err(|_| malformed());

        if let Some(min) = raw.strip_suffix('+') {
            return Ok(Self {
                min: parse(min)?,
                max: None,
            });
        }
        let (min, max) = raw.split_once('-').ok_or_else(malformed)?;
        let (min, max) = (parse(min)?, parse(max)?);
        if min > max {
            return Err(ListingQueryError::ReversedRange { min, max });
        }
        Ok(Self {
            min,
            max: Some(max),
        })
    }
}

/// Search filters. Empty inclusion lists and `None` values match anything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFilter {
    pub brands: Vec<String>,
    pub models: Vec<String>,
    pub body_types: Vec<String>,
    pub fuel_types: Vec<String>,
    pub transmissions: Vec<String>,
    pub price: Option<NumericRange>,
    pub year: Option<NumericRange>,
    pub is_new: Option<bool>,
    pub is_featured: Option<bool>,
    pub seller: Option<UserId>,
}

fn included(list: &[String], value: &str) -> bool {
    list.is_empty() || list.iter().any(|candidate| candidate == value)
}

impl ListingFilter {
    /// Whether `listing` satisfies every predicate of this filter.
    pub fn matches(&self, listing: &Listing) -> bool {
        let details = &listing.details;
        included(&self.brands, &details.brand)
            && included(&self.models, &details.model)
            && included(&self.body_types, &details.body_type)
            && included(&self.fuel_types, &details.fuel_type)
            && included(&self.transmissions, &details.transmission)
            && self.is_new.is_none_or(|flag| flag == details.is_new)
            && self.is_featured.is_none_or(|flag| flag == details.is_featured)
            && self
                .seller
                .as_ref()
                .is_none_or(|seller| listing.is_owned_by(seller))
            && self
                .price
                .is_none_or(|range| range.contains(RangeField::Price.value_of(listing)))
            && self
                .year
                .is_none_or(|range| range.contains(RangeField::Year.value_of(listing)))
    }

    /// Number of range predicates set.
    pub fn range_count(&self) -> usize {
        usize::from(self.price.is_some()) + usize::from(self.year.is_some())
    }

    fn take_range(&mut self, field: RangeField) -> Option<NumericRange> {
        match field {
            RangeField::Price => self.price.take(),
            RangeField::Year => self.year.take(),
        }
    }
}

/// Keyset position: the sort value and id of the last listing seen, bound to
/// the sort it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingCursor {
    #[serde(rename = "s")]
    pub sort: ListingSort,
    #[serde(rename = "v")]
    pub value: i64,
    #[serde(rename = "id")]
    pub id: Uuid,
}

impl ListingCursor {
    /// Cursor pointing just past `listing` under `sort`.
    pub fn after(listing: &Listing, sort: ListingSort) -> Self {
        Self {
            sort,
            value: sort_value(listing, sort.field),
            id: *listing.id.as_uuid(),
        }
    }

    /// Whether `listing` comes strictly after this cursor.
    pub fn admits(&self, listing: &Listing) -> bool {
        let key = (sort_value(listing, self.sort.field), *listing.id.as_uuid());
        let ordering = key.cmp(&(self.value, self.id));
        match self.sort.direction {
            SortDirection::Asc => ordering == Ordering::Greater,
            SortDirection::Desc => ordering == Ordering::Less,
        }
    }
}

/// Search request as issued by a caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingQuery {
    pub filter: ListingFilter,
    pub sort: ListingSort,
    pub limit: PageLimit,
    pub after: Option<ListingCursor>,
}

/// Query handed to a listing repository.
///
/// ## Invariants
/// - `filter` carries at most one range predicate.
/// - Results are ordered by `sort` (see [`ListingSort::compare`]), start
///   strictly after `after`, and hold at most `fetch` listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreQuery {
    pub filter: ListingFilter,
    pub sort: ListingSort,
    pub after: Option<ListingCursor>,
    pub fetch: usize,
}

/// Store query plus the range filter held back for post-fetch evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    pub store: StoreQuery,
    pub post_filter: Option<(RangeField, NumericRange)>,
    pub limit: usize,
}

impl QueryPlan {
    /// Split a search into a store query and an optional post-fetch filter.
    ///
    /// Without a post-fetch filter the store is asked for one extra row so the
    /// caller can tell whether another page exists.
    pub fn from_query(query: ListingQuery) -> Result<Self, ListingQueryError> {
        let ListingQuery {
            mut filter,
            sort,
            limit,
            after,
        } = query;
        if after.is_some_and(|cursor| cursor.sort != sort) {
            return Err(ListingQueryError::CursorSortMismatch);
        }

        let limit = limit.get();
        let post_filter = if filter.range_count() > 1 {
            let pushed = sort.field.range_field().unwrap_or(RangeField::Price);
            let held_back = match pushed {
                RangeField::Price => RangeField::Year,
                RangeField::Year => RangeField::Price,
            };
            filter.take_range(held_back).map(|range| (held_back, range))
        } else {
            None
        };
        let fetch = if post_filter.is_some() {
            SCAN_BATCH_SIZE.max(limit + 1)
        } else {
            limit + 1
        };

        Ok(Self {
            store: StoreQuery {
                filter,
                sort,
                after,
                fetch,
            },
            post_filter,
            limit,
        })
    }

    /// Whether `listing` passes the held-back range filter.
    pub fn post_filter_accepts(&self, listing: &Listing) -> bool {
        self.post_filter
            .is_none_or(|(field, range)| range.contains(field.value_of(listing)))
    }
}

/// One page of search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    pub next: Option<ListingCursor>,
    pub limit: usize,
}

/// Invalid search input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingQueryError {
    UnknownSortField(String),
    UnknownSortDirection(String),
    MalformedRange(String),
    ReversedRange { min: i64, max: i64 },
    CursorSortMismatch,
}

impl fmt::Display for ListingQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSortField(value) => write!(f, "unknown sort field: {value}"),
            Self::UnknownSortDirection(value) => write!(f, "unknown sort direction: {value}"),
            Self::MalformedRange(value) => {
                write!(f, "range must look like \"min-max\" or \"min+\": {value}")
            }
            Self::ReversedRange { min, max } => {
                write!(f, "range minimum {min} exceeds maximum {max}")
            }
            Self::CursorSortMismatch => write!(f, "cursor was issued for a different sort"),
        }
    }
}

impl std::error::Error for ListingQueryError {}

#[cfg(test)]
mod tests;
