//! Tests for search parsing, ordering and query planning.

use super::*;
use crate::domain::listing::{
    ListingDetails, ListingId, Seller, SellerType, Specifications,
};
use chrono::{Duration, TimeZone, Utc};
use rstest::rstest;

fn listing(price: i64, year: i32, age_minutes: i64) -> Listing {
    let created = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .expect("valid timestamp")
        - Duration::minutes(age_minutes);
    Listing {
        id: ListingId::random(),
        details: ListingDetails {
            title: "Listing".to_owned(),
            brand: "Toyota".to_owned(),
            model: "Corolla".to_owned(),
            year,
            price,
            old_price: None,
            kilometers: 10_000,
            fuel_type: "Petrol".to_owned(),
            transmission: "Manual".to_owned(),
            body_type: "Sedan".to_owned(),
            owners: 1,
            location: "Leeds".to_owned(),
            description: String::new(),
            features: Vec::new(),
            specifications: Specifications {
                seating_capacity: 5,
                ..Specifications::default()
            },
            is_new: false,
            is_featured: false,
            is_reduced: false,
        },
        seller: Seller {
            user_id: UserId::random(),
            seller_type: SellerType::Dealer,
            name: "Dealer".to_owned(),
            contact: "dealer@example.com".to_owned(),
        },
        images: Vec::new(),
        created_at: created,
        updated_at: created,
        revision: 1,
    }
}

#[rstest]
#[case("100-200", 100, Some(200))]
#[case(" 2015+ ", 2015, None)]
#[case("5-5", 5, Some(5))]
fn ranges_parse(#[case] raw: &str, #[case] min: i64, #[case] max: Option<i64>) {
    assert_eq!(raw.parse::<NumericRange>(), Ok(NumericRange { min, max }));
}

#[rstest]
#[case("abc")]
#[case("10-")]
#[case("-10")]
#[case("1e3+")]
#[case("")]
fn malformed_ranges_are_rejected(#[case] raw: &str) {
    assert!(matches!(
        raw.parse::<NumericRange>(),
        Err(ListingQueryError::MalformedRange(_))
    ));
}

#[rstest]
fn reversed_ranges_are_rejected() {
    assert_eq!(
        "2020-2010".parse::<NumericRange>(),
        Err(ListingQueryError::ReversedRange {
            min: 2020,
            max: 2010
        })
    );
}

#[rstest]
fn filters_match_inclusion_lists_and_flags() {
    let car = listing(15_000, 2019, 0);
    let mut filter = ListingFilter {
        brands: vec!["Honda".to_owned(), "Toyota".to_owned()],
        is_new: Some(false),
        ..ListingFilter::default()
    };
    assert!(filter.matches(&car));

    filter.body_types = vec!["SUV".to_owned()];
    assert!(!filter.matches(&car));
}

#[rstest]
fn sort_compare_breaks_ties_by_id() {
    let a = listing(10_000, 2020, 0);
    let mut b = listing(10_000, 2020, 0);
    b.created_at = a.created_at;
    let sort = ListingSort {
        field: SortField::Price,
        direction: SortDirection::Asc,
    };
    assert_eq!(sort.compare(&a, &b), a.id.cmp(&b.id));
}

#[rstest]
#[case(SortDirection::Asc)]
#[case(SortDirection::Desc)]
fn cursor_admits_only_later_rows(#[case] direction: SortDirection) {
    let sort = ListingSort {
        field: SortField::Year,
        direction,
    };
    let mut rows = vec![
        listing(1, 2018, 0),
        listing(1, 2019, 0),
        listing(1, 2019, 0),
        listing(1, 2020, 0),
    ];
    rows.sort_by(|a, b| sort.compare(a, b));

    let cursor = ListingCursor::after(&rows[1], sort);
    let admitted: Vec<_> = rows.iter().filter(|row| cursor.admits(row)).collect();

    assert_eq!(admitted.len(), 2);
    assert_eq!(admitted[0].id, rows[2].id);
}

#[rstest]
fn plan_fetches_one_extra_row_without_post_filter() {
    let plan = QueryPlan::from_query(ListingQuery {
        limit: PageLimit::new(Some(10)),
        ..ListingQuery::default()
    })
    .expect("valid query");

    assert_eq!(plan.store.fetch, 11);
    assert!(plan.post_filter.is_none());
}

#[rstest]
#[case::sort_by_year(SortField::Year, RangeField::Price)]
#[case::sort_by_price(SortField::Price, RangeField::Year)]
#[case::sort_by_date(SortField::CreatedAt, RangeField::Year)]
fn plan_pushes_a_single_range_to_the_store(
    #[case] field: SortField,
    #[case] held_back: RangeField,
) {
    let plan = QueryPlan::from_query(ListingQuery {
        filter: ListingFilter {
            price: Some(NumericRange { min: 1, max: Some(9) }),
            year: Some(NumericRange { min: 2000, max: None }),
            ..ListingFilter::default()
        },
        sort: ListingSort {
            field,
            direction: SortDirection::Asc,
        },
        ..ListingQuery::default()
    })
    .expect("valid query");

    assert_eq!(plan.store.filter.range_count(), 1);
    assert_eq!(plan.post_filter.map(|(f, _)| f), Some(held_back));
    assert!(plan.store.fetch >= SCAN_BATCH_SIZE);
}

#[rstest]
fn plan_rejects_cursor_from_another_sort() {
    let row = listing(1, 2020, 0);
    let cursor = ListingCursor::after(&row, ListingSort::default());
    let result = QueryPlan::from_query(ListingQuery {
        sort: ListingSort {
            field: SortField::Price,
            direction: SortDirection::Desc,
        },
        after: Some(cursor),
        ..ListingQuery::default()
    });

    assert_eq!(result, Err(ListingQueryError::CursorSortMismatch));
}

#[rstest]
fn cursor_serialises_compactly() {
    let row = listing(1, 2020, 0);
    let cursor = ListingCursor::after(&row, ListingSort::default());
    let value = serde_json::to_value(cursor).expect("serialises");

    assert_eq!(value["s"]["field"], "createdAt");
    assert_eq!(value["s"]["direction"], "desc");
    assert_eq!(value["v"], row.created_at.timestamp_micros());
}
