//! Tests for listing HTTP handlers.

use std::collections::HashSet;
use std::sync::Arc;

use super::*;
use crate::domain::ports::MockListingsQuery;
use crate::domain::{ErrorCode, SortField};
use crate::inbound::http::test_utils::{TestBackend, sign_up, test_app, test_backend};
use actix_web::cookie::Cookie;
use actix_web::dev::ServiceResponse;
use actix_web::http::StatusCode;
use actix_web::test as actix_test;
use rstest::{fixture, rstest};
use serde_json::{Value, json};

const PIXEL: &str = "data:image/png;base64,iVBORw0KGgo=";

#[fixture]
fn backend() -> TestBackend {
    test_backend()
}

fn listing_body(brand: &str, price: i64, images: Vec<Value>) -> Value {
    json!({
        "title": format!("{brand} for sale"),
        "brand": brand,
        "model": "Series 3",
        "year": 2019,
        "price": price,
        "kilometers": 42_000,
        "fuelType": "Petrol",
        "transmission": "Automatic",
        "bodyType": "Sedan",
        "owners": 1,
        "location": "Pune",
        "description": "One careful owner.",
        "features": ["Sunroof"],
        "specifications": { "engine": "1998 cc", "seatingCapacity": 5 },
        "sellerType": "individual",
        "sellerName": "Meera",
        "sellerContact": "meera@example.com",
        "images": images,
    })
}

async fn body_json(res: ServiceResponse) -> Value {
    let body = actix_test::read_body(res).await;
    serde_json::from_slice(&body).expect("json body")
}

async fn create<S>(app: &S, cookie: &Cookie<'static>, body: Value) -> Value
where
    S: actix_web::dev::Service<
            actix_http::Request,
            Response = ServiceResponse,
            Error = actix_web::Error,
        >,
{
    let res = actix_test::call_service(
        app,
        actix_test::TestRequest::post()
            .uri("/api/v1/listings")
            .cookie(cookie.clone())
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await
}

/// Path and query of an absolute pagination link.
fn relative(link: &str) -> String {
    let url = Url::parse(link).expect("absolute link");
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_owned(),
    }
}

#[rstest]
fn listing_path_rejects_invalid_ids() {
    let err = parse_path(ListingPath {
        id: "not-a-uuid".to_owned(),
    })
    .expect_err("invalid id");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.details().expect("details")["field"], "id");
}

#[rstest]
#[actix_web::test]
async fn create_uploads_inline_images(backend: TestBackend) {
    let images = backend.images.clone();
    let app = actix_test::init_service(test_app(backend.state)).await;
    let cookie = sign_up(&app, "seller@example.com").await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/listings")
            .cookie(cookie)
            .set_json(listing_body("BMW", 900_000, vec![json!({ "data": PIXEL })]))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let location = res
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned)
        .expect("location header");
    let created = body_json(res).await;

    assert_eq!(location, format!("/api/v1/listings/{}", created["id"].as_str().expect("id")));
    assert_eq!(created["revision"], 2);
    let stored = created["images"].as_array().expect("images");
    assert_eq!(stored.len(), 1);
    let key = stored[0]["key"].as_str().expect("key");
    assert!(key.ends_with(".png"));
    assert_eq!(images.keys().await, vec![key.to_owned()]);
}

#[rstest]
#[actix_web::test]
async fn create_without_images_yields_an_empty_list(backend: TestBackend) {
    let app = actix_test::init_service(test_app(backend.state)).await;
    let cookie = sign_up(&app, "seller@example.com").await;
    let created = create(&app, &cookie, listing_body("Audi", 700_000, vec![])).await;
    assert_eq!(created["images"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn create_requires_a_session(backend: TestBackend) {
    let app = actix_test::init_service(test_app(backend.state)).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/listings")
            .set_json(listing_body("BMW", 900_000, vec![]))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[rstest]
#[case::zero_price(listing_body("BMW", 0, vec![]), "price")]
#[case::bad_seller(
    {
        let mut body = listing_body("BMW", 900_000, vec![]);
        body["sellerType"] = json!("broker");
        body
    },
    "sellerType"
)]
#[case::bad_image(listing_body("BMW", 900_000, vec![json!({ "data": "data:image/png;base64,@@@" })]), "images")]
#[actix_web::test]
async fn create_rejects_invalid_listings(
    backend: TestBackend,
    #[case] body: Value,
    #[case] field: &str,
) {
    let listings = backend.listings.clone();
    let app = actix_test::init_service(test_app(backend.state)).await;
    let cookie = sign_up(&app, "seller@example.com").await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/listings")
            .cookie(cookie)
            .set_json(body)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["details"]["field"], field);
    assert!(listings.is_empty().await);
}

#[rstest]
#[actix_web::test]
async fn cursor_walk_returns_every_listing_once(backend: TestBackend) {
    let app = actix_test::init_service(test_app(backend.state)).await;
    let cookie = sign_up(&app, "seller@example.com").await;
    let mut expected = HashSet::new();
    for price in [500_000, 600_000, 600_000, 700_000, 800_000] {
        let created = create(&app, &cookie, listing_body("BMW", price, vec![])).await;
        expected.insert(created["id"].as_str().expect("id").to_owned());
    }
    create(&app, &cookie, listing_body("Audi", 650_000, vec![])).await;

    let mut seen = HashSet::new();
    let mut uri = "/api/v1/listings?brand=BMW&sort=price&order=asc&limit=2".to_owned();
    let mut pages = 0;
    loop {
        let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(&uri).to_request()).await;
        assert_eq!(res.status(), StatusCode::OK);
        let page = body_json(res).await;
        assert_eq!(page["limit"], 2);
        let data = page["data"].as_array().expect("data");
        assert!(data.len() <= 2);
        for listing in data {
            assert_eq!(listing["brand"], "BMW");
            assert!(seen.insert(listing["id"].as_str().expect("id").to_owned()));
        }
        pages += 1;
        match page["links"]["next"].as_str() {
            Some(next) => uri = relative(next),
            None => break,
        }
        assert!(pages < 10, "pagination does not terminate");
    }
    assert_eq!(seen, expected);
}

#[rstest]
#[case::reversed_range("/api/v1/listings?price=900-100", "price")]
#[case::unknown_sort("/api/v1/listings?sort=colour", "sort")]
#[case::garbage_cursor("/api/v1/listings?cursor=%21%21%21", "cursor")]
#[actix_web::test]
async fn search_rejects_bad_parameters(
    backend: TestBackend,
    #[case] uri: &str,
    #[case] field: &str,
) {
    let app = actix_test::init_service(test_app(backend.state)).await;
    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn search_hands_parsed_filters_to_the_port() {
    let mut query = MockListingsQuery::new();
    query
        .expect_search()
        .withf(|query| {
            query.filter.body_types == ["SUV", "Sedan"]
                && query.filter.is_featured == Some(true)
                && query.sort.field == SortField::Year
                && query.limit.get() == 5
        })
        .times(1)
        .returning(|query| {
            Ok(ListingPage {
                listings: Vec::new(),
                next: None,
                limit: query.limit.get(),
            })
        });
    let mut state = test_backend().state;
    state.listings = Arc::new(query);

    let app = actix_test::init_service(test_app(state)).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/listings?bodyType=SUV,Sedan&isFeatured=true&sort=year&limit=5")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let page = body_json(res).await;
    assert_eq!(page["data"], json!([]));
    assert!(page["links"].get("next").is_none());
    let self_link = page["links"]["self"].as_str().expect("self link");
    assert!(self_link.contains("bodyType=SUV%2CSedan"));
    assert!(self_link.ends_with("limit=5"));
}

#[rstest]
#[case::malformed("/api/v1/listings/nope", StatusCode::BAD_REQUEST)]
#[case::missing("/api/v1/listings/3fa85f64-5717-4562-b3fc-2c963f66afa6", StatusCode::NOT_FOUND)]
#[actix_web::test]
async fn get_reports_bad_or_unknown_ids(
    backend: TestBackend,
    #[case] uri: &str,
    #[case] status: StatusCode,
) {
    let app = actix_test::init_service(test_app(backend.state)).await;
    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(uri).to_request()).await;
    assert_eq!(res.status(), status);
}

#[rstest]
#[actix_web::test]
async fn update_bumps_revision_and_timestamp(backend: TestBackend) {
    let images = backend.images.clone();
    let app = actix_test::init_service(test_app(backend.state)).await;
    let cookie = sign_up(&app, "seller@example.com").await;
    let created = create(
        &app,
        &cookie,
        listing_body("BMW", 900_000, vec![json!({ "data": PIXEL })]),
    )
    .await;
    let id = created["id"].as_str().expect("id");
    let old_key = created["images"][0]["key"].as_str().expect("key").to_owned();

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/listings/{id}"))
            .cookie(cookie.clone())
            .set_json(json!({
                "price": 850_000,
                "oldPrice": 900_000,
                "isReduced": true,
                "removeImages": [old_key],
                "newImages": [{ "contentType": "image/jpeg", "data": "/9j/4AAQ" }],
                "expectedRevision": created["revision"],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let updated = body_json(res).await;
    let listing = &updated["listing"];
    assert_eq!(listing["revision"], 3);
    assert_eq!(listing["price"], 850_000);
    assert_eq!(listing["oldPrice"], 900_000);
    assert_eq!(updated["orphanedKeys"], json!([]));
    assert!(
        listing["updatedAt"].as_str().expect("updatedAt")
            > created["updatedAt"].as_str().expect("updatedAt")
    );
    let new_key = listing["images"][0]["key"].as_str().expect("key");
    assert!(new_key.ends_with(".jpg"));
    assert_eq!(images.keys().await, vec![new_key.to_owned()]);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&format!("/api/v1/listings/{id}"))
            .cookie(cookie)
            .set_json(json!({ "price": 1, "expectedRevision": created["revision"] }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn only_the_seller_may_modify(backend: TestBackend) {
    let app = actix_test::init_service(test_app(backend.state)).await;
    let seller = sign_up(&app, "seller@example.com").await;
    let intruder = sign_up(&app, "intruder@example.com").await;
    let created = create(&app, &seller, listing_body("BMW", 900_000, vec![])).await;
    let uri = format!("/api/v1/listings/{}", created["id"].as_str().expect("id"));

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::patch()
            .uri(&uri)
            .cookie(intruder.clone())
            .set_json(json!({ "price": 1, "expectedRevision": created["revision"] }))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete().uri(&uri).cookie(intruder).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn delete_removes_listing_and_images(backend: TestBackend) {
    let images = backend.images.clone();
    let app = actix_test::init_service(test_app(backend.state)).await;
    let cookie = sign_up(&app, "seller@example.com").await;
    let created = create(
        &app,
        &cookie,
        listing_body("BMW", 900_000, vec![json!({ "data": PIXEL }), json!({ "data": PIXEL })]),
    )
    .await;
    let uri = format!("/api/v1/listings/{}", created["id"].as_str().expect("id"));
    assert_eq!(images.keys().await.len(), 2);

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::delete().uri(&uri).cookie(cookie).to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    assert!(images.keys().await.is_empty());

    let res = actix_test::call_service(&app, actix_test::TestRequest::get().uri(&uri).to_request()).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[rstest]
#[actix_web::test]
async fn similar_listings_exclude_the_original(backend: TestBackend) {
    let app = actix_test::init_service(test_app(backend.state)).await;
    let cookie = sign_up(&app, "seller@example.com").await;
    let original = create(&app, &cookie, listing_body("BMW", 900_000, vec![])).await;
    for brand in ["Audi", "Skoda", "Honda", "Kia"] {
        create(&app, &cookie, listing_body(brand, 800_000, vec![])).await;
    }
    let id = original["id"].as_str().expect("id");

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri(&format!("/api/v1/listings/{id}/similar"))
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let similar = body_json(res).await;
    let similar = similar.as_array().expect("array");
    assert_eq!(similar.len(), 3);
    assert!(similar.iter().all(|listing| listing["id"] != id));
}
