//! Tests for HTTP error mapping.

use super::*;
use actix_web::body::to_bytes;
use actix_web::{App, HttpResponse, test as actix_test, web};
use rstest::{fixture, rstest};
use serde::Deserialize;
use serde_json::{Value, json};

const TRACE_ID: &str = "00000000-0000-0000-0000-000000000000";

#[fixture]
fn expected_trace_id() -> String {
    TRACE_ID.to_owned()
}

#[rstest]
#[case(Error::invalid_request("bad"), StatusCode::BAD_REQUEST)]
#[case(Error::unauthorized("no auth"), StatusCode::UNAUTHORIZED)]
#[case(Error::forbidden("denied"), StatusCode::FORBIDDEN)]
#[case(Error::not_found("missing"), StatusCode::NOT_FOUND)]
#[case(Error::conflict("revision mismatch"), StatusCode::CONFLICT)]
#[case(Error::service_unavailable("db down"), StatusCode::SERVICE_UNAVAILABLE)]
#[case(Error::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR)]
fn status_code_matches_error_code(#[case] error: Error, #[case] status: StatusCode) {
    assert_eq!(ResponseError::status_code(&error), status);
}

async fn render(error: Error) -> (StatusCode, Option<String>, Error) {
    let response = ResponseError::error_response(&error);
    let status = response.status();
    let header = response
        .headers()
        .get(TRACE_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    let bytes = to_bytes(response.into_body())
        .await
        .expect("reading response body succeeds");
    let payload = serde_json::from_slice(&bytes).expect("Error JSON deserialisation succeeds");
    (status, header, payload)
}

#[rstest]
#[actix_web::test]
async fn internal_errors_are_redacted_but_keep_their_trace_id(expected_trace_id: String) {
    let error = Error::internal("connection string postgres://secret leaked")
        .with_trace_id(expected_trace_id.clone())
        .with_details(json!({ "secret": "x" }));

    let (status, header, payload) = render(error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(header.as_deref(), Some(expected_trace_id.as_str()));
    assert_eq!(payload.code(), ErrorCode::InternalError);
    assert_eq!(payload.message(), "Internal server error");
    assert!(payload.details().is_none());
}

#[rstest]
#[actix_web::test]
async fn conflicts_carry_revision_details(expected_trace_id: String) {
    let details = json!({ "expectedRevision": 1, "actualRevision": 2, "code": "revision_mismatch" });
    let error = Error::conflict("revision mismatch")
        .with_trace_id(expected_trace_id)
        .with_details(details.clone());

    let (status, _, payload) = render(error).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(payload.code(), ErrorCode::Conflict);
    assert_eq!(payload.details(), Some(&details));
}

#[rstest]
#[actix_web::test]
async fn error_without_trace_id_omits_trace_header() {
    let error = Error::invalid_request("bad").with_details(json!({ "field": "price" }));

    let (status, header, payload) = render(error).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(header.is_none());
    assert_eq!(payload.trace_id(), None);
    assert_eq!(payload.details(), Some(&json!({ "field": "price" })));
}

#[rstest]
fn from_actix_error_is_redacted_internal_error() {
    let err: Error = actix_web::error::ErrorBadRequest("boom").into();

    assert_eq!(err.code(), ErrorCode::InternalError);
    assert_eq!(err.message(), "Internal server error");
    assert_eq!(err.details(), None);
}

#[derive(Deserialize)]
struct Body {
    #[expect(dead_code, reason = "deserialised to exercise the extractor only")]
    name: String,
}

#[derive(Deserialize)]
struct Params {
    #[expect(dead_code, reason = "deserialised to exercise the extractor only")]
    limit: usize,
}

fn extractor_app() -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(json_config(16))
        .app_data(query_config())
        .route(
            "/body",
            web::post().to(|_: web::Json<Body>| async { HttpResponse::Ok().finish() }),
        )
        .route(
            "/query",
            web::get().to(|_: web::Query<Params>| async { HttpResponse::Ok().finish() }),
        )
}

async fn error_code_of(response: actix_web::dev::ServiceResponse) -> Value {
    let body: Value = actix_test::read_body_json(response).await;
    body.get("details")
        .and_then(|details| details.get("code"))
        .cloned()
        .unwrap_or(Value::Null)
}

#[rstest]
#[case::malformed("{not json", "malformed_json")]
#[case::oversized(r#"{"name":"a very long value"}"#, "body_too_large")]
#[actix_web::test]
async fn json_failures_use_the_error_envelope(#[case] body: &'static str, #[case] code: &str) {
    let app = actix_test::init_service(extractor_app()).await;
    let request = actix_test::TestRequest::post()
        .uri("/body")
        .insert_header(("content-type", "application/json"))
        .set_payload(body)
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code_of(response).await, json!(code));
}

#[rstest]
#[actix_web::test]
async fn query_failures_use_the_error_envelope() {
    let app = actix_test::init_service(extractor_app()).await;
    let request = actix_test::TestRequest::get()
        .uri("/query?limit=lots")
        .to_request();

    let response = actix_test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(error_code_of(response).await, json!("malformed_query"));
}
