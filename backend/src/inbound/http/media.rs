//! Stored listing images.
//!
//! ```text
//! GET /media/listings/<listing id>/<object id>.jpg
//! ```
//!
//! Served outside `/api/v1` so image URLs stay stable across API versions.

use actix_web::http::header::{CacheControl, CacheDirective, ContentType};
use actix_web::{HttpResponse, get, web};

use crate::domain::Error;
use crate::domain::listing_command_service::map_image_error;
use crate::domain::ports::ImageStoreError;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;

/// Object ids are random, so a stored object never changes under its key.
const MEDIA_MAX_AGE_SECS: u32 = 60 * 60 * 24 * 365;

/// Serve one stored image.
#[utoipa::path(
    get,
    path = "/media/{key}",
    params(("key" = String, Path, description = "Object key, may contain slashes")),
    responses(
        (status = 200, description = "Image bytes", content_type = "image/*"),
        (status = 404, description = "No such object", body = Error),
        (status = 503, description = "Image store unavailable", body = Error)
    ),
    tags = ["media"],
    operation_id = "getMedia"
)]
#[get("/media/{key:.*}")]
pub async fn get_media(
    state: web::Data<HttpState>,
    key: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let key = key.into_inner();
    let image = state.media.get(&key).await.map_err(|err| match err {
        ImageStoreError::InvalidKey { .. } => Error::not_found("image not found"),
        other => map_image_error(other),
    })?;
    let Some(image) = image else {
        return Err(Error::not_found("image not found"));
    };
    let content_type = image
        .content_type
        .parse()
        .map(ContentType)
        .unwrap_or_else(|_| ContentType::octet_stream());
    Ok(HttpResponse::Ok()
        .insert_header(content_type)
        .insert_header(CacheControl(vec![
            CacheDirective::Public,
            CacheDirective::MaxAge(MEDIA_MAX_AGE_SECS),
        ]))
        .body(image.bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{MockImageStore, StoredImage};
    use crate::inbound::http::test_utils::test_backend;
    use actix_web::http::{StatusCode, header};
    use actix_web::{App, test};
    use rstest::rstest;
    use std::sync::Arc;

    fn app_state(store: MockImageStore) -> web::Data<HttpState> {
        let mut state = test_backend().state;
        state.media = Arc::new(store);
        web::Data::new(state)
    }

    #[rstest]
    #[actix_web::test]
    async fn serves_stored_bytes_with_their_content_type() {
        let mut store = MockImageStore::new();
        store
            .expect_get()
            .withf(|key| key == "listings/abc/def.png")
            .times(1)
            .returning(|_| {
                Ok(Some(StoredImage {
                    content_type: "image/png".to_owned(),
                    bytes: vec![0x89, b'P', b'N', b'G'],
                }))
            });
        let app =
            test::init_service(App::new().app_data(app_state(store)).service(get_media)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/media/listings/abc/def.png")
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).map(|v| v.as_bytes()),
            Some(&b"image/png"[..])
        );
        let body = test::read_body(res).await;
        assert_eq!(body.as_ref(), &[0x89, b'P', b'N', b'G']);
    }

    #[rstest]
    #[case::missing(Ok(None), StatusCode::NOT_FOUND)]
    #[case::traversal(Err(ImageStoreError::invalid_key("../secret")), StatusCode::NOT_FOUND)]
    #[case::offline(Err(ImageStoreError::unavailable("disk gone")), StatusCode::SERVICE_UNAVAILABLE)]
    #[actix_web::test]
    async fn store_outcomes_map_to_statuses(
        #[case] outcome: Result<Option<StoredImage>, ImageStoreError>,
        #[case] expected: StatusCode,
    ) {
        let mut store = MockImageStore::new();
        store.expect_get().return_once(move |_| outcome);
        let app =
            test::init_service(App::new().app_data(app_state(store)).service(get_media)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/media/listings/x.jpg").to_request(),
        )
        .await;
        assert_eq!(res.status(), expected);
    }
}
