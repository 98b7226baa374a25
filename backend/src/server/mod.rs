//! Server construction and middleware wiring.

mod config;
mod state_builders;

pub use config::ServerConfig;
pub use state_builders::build_http_state;

use actix_web::dev::{Server, ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, HttpServer, web};

use carlot::Trace;
#[cfg(debug_assertions)]
use carlot::doc::ApiDoc;
use carlot::inbound::http::configure_api;
use carlot::inbound::http::error::{json_config, path_config, query_config};
use carlot::inbound::http::health::{HealthState, live, ready};
use carlot::inbound::http::media::get_media;
use carlot::inbound::http::session_config::SessionSettings;
use carlot::inbound::http::state::HttpState;
#[cfg(debug_assertions)]
use utoipa::OpenApi;
#[cfg(debug_assertions)]
use utoipa_swagger_ui::SwaggerUi;

#[derive(Clone)]
struct AppDependencies {
    health_state: web::Data<HealthState>,
    http_state: web::Data<HttpState>,
    session: SessionSettings,
    json_limit: usize,
}

fn build_app(
    deps: AppDependencies,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let AppDependencies {
        health_state,
        http_state,
        session,
        json_limit,
    } = deps;

    let api = web::scope("/api/v1")
        .wrap(session.middleware())
        .configure(configure_api);

    let app = App::new()
        .app_data(health_state)
        .app_data(http_state)
        .app_data(json_config(json_limit))
        .app_data(query_config())
        .app_data(path_config())
        .wrap(Trace)
        .service(api)
        .service(get_media)
        .service(ready)
        .service(live);

    #[cfg(debug_assertions)]
    let app = app.service(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));
    #[cfg(not(debug_assertions))]
    let app = app;

    app
}

/// Construct an Actix HTTP server over a prepared [`HttpState`].
///
/// # Parameters
/// - `health_state`: shared readiness state updated once the server is initialised.
/// - `http_state`: driving ports wired over the configured adapters.
/// - `config`: session, binding and body-size settings.
///
/// # Returns
/// A spawned [`Server`] that must be awaited to drive the listener.
///
/// # Errors
/// Propagates [`std::io::Error`] when binding the socket fails.
pub fn create_server(
    health_state: web::Data<HealthState>,
    http_state: HttpState,
    config: ServerConfig,
) -> std::io::Result<Server> {
    let server_health_state = health_state.clone();
    let http_state = web::Data::new(http_state);
    let ServerConfig {
        session,
        bind_addr,
        json_limit,
    } = config;

    let server = HttpServer::new(move || {
        build_app(AppDependencies {
            health_state: server_health_state.clone(),
            http_state: http_state.clone(),
            session: session.clone(),
            json_limit,
        })
    })
    .bind(bind_addr)?
    .run();

    health_state.mark_ready();
    Ok(server)
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test;
    use carlot::inbound::http::session_config::{BuildMode, session_settings_from_env};
    use carlot::settings::ServerSettings;
    use mockable::MockEnv;
    use rstest::{fixture, rstest};
    use serde_json::{Value, json};

    #[fixture]
    fn session() -> SessionSettings {
        let mut env = MockEnv::new();
        env.expect_string().returning(|name| match name {
            "SESSION_COOKIE_SECURE" => Some("0".to_owned()),
            _ => None,
        });
        session_settings_from_env(&env, BuildMode::Debug).expect("debug session settings")
    }

    async fn deps(session: SessionSettings) -> AppDependencies {
        let settings = ServerSettings {
            bind_addr: None,
            database_url: None,
            media_root: None,
            media_base_url: Some("http://localhost/media/".to_owned()),
            json_limit: 1024 * 1024,
        };
        let http_state = build_http_state(&settings).await.expect("memory state");
        let health_state = web::Data::new(HealthState::new());
        health_state.mark_ready();
        AppDependencies {
            health_state,
            http_state: web::Data::new(http_state),
            session,
            json_limit: 1024 * 1024,
        }
    }

    #[rstest]
    #[actix_web::test]
    async fn wires_health_api_and_trace_header(session: SessionSettings) {
        let app = test::init_service(build_app(deps(session).await)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/health/ready").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert!(res.headers().contains_key("trace-id"));

        let res = test::call_service(
            &app,
            test::TestRequest::get().uri("/api/v1/listings").to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let page: Value = test::read_body_json(res).await;
        assert_eq!(page["data"], json!([]));
        assert_eq!(page["limit"], 12);
    }

    #[rstest]
    #[actix_web::test]
    async fn uploaded_images_are_served_under_media(session: SessionSettings) {
        let app = test::init_service(build_app(deps(session).await)).await;

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/auth/register")
                .set_json(json!({
                    "email": "seller@example.com",
                    "password": "hunter22",
                    "displayName": "Priya Nair",
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let cookie = res
            .response()
            .cookies()
            .find(|c| c.name() == "session")
            .map(|c| c.into_owned())
            .expect("session cookie");

        let res = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/v1/listings")
                .cookie(cookie)
                .set_json(json!({
                    "title": "Swift VXi",
                    "brand": "Maruti",
                    "model": "Swift",
                    "year": 2019,
                    "price": 550_000,
                    "location": "Pune",
                    "specifications": { "seatingCapacity": 5 },
                    "sellerType": "individual",
                    "sellerName": "Priya",
                    "sellerContact": "priya@example.com",
                    "images": [{ "contentType": "image/png", "data": "iVBORw0KGgo=" }],
                }))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let listing: Value = test::read_body_json(res).await;
        let key = listing["images"][0]["key"].as_str().expect("image key");

        let res = test::call_service(
            &app,
            test::TestRequest::get()
                .uri(&format!("/media/{key}"))
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = test::read_body(res).await;
        assert_eq!(body.as_ref(), b"\x89PNG\r\n\x1a\n");
    }
}
