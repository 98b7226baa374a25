//! Backend entry-point: loads settings, wires adapters and serves the API.

mod server;

use actix_web::web;
use mockable::DefaultEnv;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use carlot::inbound::http::health::HealthState;
use carlot::inbound::http::session_config::{BuildMode, session_settings_from_env};
use carlot::settings::ServerSettings;
use server::{ServerConfig, build_http_state, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = ServerSettings::from_args(std::env::args_os()).map_err(std::io::Error::other)?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::from_debug_assertions())
        .map_err(std::io::Error::other)?;
    info!(fingerprint = %session.key_fingerprint(), "session key loaded");

    let bind_addr = settings.bind_addr().map_err(std::io::Error::other)?;
    let http_state = build_http_state(&settings).await?;
    let config = ServerConfig::new(session, bind_addr).with_json_limit(settings.json_limit());

    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state, http_state, config)?;
    info!(%bind_addr, "listening");
    server.await
}
