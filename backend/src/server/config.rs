//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use carlot::inbound::http::error::DEFAULT_JSON_LIMIT;
use carlot::inbound::http::session_config::SessionSettings;

/// Builder-style configuration for creating the HTTP server.
pub struct ServerConfig {
    pub(crate) session: SessionSettings,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) json_limit: usize,
}

impl ServerConfig {
    /// Construct a server configuration from validated session settings.
    #[must_use]
    pub fn new(session: SessionSettings, bind_addr: SocketAddr) -> Self {
        Self {
            session,
            bind_addr,
            json_limit: DEFAULT_JSON_LIMIT,
        }
    }

    /// Override the JSON body limit.
    #[must_use]
    pub fn with_json_limit(mut self, json_limit: usize) -> Self {
        self.json_limit = json_limit;
        self
    }
}
