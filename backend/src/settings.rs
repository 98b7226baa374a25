//! Server settings loaded via OrthoConfig.
//!
//! Values come from CLI flags, `CARLOT_*` environment variables and config
//! files, in OrthoConfig's usual precedence. Everything is optional: an empty
//! environment starts a self-contained server on in-memory adapters.

use std::ffi::OsString;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;
use url::Url;

use crate::inbound::http::error::DEFAULT_JSON_LIMIT;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MEDIA_BASE_URL: &str = "http://localhost:8080/media/";

/// Errors raised while loading or interpreting settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// OrthoConfig could not merge the configuration sources.
    #[error("failed to load settings: {0}")]
    Load(String),
    /// The bind address is not `host:port`.
    #[error("invalid bind address {value}: {message}")]
    BindAddr { value: String, message: String },
    /// The media base URL is not absolute.
    #[error("invalid media base URL {value}: {message}")]
    MediaBaseUrl { value: String, message: String },
}

/// Configuration values for the HTTP server and its adapters.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "CARLOT")]
pub struct ServerSettings {
    /// Socket address to listen on.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL; in-memory adapters are used when absent.
    pub database_url: Option<String>,
    /// Directory holding uploaded images; kept in memory when absent.
    pub media_root: Option<PathBuf>,
    /// Public URL prefix under which images are served.
    pub media_base_url: Option<String>,
    /// Maximum JSON request body in bytes.
    #[ortho_config(default = DEFAULT_JSON_LIMIT)]
    pub json_limit: usize,
}

impl ServerSettings {
    /// Load settings from the process arguments, environment and files.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Load`] when a source cannot be parsed.
    pub fn from_args<I, T>(args: I) -> Result<Self, SettingsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::load_from_iter(args).map_err(|err| SettingsError::Load(err.to_string()))
    }

    /// Socket address to bind, defaulting to `0.0.0.0:8080`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::BindAddr`] when the value does not parse.
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let value = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        value.parse().map_err(|err: std::net::AddrParseError| SettingsError::BindAddr {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    /// Database URL with blank values treated as absent.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }

    /// Media directory, if images should persist on disk.
    pub fn media_root(&self) -> Option<&Path> {
        self.media_root.as_deref()
    }

    /// Public base URL for stored images. A trailing slash is added when
    /// missing so keys join beneath it rather than replacing its last segment.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MediaBaseUrl`] when the value is not an
    /// absolute URL.
    pub fn media_base_url(&self) -> Result<Url, SettingsError> {
        let value = self
            .media_base_url
            .as_deref()
            .unwrap_or(DEFAULT_MEDIA_BASE_URL);
        let normalised = if value.ends_with('/') {
            value.to_owned()
        } else {
            format!("{value}/")
        };
        Url::parse(&normalised).map_err(|err| SettingsError::MediaBaseUrl {
            value: value.to_owned(),
            message: err.to_string(),
        })
    }

    /// JSON body limit in bytes.
    pub const fn json_limit(&self) -> usize {
        self.json_limit
    }
}

#[cfg(test)]
mod tests {
    //! Unit tests for server settings parsing.

    use super::*;

    use env_lock::lock_env;
    use rstest::rstest;

    const VARS: [&str; 5] = [
        "CARLOT_BIND_ADDR",
        "CARLOT_DATABASE_URL",
        "CARLOT_MEDIA_ROOT",
        "CARLOT_MEDIA_BASE_URL",
        "CARLOT_JSON_LIMIT",
    ];

    fn load_from_empty_args() -> ServerSettings {
        ServerSettings::from_args([OsString::from("carlot")]).expect("settings should load")
    }

    #[rstest]
    fn defaults_apply_when_nothing_is_set() {
        let _guard = lock_env(VARS.map(|name| (name, None::<String>)));

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("bind addr"),
            "0.0.0.0:8080".parse::<SocketAddr>().expect("addr")
        );
        assert!(settings.database_url().is_none());
        assert!(settings.media_root().is_none());
        assert_eq!(
            settings.media_base_url().expect("base url").as_str(),
            DEFAULT_MEDIA_BASE_URL
        );
        assert_eq!(settings.json_limit(), DEFAULT_JSON_LIMIT);
    }

    #[rstest]
    fn environment_overrides_are_respected() {
        let _guard = lock_env([
            ("CARLOT_BIND_ADDR", Some("127.0.0.1:9000".to_owned())),
            (
                "CARLOT_DATABASE_URL",
                Some("postgres://localhost/carlot".to_owned()),
            ),
            ("CARLOT_MEDIA_ROOT", Some("/srv/carlot/media".to_owned())),
            (
                "CARLOT_MEDIA_BASE_URL",
                Some("https://cdn.example.com/media".to_owned()),
            ),
            ("CARLOT_JSON_LIMIT", Some("1048576".to_owned())),
        ]);

        let settings = load_from_empty_args();
        assert_eq!(
            settings.bind_addr().expect("bind addr"),
            "127.0.0.1:9000".parse::<SocketAddr>().expect("addr")
        );
        assert_eq!(settings.database_url(), Some("postgres://localhost/carlot"));
        assert_eq!(settings.media_root(), Some(Path::new("/srv/carlot/media")));
        assert_eq!(
            settings.media_base_url().expect("base url").as_str(),
            "https://cdn.example.com/media/"
        );
        assert_eq!(settings.json_limit(), 1_048_576);
    }

    #[rstest]
    fn blank_database_url_means_in_memory() {
        let settings = ServerSettings {
            bind_addr: None,
            database_url: Some("   ".to_owned()),
            media_root: None,
            media_base_url: None,
            json_limit: DEFAULT_JSON_LIMIT,
        };
        assert!(settings.database_url().is_none());
    }

    #[rstest]
    #[case::bind(Some("not-an-addr"), None)]
    #[case::media(None, Some("relative/media"))]
    fn malformed_values_are_reported(
        #[case] bind_addr: Option<&str>,
        #[case] media_base_url: Option<&str>,
    ) {
        let settings = ServerSettings {
            bind_addr: bind_addr.map(str::to_owned),
            database_url: None,
            media_root: None,
            media_base_url: media_base_url.map(str::to_owned),
            json_limit: DEFAULT_JSON_LIMIT,
        };
        let outcome = if bind_addr.is_some() {
            settings.bind_addr().map(|_| ())
        } else {
            settings.media_base_url().map(|_| ())
        };
        assert!(outcome.is_err());
    }
}
