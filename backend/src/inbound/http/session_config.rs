//! Session cookie configuration.
//!
//! Sessions are private (encrypted and signed) cookies. Settings come from
//! `SESSION_*` environment variables read through [`mockable::Env`]:
//!
//! | Variable | Meaning | Release default |
//! | --- | --- | --- |
//! | `SESSION_KEY_FILE` | path to >= 64 bytes of key material | `/var/run/secrets/session_key` |
//! | `SESSION_COOKIE_SECURE` | mark the cookie `Secure` | required |
//! | `SESSION_SAMESITE` | `Strict`, `Lax` or `None` | required |
//! | `SESSION_ALLOW_EPHEMERAL` | generate a key when the file is missing | required, must be off |
//! | `SESSION_TTL_HOURS` | session lifetime | 24 |
//!
//! Debug builds fall back to permissive defaults with a warning; release
//! builds reject missing or malformed toggles.

use std::path::PathBuf;

use actix_session::config::{CookieContentSecurity, PersistentSession};
use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Key, SameSite, time::Duration as CookieDuration};
use mockable::Env;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

pub const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
pub const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub const SAMESITE_ENV: &str = "SESSION_SAMESITE";
pub const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
pub const TTL_HOURS_ENV: &str = "SESSION_TTL_HOURS";

const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
/// Minimum key file length accepted in release builds.
pub const SESSION_KEY_MIN_LEN: usize = 64;
const DEFAULT_TTL_HOURS: i64 = 24;
const SESSION_COOKIE_NAME: &str = "session";
const FINGERPRINT_BYTES: usize = 8;

const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";
const HOURS_EXPECTED: &str = "a positive number of hours";

/// Build mode for session configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Tolerate missing or malformed toggles, warning instead.
    Debug,
    /// Require explicit, valid toggles.
    Release,
}

impl BuildMode {
    /// Determine the build mode from `cfg!(debug_assertions)`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use carlot::inbound::http::session_config::BuildMode;
    ///
    /// let mode = BuildMode::from_debug_assertions();
    /// assert_eq!(mode == BuildMode::Debug, cfg!(debug_assertions));
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Validated session settings.
#[derive(Clone)]
pub struct SessionSettings {
    /// Signing and encryption key for cookie sessions.
    pub key: Key,
    /// Whether session cookies are marked `Secure`.
    pub cookie_secure: bool,
    /// `SameSite` policy for session cookies.
    pub same_site: SameSite,
    /// Lifetime of a session cookie in hours.
    pub ttl_hours: i64,
}

impl SessionSettings {
    /// Build the Actix session middleware for these settings.
    pub fn middleware(&self) -> SessionMiddleware<CookieSessionStore> {
        SessionMiddleware::builder(CookieSessionStore::default(), self.key.clone())
            .cookie_name(SESSION_COOKIE_NAME.to_owned())
            .cookie_path("/".to_owned())
            .cookie_secure(self.cookie_secure)
            .cookie_http_only(true)
            .cookie_content_security(CookieContentSecurity::Private)
            .cookie_same_site(self.same_site)
            .session_lifecycle(
                PersistentSession::default().session_ttl(CookieDuration::hours(self.ttl_hours)),
            )
            .build()
    }

    /// Fingerprint of the active key, safe to log.
    pub fn key_fingerprint(&self) -> String {
        key_fingerprint(&self.key)
    }
}

/// Errors raised while validating session configuration.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// One environment toggle: how to parse it and what debug builds assume.
struct Toggle<T> {
    name: &'static str,
    expected: &'static str,
    parse: fn(&str) -> Option<T>,
    debug_default: T,
    /// Value used in release builds when the variable is absent; `None`
    /// makes the variable mandatory.
    release_default: Option<T>,
}

impl<T: Copy + std::fmt::Debug> Toggle<T> {
    fn read<E: Env>(&self, env: &E, mode: BuildMode) -> Result<T, SessionConfigError> {
        let Some(raw) = env.string(self.name) else {
            if let Some(value) = self.release_default {
                return Ok(value);
            }
            if mode.is_debug() {
                warn!(name = self.name, default = ?self.debug_default, "session toggle not set; using default");
                return Ok(self.debug_default);
            }
            return Err(SessionConfigError::MissingEnv { name: self.name });
        };
        match (self.parse)(&raw) {
            Some(value) => Ok(value),
            None if mode.is_debug() => {
                warn!(name = self.name, value = %raw, default = ?self.debug_default, "invalid session toggle; using default");
                Ok(self.debug_default)
            }
            None => Err(SessionConfigError::InvalidEnv {
                name: self.name,
                value: raw,
                expected: self.expected,
            }),
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

fn parse_same_site(value: &str) -> Option<SameSite> {
    match value.to_ascii_lowercase().as_str() {
        "lax" => Some(SameSite::Lax),
        "strict" => Some(SameSite::Strict),
        "none" => Some(SameSite::None),
        _ => None,
    }
}

fn parse_hours(value: &str) -> Option<i64> {
    value.trim().parse::<i64>().ok().filter(|hours| *hours > 0)
}

const COOKIE_SECURE: Toggle<bool> = Toggle {
    name: COOKIE_SECURE_ENV,
    expected: BOOL_EXPECTED,
    parse: parse_bool,
    debug_default: true,
    release_default: None,
};

const SAME_SITE: Toggle<SameSite> = Toggle {
    name: SAMESITE_ENV,
    expected: SAMESITE_EXPECTED,
    parse: parse_same_site,
    debug_default: SameSite::Lax,
    release_default: None,
};

const ALLOW_EPHEMERAL: Toggle<bool> = Toggle {
    name: ALLOW_EPHEMERAL_ENV,
    expected: BOOL_EXPECTED,
    parse: parse_bool,
    debug_default: false,
    release_default: None,
};

const TTL_HOURS: Toggle<i64> = Toggle {
    name: TTL_HOURS_ENV,
    expected: HOURS_EXPECTED,
    parse: parse_hours,
    debug_default: DEFAULT_TTL_HOURS,
    release_default: Some(DEFAULT_TTL_HOURS),
};

/// Build session settings from environment variables and build mode.
///
/// # Examples
///
/// ```rust
/// use carlot::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// // Debug builds tolerate an empty environment and mint a throwaway key.
/// let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
/// assert!(settings.cookie_secure);
/// assert_eq!(settings.ttl_hours, 24);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = COOKIE_SECURE.read(env, mode)?;
    let same_site = SAME_SITE.read(env, mode)?;
    if same_site == SameSite::None && !cookie_secure {
        if mode.is_debug() {
            warn!("SESSION_SAMESITE=None without a Secure cookie; browsers may drop it");
        } else {
            return Err(SessionConfigError::InsecureSameSiteNone);
        }
    }
    let allow_ephemeral = ALLOW_EPHEMERAL.read(env, mode)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let ttl_hours = TTL_HOURS.read(env, mode)?;
    let key = session_key_from_env(env, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
        ttl_hours,
    })
}

fn session_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            // `Key::derive_from` needs at least 32 bytes even in debug builds.
            let min_len = if mode.is_debug() { 32 } else { SESSION_KEY_MIN_LEN };
            if length < min_len {
                bytes.zeroize();
                return Err(SessionConfigError::KeyTooShort {
                    path,
                    length,
                    min_len,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(source) if mode.is_debug() || allow_ephemeral => {
            warn!(path = %path.display(), error = %source, "using temporary session key (dev only)");
            Ok(Key::generate())
        }
        Err(source) => Err(SessionConfigError::KeyRead { path, source }),
    }
}

/// Truncated SHA-256 of the signing key as 16 hex characters.
///
/// # Examples
///
/// ```rust
/// use actix_web::cookie::Key;
/// use carlot::inbound::http::session_config::key_fingerprint;
///
/// let fp = key_fingerprint(&Key::generate());
/// assert_eq!(fp.len(), 16);
/// ```
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    let digest = Sha256::digest(key.signing());
    hex::encode(&digest[..FINGERPRINT_BYTES])
}

#[cfg(test)]
mod tests;
