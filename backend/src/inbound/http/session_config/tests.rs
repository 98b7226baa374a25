//! Unit tests for session configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::{fixture, rstest};
use std::collections::HashMap;
use std::io::Write;
use tempfile::NamedTempFile;

fn key_file(len: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp key file");
    file.write_all(&vec![b'k'; len]).expect("write key bytes");
    file
}

fn mock_env(vars: HashMap<&'static str, String>) -> MockEnv {
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

struct ReleaseEnv {
    _key: NamedTempFile,
    vars: HashMap<&'static str, String>,
}

impl ReleaseEnv {
    fn set(mut self, name: &'static str, value: &str) -> Self {
        self.vars.insert(name, value.to_owned());
        self
    }

    fn unset(mut self, name: &'static str) -> Self {
        self.vars.remove(name);
        self
    }

    fn evaluate(&self) -> Result<SessionSettings, SessionConfigError> {
        let env = mock_env(self.vars.clone());
        session_settings_from_env(&env, BuildMode::Release)
    }
}

#[fixture]
fn release_env() -> ReleaseEnv {
    let key = key_file(SESSION_KEY_MIN_LEN);
    let path = key.path().to_string_lossy().into_owned();
    let vars = HashMap::from([
        (KEY_FILE_ENV, path),
        (COOKIE_SECURE_ENV, "1".to_owned()),
        (SAMESITE_ENV, "Strict".to_owned()),
        (ALLOW_EPHEMERAL_ENV, "0".to_owned()),
    ]);
    ReleaseEnv { _key: key, vars }
}

#[rstest]
fn release_settings_with_explicit_toggles_succeed(release_env: ReleaseEnv) {
    let settings = release_env.evaluate().expect("valid release settings");
    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Strict);
    assert_eq!(settings.ttl_hours, DEFAULT_TTL_HOURS);
}

#[rstest]
#[case::cookie_secure(COOKIE_SECURE_ENV)]
#[case::same_site(SAMESITE_ENV)]
#[case::allow_ephemeral(ALLOW_EPHEMERAL_ENV)]
fn release_requires_every_toggle(release_env: ReleaseEnv, #[case] name: &'static str) {
    let err = release_env
        .unset(name)
        .evaluate()
        .err()
        .expect("missing toggle rejected");
    assert!(matches!(err, SessionConfigError::MissingEnv { name: missing } if missing == name));
}

#[rstest]
#[case(COOKIE_SECURE_ENV, "maybe")]
#[case(COOKIE_SECURE_ENV, "")]
#[case(SAMESITE_ENV, "Sometimes")]
#[case(ALLOW_EPHEMERAL_ENV, "2")]
#[case(TTL_HOURS_ENV, "0")]
#[case(TTL_HOURS_ENV, "forever")]
fn release_rejects_malformed_toggles(
    release_env: ReleaseEnv,
    #[case] name: &'static str,
    #[case] value: &str,
) {
    let err = release_env
        .set(name, value)
        .evaluate()
        .err()
        .expect("malformed toggle rejected");
    assert!(matches!(err, SessionConfigError::InvalidEnv { name: invalid, .. } if invalid == name));
}

#[rstest]
fn release_rejects_ephemeral_keys(release_env: ReleaseEnv) {
    let err = release_env
        .set(ALLOW_EPHEMERAL_ENV, "yes")
        .evaluate()
        .err()
        .expect("ephemeral rejected");
    assert!(matches!(err, SessionConfigError::EphemeralNotAllowed));
}

#[rstest]
fn release_rejects_same_site_none_without_secure(release_env: ReleaseEnv) {
    let err = release_env
        .set(COOKIE_SECURE_ENV, "0")
        .set(SAMESITE_ENV, "None")
        .evaluate()
        .err()
        .expect("insecure SameSite=None rejected");
    assert!(matches!(err, SessionConfigError::InsecureSameSiteNone));
}

#[rstest]
fn release_rejects_short_keys(release_env: ReleaseEnv) {
    let short = key_file(SESSION_KEY_MIN_LEN - 1);
    let err = release_env
        .set(KEY_FILE_ENV, &short.path().to_string_lossy())
        .evaluate()
        .err()
        .expect("short key rejected");
    assert!(matches!(
        err,
        SessionConfigError::KeyTooShort { length, .. } if length == SESSION_KEY_MIN_LEN - 1
    ));
}

#[rstest]
fn release_rejects_missing_key_file(release_env: ReleaseEnv) {
    let err = release_env
        .set(KEY_FILE_ENV, "/nonexistent/carlot/session_key")
        .evaluate()
        .err()
        .expect("unreadable key rejected");
    assert!(matches!(err, SessionConfigError::KeyRead { .. }));
}

#[rstest]
fn ttl_override_is_applied(release_env: ReleaseEnv) {
    let settings = release_env
        .set(TTL_HOURS_ENV, "2")
        .evaluate()
        .expect("valid settings");
    assert_eq!(settings.ttl_hours, 2);
}

#[rstest]
fn debug_builds_fall_back_to_defaults() {
    let env = mock_env(HashMap::from([
        (KEY_FILE_ENV, "/nonexistent/carlot/session_key".to_owned()),
        (SAMESITE_ENV, "bogus".to_owned()),
    ]));

    let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");

    assert!(settings.cookie_secure);
    assert_eq!(settings.same_site, SameSite::Lax);
    assert_eq!(settings.ttl_hours, DEFAULT_TTL_HOURS);
}

#[rstest]
fn key_files_derive_stable_fingerprints(release_env: ReleaseEnv) {
    let first = release_env.evaluate().expect("settings");
    let release_env = release_env.set(SAMESITE_ENV, "Lax");
    let second = release_env.evaluate().expect("settings");

    assert_eq!(first.key_fingerprint(), second.key_fingerprint());
    assert_eq!(first.key_fingerprint().len(), FINGERPRINT_BYTES * 2);
}

#[rstest]
fn generated_keys_have_distinct_fingerprints() {
    assert_ne!(
        key_fingerprint(&Key::generate()),
        key_fingerprint(&Key::generate())
    );
}
