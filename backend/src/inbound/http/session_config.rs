//! Cookie session settings read from the environment.
//!
//! | Variable                  | Values                  | Release build          |
//! |---------------------------|-------------------------|------------------------|
//! | `SESSION_KEY_FILE`        | path to >= 64 key bytes | must be readable       |
//! | `SESSION_COOKIE_SECURE`   | `1`/`0`/`true`/`false`  | required               |
//! | `SESSION_SAMESITE`        | `Strict`/`Lax`/`None`   | required               |
//! | `SESSION_ALLOW_EPHEMERAL` | `1`/`0`/`true`/`false`  | required, must be off  |
//!
//! Debug builds fall back to lenient defaults and log a warning for every
//! missing or unreadable toggle.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

pub(crate) const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
pub(crate) const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub(crate) const SAMESITE_ENV: &str = "SESSION_SAMESITE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";

const DEFAULT_KEY_PATH: &str = "/var/run/secrets/session_key";
pub(crate) const MIN_KEY_LEN: usize = 64;
const FINGERPRINT_BYTES: usize = 8;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// Whether configuration problems are fatal.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    Debug,
    Release,
}

impl BuildMode {
    /// The mode of the running binary.
    #[must_use]
    pub fn current() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }
}

/// Resolved cookie session settings.
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

impl SessionSettings {
    /// Short fingerprint of the signing key, safe to log.
    pub fn fingerprint(&self) -> String {
        key_fingerprint(&self.key)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    Missing { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    Invalid {
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

/// Resolve session settings from `env`.
///
/// # Examples
///
/// ```rust
/// use backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
/// assert!(settings.cookie_secure);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let reader = EnvReader { env, mode };
    let cookie_secure = reader.flag(COOKIE_SECURE_ENV, true)?;
    let same_site = reader.same_site(cookie_secure)?;
    let allow_ephemeral = reader.flag(ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && mode == BuildMode::Release {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = reader.key(allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

/// First eight bytes of the SHA-256 of the signing key, as lowercase hex.
#[must_use]
pub fn key_fingerprint(key: &Key) -> String {
    Sha256::digest(key.signing())
        .iter()
        .take(FINGERPRINT_BYTES)
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

struct EnvReader<'a, E> {
    env: &'a E,
    mode: BuildMode,
}

impl<E: Env> EnvReader<'_, E> {
    /// Debug builds take `fallback`; release builds fail with `error`.
    fn lenient<T>(
        &self,
        fallback: T,
        error: SessionConfigError,
    ) -> Result<T, SessionConfigError> {
        match self.mode {
            BuildMode::Debug => {
                warn!(%error, "session setting ignored in debug build");
                Ok(fallback)
            }
            BuildMode::Release => Err(error),
        }
    }

    fn flag(&self, name: &'static str, fallback: bool) -> Result<bool, SessionConfigError> {
        let Some(value) = self.env.string(name) else {
            return self.lenient(fallback, SessionConfigError::Missing { name });
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => Ok(true),
            "0" | "false" | "no" => Ok(false),
            _ => self.lenient(
                fallback,
                SessionConfigError::Invalid {
                    name,
                    value,
                    expected: BOOL_EXPECTED,
                },
            ),
        }
    }

    fn same_site(&self, cookie_secure: bool) -> Result<SameSite, SessionConfigError> {
        let fallback = match self.mode {
            BuildMode::Debug => SameSite::Lax,
            BuildMode::Release => SameSite::Strict,
        };
        let Some(value) = self.env.string(SAMESITE_ENV) else {
            return self.lenient(fallback, SessionConfigError::Missing { name: SAMESITE_ENV });
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "lax" => Ok(SameSite::Lax),
            "strict" => Ok(SameSite::Strict),
            "none" if cookie_secure => Ok(SameSite::None),
            "none" => self.lenient(SameSite::None, SessionConfigError::InsecureSameSiteNone),
            _ => self.lenient(
                fallback,
                SessionConfigError::Invalid {
                    name: SAMESITE_ENV,
                    value,
                    expected: SAMESITE_EXPECTED,
                },
            ),
        }
    }

    fn key(&self, allow_ephemeral: bool) -> Result<Key, SessionConfigError> {
        let path = PathBuf::from(
            self.env
                .string(KEY_FILE_ENV)
                .unwrap_or_else(|| DEFAULT_KEY_PATH.to_owned()),
        );
        let mut bytes = match std::fs::read(&path) {
            Ok(bytes) => bytes,
            Err(source) if self.mode == BuildMode::Debug || allow_ephemeral => {
                warn!(path = %path.display(), error = %source, "using ephemeral session key");
                return Ok(Key::generate());
            }
            Err(source) => return Err(SessionConfigError::KeyRead { path, source }),
        };
        let length = bytes.len();
        if self.mode == BuildMode::Release && length < MIN_KEY_LEN {
            bytes.zeroize();
            return Err(SessionConfigError::KeyTooShort {
                path,
                length,
                min_len: MIN_KEY_LEN,
            });
        }
        // Key::derive_from panics below 32 bytes.
        if length < 32 {
            bytes.zeroize();
            warn!(path = %path.display(), length, "session key too short; using ephemeral key");
            return Ok(Key::generate());
        }
        let key = Key::derive_from(&bytes);
        bytes.zeroize();
        Ok(key)
    }
}
