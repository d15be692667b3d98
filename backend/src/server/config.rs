//! Process settings and the resolved server configuration.

use std::collections::HashSet;
use std::net::SocketAddr;

use actix_web::cookie::{Key, SameSite};
use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use backend::domain::UserId;
use backend::outbound::persistence::DbPool;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_POOL_SIZE: u32 = 10;

/// Settings read from `JOURNAL_*` environment variables, config files or
/// command-line flags.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "JOURNAL")]
pub struct AppSettings {
    /// Socket address to listen on. Defaults to `0.0.0.0:8080`.
    pub bind_addr: Option<String>,
    /// PostgreSQL URL. Without one the server keeps data in memory.
    pub database_url: Option<String>,
    /// Maximum pooled connections.
    #[ortho_config(default = DEFAULT_POOL_SIZE)]
    pub db_pool_size: Option<u32>,
    /// Origins allowed to make credentialed requests. The environment form
    /// is comma-separated.
    #[serde(default)]
    #[ortho_config(default = Vec::new())]
    pub allowed_origins: Vec<String>,
    /// User ids allowed to send system mail. The environment form is
    /// comma-separated.
    #[serde(default)]
    #[ortho_config(default = Vec::new())]
    pub admin_user_ids: Vec<String>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("invalid bind address '{value}'")]
    BindAddr { value: String },
    #[error("invalid allowed origin '{value}'")]
    Origin { value: String },
    #[error("invalid admin user id '{value}'")]
    AdminId { value: String },
    #[error("db pool size must be positive")]
    PoolSize,
}

/// Entries given on the command line may still hold several comma-separated
/// values.
fn list_items(raw: &[String]) -> impl Iterator<Item = &str> {
    raw.iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|item| !item.is_empty())
}

impl AppSettings {
    pub fn bind_addr(&self) -> Result<SocketAddr, SettingsError> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse().map_err(|_| SettingsError::BindAddr {
            value: raw.to_owned(),
        })
    }

    pub fn db_pool_size(&self) -> Result<u32, SettingsError> {
        match self.db_pool_size.unwrap_or(DEFAULT_POOL_SIZE) {
            0 => Err(SettingsError::PoolSize),
            size => Ok(size),
        }
    }

    /// Origins normalised to `scheme://host[:port]`.
    pub fn allowed_origins(&self) -> Result<Vec<String>, SettingsError> {
        list_items(&self.allowed_origins)
            .map(|raw| {
                Url::parse(raw)
                    .ok()
                    .filter(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
                    .map(|url| url.origin().ascii_serialization())
                    .ok_or_else(|| SettingsError::Origin {
                        value: raw.to_owned(),
                    })
            })
            .collect()
    }

    pub fn admin_user_ids(&self) -> Result<HashSet<UserId>, SettingsError> {
        list_items(&self.admin_user_ids)
            .map(|raw| {
                raw.parse().map_err(|_| SettingsError::AdminId {
                    value: raw.to_owned(),
                })
            })
            .collect()
    }
}

/// Everything `create_server` needs, resolved up front.
pub struct ServerConfig {
    pub(crate) key: Key,
    pub(crate) cookie_secure: bool,
    pub(crate) same_site: SameSite,
    pub(crate) bind_addr: SocketAddr,
    pub(crate) allowed_origins: Vec<String>,
    pub(crate) admins: HashSet<UserId>,
    pub(crate) db_pool: Option<DbPool>,
}

impl ServerConfig {
    #[must_use]
    pub fn new(key: Key, cookie_secure: bool, same_site: SameSite, bind_addr: SocketAddr) -> Self {
        Self {
            key,
            cookie_secure,
            same_site,
            bind_addr,
            allowed_origins: Vec::new(),
            admins: HashSet::new(),
            db_pool: None,
        }
    }

    /// Use PostgreSQL instead of the in-memory store.
    #[must_use]
    pub fn with_db_pool(mut self, pool: DbPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    #[must_use]
    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    #[must_use]
    pub fn with_admins(mut self, admins: HashSet<UserId>) -> Self {
        self.admins = admins;
        self
    }
}
