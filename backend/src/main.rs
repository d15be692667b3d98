//! Journal API entry-point: settings, persistence wiring and the HTTP server.

mod server;

use color_eyre::eyre::{Context, Result};
use mockable::DefaultEnv;
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use server::{AppSettings, ServerConfig, create_server};

#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(error) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(%error, "tracing init failed");
    }

    let settings = AppSettings::load().wrap_err("loading JOURNAL_* settings")?;
    let session = session_settings_from_env(&DefaultEnv::new(), BuildMode::current())
        .wrap_err("resolving session settings")?;
    info!(fingerprint = %session.fingerprint(), "session key loaded");

    let bind_addr = settings.bind_addr()?;
    let mut config = ServerConfig::new(
        session.key,
        session.cookie_secure,
        session.same_site,
        bind_addr,
    )
    .with_allowed_origins(settings.allowed_origins()?)
    .with_admins(settings.admin_user_ids()?);

    if let Some(url) = settings.database_url.as_deref() {
        run_pending_migrations(url)
            .await
            .wrap_err("applying database migrations")?;
        let pool = DbPool::new(PoolConfig::new(url).with_max_size(settings.db_pool_size()?))
            .await
            .wrap_err("building database pool")?;
        config = config.with_db_pool(pool);
    }

    info!(%bind_addr, "starting journal API");
    create_server(config)?.await?;
    Ok(())
}
