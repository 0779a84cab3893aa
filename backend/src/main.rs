//! gymdesk entry-point: loads settings, prepares the database and serves the API.

mod server;

use actix_web::web;
use color_eyre::eyre::{Context, Result, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use gymdesk::inbound::http::health::HealthState;
use gymdesk::outbound::persistence::{DbPool, run_pending_migrations};
use gymdesk::settings::{AppSettings, BuildMode, key_fingerprint, load_session_key};

use server::{ServerConfig, create_server};

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = AppSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;

    let key = load_session_key(
        settings.session_key_file(),
        BuildMode::from_debug_assertions(),
        settings.session_allow_ephemeral,
    )?;
    info!(fingerprint = %key_fingerprint(&key), "session key loaded");

    let pool_config = settings.pool_config()?;
    if settings.run_migrations() {
        let url = pool_config.database_url().to_owned();
        let applied = web::block(move || run_pending_migrations(&url))
            .await
            .wrap_err("migration task failed")??;
        info!(applied, "database schema up to date");
    }
    let pool = DbPool::new(pool_config)
        .await
        .wrap_err("failed to build database pool")?;

    let config = ServerConfig::new(key, settings.bind_addr()?, pool)
        .with_cookie_secure(settings.cookie_secure())
        .with_session_ttl(settings.session_ttl()?)
        .with_argon2(settings.argon2());
    let health_state = web::Data::new(HealthState::new());
    let server = create_server(health_state.clone(), config)?;
    info!(bind_addr = %settings.bind_addr()?, "listening");

    let shutdown_health = health_state.clone();
    actix_web::rt::spawn(async move {
        if actix_web::rt::signal::ctrl_c().await.is_ok() {
            shutdown_health.mark_unhealthy();
        }
    });

    health_state.mark_ready();
    server.await.wrap_err("server terminated")
}
