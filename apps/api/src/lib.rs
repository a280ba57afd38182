//! Control plane API
//!
//! Start, pause, cancel, and observe workflow jobs; trigger on-demand
//! connection checks. Campaign/lead CRUD, authentication, and the AI
//! message path live in the external application layer.

pub mod api;
pub mod auth;
pub mod error;
pub mod state;

use core_config::{
    Environment, FromEnv, browser::BrowserConfig, database::DatabaseConfig, redis::RedisConfig,
    server::ServerConfig, worker::WorkerConfig,
};
use eyre::WrapErr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::state::AppState;

pub async fn run() -> eyre::Result<()> {
    let environment = Environment::from_env();
    core_config::tracing::init_tracing(&environment);

    let server_config = ServerConfig::from_env().wrap_err("Failed to load server configuration")?;
    let db_config = DatabaseConfig::from_env().wrap_err("Failed to load database configuration")?;
    let redis_config = RedisConfig::from_env().wrap_err("Failed to load Redis configuration")?;
    let browser_config =
        BrowserConfig::from_env().wrap_err("Failed to load browser configuration")?;
    let worker_config = WorkerConfig::from_env().wrap_err("Failed to load worker configuration")?;

    info!("Connecting to PostgreSQL...");
    let db = database::postgres::connect_with_retry(&db_config.url, None)
        .await
        .wrap_err("Failed to connect to PostgreSQL")?;

    database::postgres::run_migrations::<migration::Migrator>(&db, "linkout")
        .await
        .wrap_err("Migrations failed")?;

    info!("Connecting to Redis...");
    let redis = database::redis::connect_with_retry(&redis_config.url, None)
        .await
        .wrap_err("Failed to connect to Redis")?;

    let state = AppState {
        db,
        redis,
        redis_config,
        browser: browser_config,
        worker: worker_config,
    };

    let app = api::router(state).layer(TraceLayer::new_for_http());

    let address = server_config.address();
    let listener = TcpListener::bind(&address)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", address))?;

    info!(address = %address, "Control plane listening");
    axum::serve(listener, app).await.wrap_err("Server failed")?;

    Ok(())
}
