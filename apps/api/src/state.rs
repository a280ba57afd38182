//! Shared application state passed to all request handlers

use core_config::{browser::BrowserConfig, redis::RedisConfig, worker::WorkerConfig};

/// Cloned per handler; the connections are cheap Arc clones
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool (SeaORM)
    pub db: database::postgres::DatabaseConnection,
    /// Redis connection manager
    pub redis: database::redis::ConnectionManager,
    /// Redis config kept for dedicated pub/sub connections
    pub redis_config: RedisConfig,
    /// Per-account browser profile root
    pub browser: BrowserConfig,
    /// Worker binary spawned per job
    pub worker: WorkerConfig,
}
