//! Database library providing connectors for PostgreSQL and Redis
//!
//! PostgreSQL (SeaORM) is the store of record; Redis is the cache and
//! pub/sub bus. Both connectors offer retry-with-backoff variants for
//! startup resilience.
//!
//! # Examples
//!
//! ```ignore
//! let db = database::postgres::connect(&config.url).await?;
//! database::postgres::run_migrations::<migration::Migrator>(&db, "linkout").await?;
//!
//! let mut redis = database::redis::connect(&redis_config.url).await?;
//! redis.set::<_, _, ()>("key", "value").await?;
//! ```

pub mod common;
pub mod postgres;
pub mod redis;

pub use common::{DatabaseError, DatabaseResult, RetryConfig, retry, retry_with_backoff};
