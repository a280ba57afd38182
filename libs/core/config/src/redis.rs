use crate::{ConfigError, FromEnv, env_required};

/// Redis configuration
///
/// The URL carries the scheme; `rediss://` enables TLS.
#[derive(Clone, Debug)]
pub struct RedisConfig {
    pub url: String,
}

impl RedisConfig {
    pub fn new(url: String) -> Self {
        Self { url }
    }
}

impl FromEnv for RedisConfig {
    /// Requires REDIS_URL to be set (no default)
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("REDIS_URL")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redis_config_from_env_success() {
        temp_env::with_var("REDIS_URL", Some("redis://localhost:6379"), || {
            let config = RedisConfig::from_env();
            assert!(config.is_ok());
            assert_eq!(config.unwrap().url, "redis://localhost:6379");
        });
    }

    #[test]
    fn test_redis_config_from_env_missing() {
        temp_env::with_var_unset("REDIS_URL", || {
            let config = RedisConfig::from_env();
            assert!(config.is_err());
            let err = config.unwrap_err();
            assert!(err.to_string().contains("REDIS_URL"));
            assert!(err.to_string().contains("required"));
        });
    }

    #[test]
    fn test_redis_config_tls_scheme_preserved() {
        let config = RedisConfig::new("rediss://cache.internal:6380".to_string());
        assert!(config.url.starts_with("rediss://"));
    }
}
