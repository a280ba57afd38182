use crate::{FromEnv, env_or_default};

/// Worker process configuration for the control plane
///
/// The control plane spawns one worker process per workflow job; this
/// names the binary it launches.
#[derive(Clone, Debug)]
pub struct WorkerConfig {
    pub binary: String,
}

impl WorkerConfig {
    pub fn new(binary: String) -> Self {
        Self { binary }
    }
}

impl FromEnv for WorkerConfig {
    /// WORKER_BINARY defaults to `linkout-worker` resolved via PATH
    fn from_env() -> Result<Self, crate::ConfigError> {
        Ok(Self {
            binary: env_or_default("WORKER_BINARY", "linkout-worker"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_config_default_binary() {
        temp_env::with_var_unset("WORKER_BINARY", || {
            let config = WorkerConfig::from_env().unwrap();
            assert_eq!(config.binary, "linkout-worker");
        });
    }

    #[test]
    fn test_worker_config_custom_binary() {
        temp_env::with_var("WORKER_BINARY", Some("/opt/linkout/bin/worker"), || {
            let config = WorkerConfig::from_env().unwrap();
            assert_eq!(config.binary, "/opt/linkout/bin/worker");
        });
    }
}
