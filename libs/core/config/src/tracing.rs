use crate::Environment;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Initialize tracing with environment-aware configuration
///
/// - **Production** (`APP_ENV=production`): JSON format for log
///   aggregation, module targets hidden.
/// - **Development** (default): pretty-printed, targets shown.
///
/// `RUST_LOG` overrides the default filter. If tracing is already
/// initialized this silently continues (common in tests).
pub fn init_tracing(environment: &Environment) {
    let is_production = environment.is_production();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if is_production {
            EnvFilter::new("info,sea_orm=warn,chromiumoxide=warn")
        } else {
            EnvFilter::new("debug,sea_orm=info,chromiumoxide=info")
        }
    });

    let result = if is_production {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .try_init()
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .pretty()
            .try_init()
    };

    match result {
        Ok(_) => {
            info!("Tracing initialized. Environment: {:?}", environment);
        }
        Err(_) => {
            debug!("Tracing already initialized, skipping re-initialization");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_tracing_development() {
        init_tracing(&Environment::Development);
    }

    #[test]
    fn test_init_tracing_production() {
        init_tracing(&Environment::Production);
    }

    #[test]
    fn test_init_tracing_multiple_calls() {
        let env = Environment::Development;
        init_tracing(&env);
        init_tracing(&env);
    }

    #[test]
    fn test_init_tracing_with_rust_log_env() {
        temp_env::with_var("RUST_LOG", Some("trace"), || {
            init_tracing(&Environment::Development);
        });
    }
}
