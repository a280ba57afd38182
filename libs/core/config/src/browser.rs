use crate::{FromEnv, env_or_default};
use std::path::PathBuf;

/// Headless browser configuration
///
/// Each LinkedIn account gets its own persistent profile directory under
/// `profile_root`; a profile directory must be owned by at most one worker
/// at a time.
#[derive(Clone, Debug)]
pub struct BrowserConfig {
    pub profile_root: PathBuf,
}

impl BrowserConfig {
    pub fn new(profile_root: impl Into<PathBuf>) -> Self {
        Self {
            profile_root: profile_root.into(),
        }
    }

    /// Profile directory for a single account
    pub fn profile_dir(&self, account_id: &str) -> PathBuf {
        self.profile_root.join(account_id)
    }
}

impl FromEnv for BrowserConfig {
    /// BROWSER_PROFILE_ROOT defaults to ./profiles
    fn from_env() -> Result<Self, crate::ConfigError> {
        Ok(Self {
            profile_root: PathBuf::from(env_or_default("BROWSER_PROFILE_ROOT", "./profiles")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browser_config_default_root() {
        temp_env::with_var_unset("BROWSER_PROFILE_ROOT", || {
            let config = BrowserConfig::from_env().unwrap();
            assert_eq!(config.profile_root, PathBuf::from("./profiles"));
        });
    }

    #[test]
    fn test_browser_config_custom_root() {
        temp_env::with_var("BROWSER_PROFILE_ROOT", Some("/var/lib/linkout/profiles"), || {
            let config = BrowserConfig::from_env().unwrap();
            assert_eq!(config.profile_root, PathBuf::from("/var/lib/linkout/profiles"));
        });
    }

    #[test]
    fn test_profile_dir_is_per_account() {
        let config = BrowserConfig::new("/profiles");
        let a = config.profile_dir("acct-1");
        let b = config.profile_dir("acct-2");
        assert_ne!(a, b);
        assert!(a.ends_with("acct-1"));
    }
}
