//! Shared test utilities for domain testing
//!
//! - `TestDatabase`: PostgreSQL container with migrations applied
//!   (feature: "postgres")
//! - `TestRedis`: Redis container (feature: "redis")
//! - `TestDataBuilder`: deterministic test data generation
//!
//! Container-backed tests require a Docker daemon; mark them `#[ignore]`
//! so the default test run stays hermetic.

use uuid::Uuid;

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "redis")]
mod redis;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

#[cfg(feature = "redis")]
pub use redis::TestRedis;

/// Builder for test data with deterministic randomization
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (seed is the name's hash), the recommended
    /// way to get reproducible per-test data
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Deterministic UUID derived from the seed
    pub fn user_id(&self) -> Uuid {
        let bytes = self.seed.to_le_bytes();
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes[..8].copy_from_slice(&bytes);
        uuid_bytes[8..16].copy_from_slice(&bytes);
        Uuid::from_bytes(uuid_bytes)
    }

    /// A unique resource name: `test-{prefix}-{seed}-{suffix}`
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        format!("test-{}-{}-{}", prefix, self.seed, suffix)
    }

    /// A canonical LinkedIn profile URL unique to this test
    pub fn profile_url(&self, suffix: &str) -> String {
        format!(
            "https://www.linkedin.com/in/test-{}-{}/",
            self.seed, suffix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_builder_deterministic() {
        let builder1 = TestDataBuilder::new(42);
        let builder2 = TestDataBuilder::new(42);

        assert_eq!(builder1.user_id(), builder2.user_id());
        assert_eq!(
            builder1.name("campaign", "main"),
            builder2.name("campaign", "main")
        );
        assert_eq!(builder1.profile_url("a"), builder2.profile_url("a"));
    }

    #[test]
    fn test_data_builder_different_names() {
        let builder1 = TestDataBuilder::from_test_name("test1");
        let builder2 = TestDataBuilder::from_test_name("test2");

        assert_ne!(builder1.user_id(), builder2.user_id());
    }
}
