//! Redis test infrastructure

use redis::Client;
use redis::aio::ConnectionManager;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::redis::Redis;

/// Test Redis wrapper; the container is removed when dropped
pub struct TestRedis {
    #[allow(dead_code)]
    container: ContainerAsync<Redis>,
    manager: ConnectionManager,
    pub connection_string: String,
}

impl TestRedis {
    pub async fn new() -> Self {
        let redis_image = Redis::default().with_tag("7-alpine");

        let container = redis_image
            .start()
            .await
            .expect("Failed to start Redis container");

        let host_port = container
            .get_host_port_ipv4(6379)
            .await
            .expect("Failed to get Redis port");

        let connection_string = format!("redis://127.0.0.1:{}", host_port);

        let client = Client::open(connection_string.clone()).expect("Failed to create client");
        let manager = ConnectionManager::new(client)
            .await
            .expect("Failed to connect to Redis");

        tracing::info!(port = host_port, "Test Redis ready");

        Self {
            container,
            manager,
            connection_string,
        }
    }

    /// Cloned ConnectionManager for caches and publishers
    pub fn manager(&self) -> ConnectionManager {
        self.manager.clone()
    }
}
