use futures::StreamExt;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::channels::{
    BATCH_LOCK_TTL_SECS, STATUS_SNAPSHOT_TTL_SECS, batch_lock_key, control_channel,
    status_snapshot_key,
};
use crate::error::{JobError, JobResult};
use crate::events::{ControlMessage, StatusEvent};

/// Publishes job status events and maintains the last-status snapshot
///
/// Bus failures are never fatal: the store row is authoritative, so a
/// missed event only degrades liveness. Errors are logged and absorbed.
#[derive(Clone)]
pub struct StatusPublisher {
    redis: ConnectionManager,
}

impl StatusPublisher {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// Publish to `job:{id}:status` and refresh `job:{id}:status:last`
    pub async fn publish(&self, event: &StatusEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                error!(error = %e, "Failed to serialize status event");
                return;
            }
        };

        let channel = crate::channels::status_channel(event.job_id);
        let mut conn = self.redis.clone();

        if let Err(e) = conn.publish::<_, _, ()>(&channel, &payload).await {
            warn!(channel = %channel, error = %e, "Failed to publish status event");
        } else {
            debug!(channel = %channel, status = %event.status, "Status event published");
        }

        let snapshot_key = status_snapshot_key(event.job_id);
        if let Err(e) = conn
            .set_ex::<_, _, ()>(&snapshot_key, &payload, STATUS_SNAPSHOT_TTL_SECS)
            .await
        {
            warn!(key = %snapshot_key, error = %e, "Failed to write status snapshot");
        }
    }

    /// Read the last snapshot, if one is still live
    pub async fn last_snapshot(&self, job_id: Uuid) -> JobResult<Option<StatusEvent>> {
        let mut conn = self.redis.clone();
        let raw: Option<String> = conn.get(status_snapshot_key(job_id)).await?;

        match raw {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }
}

/// A live subscription to one job's control channel
pub struct ControlStream {
    pubsub: redis::aio::PubSub,
    job_id: Uuid,
}

/// Open a dedicated pub/sub connection subscribed to `job:{id}:control`
///
/// Pub/sub cannot share the command ConnectionManager; a fresh client
/// connection is required.
pub async fn subscribe_control(redis_url: &str, job_id: Uuid) -> JobResult<ControlStream> {
    let client = redis::Client::open(redis_url).map_err(JobError::from)?;
    let mut pubsub = client.get_async_pubsub().await?;

    let channel = control_channel(job_id);
    pubsub.subscribe(&channel).await?;

    info!(job_id = %job_id, channel = %channel, "Subscribed to control channel");
    Ok(ControlStream { pubsub, job_id })
}

impl ControlStream {
    /// Next recognized control message; unrecognized payloads are skipped.
    /// Returns None when the connection closes.
    pub async fn next_message(&mut self) -> Option<ControlMessage> {
        loop {
            let msg = self.pubsub.on_message().next().await?;

            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(job_id = %self.job_id, error = %e, "Unreadable control payload");
                    continue;
                }
            };

            if let Some(control) = ControlMessage::parse(&payload) {
                return Some(control);
            }
        }
    }
}

/// A live subscription to one job's status channel
pub struct StatusStream {
    pubsub: redis::aio::PubSub,
    job_id: Uuid,
}

/// Open a dedicated pub/sub connection subscribed to `job:{id}:status`
pub async fn subscribe_status(redis_url: &str, job_id: Uuid) -> JobResult<StatusStream> {
    let client = redis::Client::open(redis_url).map_err(JobError::from)?;
    let mut pubsub = client.get_async_pubsub().await?;

    let channel = crate::channels::status_channel(job_id);
    pubsub.subscribe(&channel).await?;

    debug!(job_id = %job_id, channel = %channel, "Subscribed to status channel");
    Ok(StatusStream { pubsub, job_id })
}

impl StatusStream {
    /// Next parseable status event; returns None when the connection
    /// closes
    pub async fn next_event(&mut self) -> Option<StatusEvent> {
        loop {
            let msg = self.pubsub.on_message().next().await?;

            let payload: String = match msg.get_payload() {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(job_id = %self.job_id, error = %e, "Unreadable status payload");
                    continue;
                }
            };

            match serde_json::from_str(&payload) {
                Ok(event) => return Some(event),
                Err(e) => {
                    warn!(job_id = %self.job_id, error = %e, "Skipping malformed status event");
                }
            }
        }
    }
}

/// Per-account batch lock (`SET NX` with a TTL)
///
/// Reserved for cross-worker coordination; the holder token is the job id
/// so a stale lock is attributable.
#[derive(Clone)]
pub struct BatchLock {
    redis: ConnectionManager,
}

impl BatchLock {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    /// Try to take the lock; false when another holder has it
    pub async fn acquire(&self, account_id: Uuid, holder: Uuid) -> JobResult<bool> {
        let mut conn = self.redis.clone();

        let outcome: Option<String> = redis::cmd("SET")
            .arg(batch_lock_key(account_id))
            .arg(holder.to_string())
            .arg("NX")
            .arg("EX")
            .arg(BATCH_LOCK_TTL_SECS)
            .query_async(&mut conn)
            .await?;

        Ok(outcome.is_some())
    }

    /// Release the lock if this holder still owns it
    pub async fn release(&self, account_id: Uuid, holder: Uuid) -> JobResult<()> {
        let mut conn = self.redis.clone();
        let key = batch_lock_key(account_id);

        let current: Option<String> = conn.get(&key).await?;
        if current.as_deref() == Some(holder.to_string().as_str()) {
            conn.del::<_, ()>(&key).await?;
        }

        Ok(())
    }
}
