use uuid::Uuid;

/// Per-job control channel: pause/cancel signals flow worker-ward
pub fn control_channel(job_id: Uuid) -> String {
    format!("job:{}:control", job_id)
}

/// Per-job status channel: progress events flow subscriber-ward
pub fn status_channel(job_id: Uuid) -> String {
    format!("job:{}:status", job_id)
}

/// Last-status snapshot key, so late subscribers catch the current state
pub fn status_snapshot_key(job_id: Uuid) -> String {
    format!("job:{}:status:last", job_id)
}

/// Per-account batch mutual-exclusion lock
pub fn batch_lock_key(account_id: Uuid) -> String {
    format!("account:{}:batch-lock", account_id)
}

pub const STATUS_SNAPSHOT_TTL_SECS: u64 = 600;
pub const BATCH_LOCK_TTL_SECS: u64 = 300;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_key_shapes() {
        let id = Uuid::nil();
        assert_eq!(
            control_channel(id),
            "job:00000000-0000-0000-0000-000000000000:control"
        );
        assert_eq!(
            status_channel(id),
            "job:00000000-0000-0000-0000-000000000000:status"
        );
        assert_eq!(
            status_snapshot_key(id),
            "job:00000000-0000-0000-0000-000000000000:status:last"
        );
        assert_eq!(
            batch_lock_key(id),
            "account:00000000-0000-0000-0000-000000000000:batch-lock"
        );
    }
}
