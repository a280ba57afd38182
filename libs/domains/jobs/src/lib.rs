//! Workflow job domain: the job row of record plus the Redis control and
//! status channels
//!
//! The store row is authoritative for job state; the bus is best-effort.
//! Control flows store-first (the control plane writes the target status
//! before publishing), so a worker that misses the pub/sub message still
//! observes it via polling.

pub mod bus;
pub mod channels;
pub mod entity;
pub mod error;
pub mod events;
pub mod models;
pub mod postgres;
pub mod repository;

pub use bus::{
    BatchLock, ControlStream, StatusPublisher, StatusStream, subscribe_control, subscribe_status,
};
pub use channels::{
    BATCH_LOCK_TTL_SECS, STATUS_SNAPSHOT_TTL_SECS, batch_lock_key, control_channel,
    status_channel, status_snapshot_key,
};
pub use error::{JobError, JobResult};
pub use events::{ControlAction, ControlMessage, StatusEvent};
pub use models::{CreateJob, JobResults, JobStatus, WorkflowJob};
pub use postgres::PgJobRepository;
pub use repository::JobRepository;
