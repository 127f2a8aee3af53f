// File: sweeper/src/scheduler/timer.rs
//! One-shot timer facility.
//!
//! The recurring scheduler never registers a repeating job. It arms a single
//! callback, and the callback arms the next one once the sweep is done, so the
//! delay is always recomputed from the latest configuration.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, warn};
use uuid::Uuid;

pub type TimerCallback = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Identifies one armed callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskHandle {
    pub id: Uuid,
    pub armed_at: DateTime<Utc>,
    pub delay: Duration,
}

impl TaskHandle {
    pub fn new(delay: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            armed_at: Utc::now(),
            delay,
        }
    }

    /// Absolute instant the callback is due.
    pub fn fire_at(&self) -> DateTime<Utc> {
        self.armed_at + chrono::Duration::milliseconds(self.delay.as_millis() as i64)
    }
}

#[async_trait]
pub trait TimerFacility: Send + Sync {
    async fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> Result<TaskHandle>;

    /// Drops a pending callback. Cancelling a handle that already fired or
    /// was already cancelled is not an error.
    async fn cancel(&self, handle: &TaskHandle) -> Result<()>;
}

/// Timer backed by one-shot jobs on a `tokio-cron-scheduler` JobScheduler.
pub struct JobSchedulerTimer {
    scheduler: JobScheduler,
}

impl JobSchedulerTimer {
    pub async fn new() -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create JobScheduler: {}", e))?;

        scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start JobScheduler: {}", e))?;

        Ok(Self { scheduler })
    }
}

#[async_trait]
impl TimerFacility for JobSchedulerTimer {
    async fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> Result<TaskHandle> {
        // The job closure is FnMut; the callback runs at most once.
        let slot = Arc::new(Mutex::new(Some(callback)));

        let job = Job::new_one_shot_async(delay, move |uuid, _scheduler| {
            let callback = slot.lock().ok().and_then(|mut guard| guard.take());
            Box::pin(async move {
                match callback {
                    Some(callback) => callback().await,
                    None => warn!("One-shot job {} fired more than once", uuid),
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create one-shot job: {}", e))?;

        let id = self
            .scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add one-shot job to scheduler: {}", e))?;

        debug!("Armed one-shot job {} in {} ms", id, delay.as_millis());

        Ok(TaskHandle {
            id,
            armed_at: Utc::now(),
            delay,
        })
    }

    async fn cancel(&self, handle: &TaskHandle) -> Result<()> {
        self.scheduler
            .remove(&handle.id)
            .await
            .map_err(|e| anyhow!("Failed to remove one-shot job {}: {}", handle.id, e))?;
        debug!("Removed one-shot job {}", handle.id);
        Ok(())
    }
}
