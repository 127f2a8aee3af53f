// File: sweeper/src/scheduler/recurring.rs
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use anyhow::Result;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, instrument, warn};

use super::recurrence::RecurrencePolicy;
use super::timer::{TaskHandle, TimerCallback, TimerFacility};
use crate::config::ConfigManager;
use crate::sweep::{Sweep, SweepReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchedulerState {
    Idle,
    Armed,
    Firing,
    Cancelled,
}

struct ScheduleSlot {
    handle: Option<TaskHandle>,
    /// Bumped on every arm and on cancel; a fire carrying an older value is stale
    generation: u64,
    cancelled: bool,
}

struct Inner<R, S> {
    config: Arc<ConfigManager>,
    recurrence: R,
    sweep: S,
    timer: Arc<dyn TimerFacility>,
    slot: Mutex<ScheduleSlot>,
    in_flight: Mutex<()>,
    fire_count: AtomicU64,
    last_report: RwLock<Option<SweepReport>>,
}

/// Runs `sweep` forever on the schedule produced by `recurrence`.
///
/// At most one callback is armed at any time. Each fire sweeps with the
/// configuration current at that moment, then arms the next fire from the
/// clock and configuration observed after the sweep returned.
pub struct RecurringScheduler<R, S> {
    inner: Arc<Inner<R, S>>,
}

impl<R, S> Clone for RecurringScheduler<R, S> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<R, S> RecurringScheduler<R, S>
where
    R: RecurrencePolicy,
    S: Sweep,
{
    pub fn new(
        config: Arc<ConfigManager>,
        recurrence: R,
        sweep: S,
        timer: Arc<dyn TimerFacility>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                recurrence,
                sweep,
                timer,
                slot: Mutex::new(ScheduleSlot {
                    handle: None,
                    generation: 0,
                    cancelled: false,
                }),
                in_flight: Mutex::new(()),
                fire_count: AtomicU64::new(0),
                last_report: RwLock::new(None),
            }),
        }
    }

    /// Arms the next sweep from the live configuration, replacing whatever
    /// was armed before. Also used after every configuration change.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<()> {
        let mut slot = self.inner.slot.lock().await;

        if let Some(previous) = slot.handle.take() {
            info!("Replacing scheduled sweep {}", previous.id);
            if let Err(e) = self.inner.timer.cancel(&previous).await {
                warn!("Failed to cancel scheduled sweep {}: {}", previous.id, e);
            }
        }

        slot.cancelled = false;
        self.inner.arm(&mut slot).await
    }

    /// Drops the pending sweep. A sweep already running finishes but does not
    /// re-arm. Safe to call any number of times.
    #[instrument(skip(self))]
    pub async fn cancel(&self) {
        let mut slot = self.inner.slot.lock().await;
        slot.cancelled = true;
        slot.generation += 1;

        match slot.handle.take() {
            Some(handle) => {
                if let Err(e) = self.inner.timer.cancel(&handle).await {
                    warn!("Failed to cancel scheduled sweep {}: {}", handle.id, e);
                }
                info!("Cancelled scheduled sweep {}", handle.id);
            }
            None => debug!("No scheduled sweep to cancel"),
        }
    }

    pub async fn state(&self) -> SchedulerState {
        let slot = self.inner.slot.lock().await;
        if slot.cancelled {
            SchedulerState::Cancelled
        } else if self.inner.in_flight.try_lock().is_err() {
            SchedulerState::Firing
        } else if slot.handle.is_some() {
            SchedulerState::Armed
        } else {
            SchedulerState::Idle
        }
    }

    pub async fn is_armed(&self) -> bool {
        self.inner.slot.lock().await.handle.is_some()
    }

    pub async fn current_handle(&self) -> Option<TaskHandle> {
        self.inner.slot.lock().await.handle.clone()
    }

    pub async fn scheduled_fire_time(&self) -> Option<DateTime<Utc>> {
        self.current_handle().await.map(|handle| handle.fire_at())
    }

    /// Completed sweeps, successful or not.
    pub fn fire_count(&self) -> u64 {
        self.inner.fire_count.load(Ordering::SeqCst)
    }

    pub async fn last_report(&self) -> Option<SweepReport> {
        self.inner.last_report.read().await.clone()
    }
}

impl<R, S> Inner<R, S>
where
    R: RecurrencePolicy,
    S: Sweep,
{
    async fn arm(self: &Arc<Self>, slot: &mut ScheduleSlot) -> Result<()> {
        let config = self.config.get().await;
        let delay = self.recurrence.next_delay(&config, Utc::now());

        slot.generation += 1;
        let generation = slot.generation;

        let weak: Weak<Self> = Arc::downgrade(self);
        let callback: TimerCallback = Box::new(move || {
            Box::pin(async move {
                if let Some(inner) = weak.upgrade() {
                    inner.fire(generation).await;
                }
            })
        });

        let handle = self.timer.schedule_once(delay, callback).await?;
        info!(
            "Next maintenance sweep at {} (in {} ms)",
            handle.fire_at().format("%Y-%m-%d %H:%M:%S UTC"),
            delay.as_millis()
        );
        slot.handle = Some(handle);
        Ok(())
    }

    fn is_current(slot: &ScheduleSlot, generation: u64) -> bool {
        !slot.cancelled && slot.generation == generation
    }

    fn fire(self: Arc<Self>, generation: u64) -> BoxFuture<'static, ()> {
        Box::pin(async move {
            {
                let mut slot = self.slot.lock().await;
                if !Self::is_current(&slot, generation) {
                    debug!("Abandoning superseded sweep (generation {})", generation);
                    return;
                }
                slot.handle = None;
            }

            let in_flight = self.in_flight.lock().await;

            if !Self::is_current(&*self.slot.lock().await, generation) {
                debug!("Sweep superseded while waiting (generation {})", generation);
                return;
            }

            let config = self.config.get().await;
            let started_at = Utc::now();
            info!("Running maintenance sweep");

            match AssertUnwindSafe(self.sweep.run(&config, started_at))
                .catch_unwind()
                .await
            {
                Ok(Ok(report)) => {
                    *self.last_report.write().await = Some(report);
                }
                Ok(Err(e)) => error!("Maintenance sweep failed: {}", e),
                Err(_) => error!("Maintenance sweep panicked"),
            }
            self.fire_count.fetch_add(1, Ordering::SeqCst);
            drop(in_flight);

            let mut slot = self.slot.lock().await;
            if !Self::is_current(&slot, generation) {
                debug!("Schedule replaced during sweep; not re-arming");
                return;
            }
            if let Err(e) = self.arm(&mut slot).await {
                error!("Failed to re-arm maintenance sweep: {}", e);
            }
        })
    }
}
