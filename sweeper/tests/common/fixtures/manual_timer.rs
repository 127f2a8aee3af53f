//! Timer facility driven by the test instead of the clock
//!
//! Callbacks are only run when the test calls `fire_*`, so scheduler tests can
//! check exactly what was armed and step through fires one at a time.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use sweeper::scheduler::{TaskHandle, TimerCallback, TimerFacility};

struct Armed {
    handle: TaskHandle,
    callback: Option<TimerCallback>,
    cancelled: bool,
}

#[derive(Default)]
pub struct ManualTimer {
    armed: Mutex<Vec<Armed>>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles whose callback has neither run nor been cancelled
    pub fn pending(&self) -> Vec<TaskHandle> {
        self.armed
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.callback.is_some() && !a.cancelled)
            .map(|a| a.handle.clone())
            .collect()
    }

    pub fn pending_count(&self) -> usize {
        self.pending().len()
    }

    /// Every `schedule_once` call so far
    pub fn scheduled_count(&self) -> usize {
        self.armed.lock().unwrap().len()
    }

    pub fn cancelled_count(&self) -> usize {
        self.armed.lock().unwrap().iter().filter(|a| a.cancelled).count()
    }

    pub fn last_delay(&self) -> Option<Duration> {
        self.armed.lock().unwrap().last().map(|a| a.handle.delay)
    }

    /// Runs the callback behind `handle` even if it was cancelled, the way a
    /// real timer can race a cancel.
    pub async fn fire_handle(&self, handle: &TaskHandle) -> Result<()> {
        let callback = {
            let mut armed = self.armed.lock().unwrap();
            let entry = armed
                .iter_mut()
                .find(|a| a.handle.id == handle.id)
                .ok_or_else(|| anyhow!("Unknown handle {}", handle.id))?;
            entry
                .callback
                .take()
                .ok_or_else(|| anyhow!("Handle {} already fired", handle.id))?
        };
        callback().await;
        Ok(())
    }

    /// Runs the most recently armed live callback.
    pub async fn fire_latest(&self) -> Result<()> {
        let handle = self
            .pending()
            .pop()
            .ok_or_else(|| anyhow!("Nothing armed"))?;
        self.fire_handle(&handle).await
    }
}

#[async_trait]
impl TimerFacility for ManualTimer {
    async fn schedule_once(&self, delay: Duration, callback: TimerCallback) -> Result<TaskHandle> {
        let handle = TaskHandle::new(delay);
        self.armed.lock().unwrap().push(Armed {
            handle: handle.clone(),
            callback: Some(callback),
            cancelled: false,
        });
        Ok(handle)
    }

    async fn cancel(&self, handle: &TaskHandle) -> Result<()> {
        if let Some(entry) = self
            .armed
            .lock()
            .unwrap()
            .iter_mut()
            .find(|a| a.handle.id == handle.id)
        {
            entry.cancelled = true;
        }
        Ok(())
    }
}
