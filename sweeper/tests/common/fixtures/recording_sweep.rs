//! Sweep stand-in that records the configuration each run observed

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use sweeper::config::ScheduleConfig;
use sweeper::sweep::{Sweep, SweepReport};
use sweeper::{InMemoryRegistry, MaintenanceSweep};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Behaviour {
    Succeed,
    Fail,
    Panic,
}

pub struct RecordingSweep {
    inner: MaintenanceSweep,
    behaviour: Mutex<Behaviour>,
    seen: Mutex<Vec<ScheduleConfig>>,
    runs: AtomicUsize,
    /// When set, each run waits for one permit before returning
    gate: Option<Arc<Semaphore>>,
}

impl RecordingSweep {
    pub fn new() -> Self {
        Self {
            inner: MaintenanceSweep::new(Arc::new(InMemoryRegistry::new())),
            behaviour: Mutex::new(Behaviour::Succeed),
            seen: Mutex::new(Vec::new()),
            runs: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn over(registry: Arc<InMemoryRegistry>) -> Self {
        Self {
            inner: MaintenanceSweep::new(registry),
            ..Self::new()
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn set_behaviour(&self, behaviour: Behaviour) {
        *self.behaviour.lock().unwrap() = behaviour;
    }

    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<ScheduleConfig> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sweep for RecordingSweep {
    async fn run(&self, config: &ScheduleConfig, now: DateTime<Utc>) -> Result<SweepReport> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(config.clone());

        if let Some(gate) = &self.gate {
            gate.acquire().await?.forget();
        }

        let behaviour = *self.behaviour.lock().unwrap();
        match behaviour {
            Behaviour::Succeed => self.inner.run(config, now).await,
            Behaviour::Fail => Err(anyhow!("registry unavailable")),
            Behaviour::Panic => panic!("sweep blew up"),
        }
    }
}

/// `Sweep` is implemented for the shared handle so tests can keep a reference
/// to the recorder after handing it to the scheduler.
pub struct SharedSweep(pub Arc<RecordingSweep>);

#[async_trait]
impl Sweep for SharedSweep {
    async fn run(&self, config: &ScheduleConfig, now: DateTime<Utc>) -> Result<SweepReport> {
        self.0.run(config, now).await
    }
}
