//! Job registry: enumerates managed jobs and applies lifecycle changes.
//!
//! The sweep only ever reads a `Job` snapshot and calls back into the
//! registry by name, so any store that can list, disable, annotate and
//! delete jobs can be swept.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryRegistry;
pub use sqlite::SqliteRegistry;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Point-in-time view of one managed job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    /// Completion time of the most recent build, if the job ever built
    pub last_build_at: Option<DateTime<Utc>>,
    pub disabled: bool,
    /// A build is in progress right now
    pub building: bool,
    pub description: String,
}

impl Job {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            last_build_at: None,
            disabled: false,
            building: false,
            description: String::new(),
        }
    }

    pub fn with_last_build(mut self, built_at: DateTime<Utc>) -> Self {
        self.last_build_at = Some(built_at);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    pub fn building(mut self) -> Self {
        self.building = true;
        self
    }
}

#[async_trait]
pub trait JobRegistry: Send + Sync {
    async fn list_jobs(&self) -> Result<Vec<Job>>;

    async fn get_job(&self, name: &str) -> Result<Option<Job>>;

    async fn disable(&self, name: &str) -> Result<()>;

    async fn set_description(&self, name: &str, description: &str) -> Result<()>;

    /// Removes the job entirely; later lookups return `None`.
    async fn delete(&self, name: &str) -> Result<()>;
}
