//! Registry wrapper that fails lifecycle calls for selected jobs

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use sweeper::registry::{InMemoryRegistry, Job, JobRegistry};

pub struct FailingRegistry {
    inner: Arc<InMemoryRegistry>,
    failing: HashSet<String>,
}

impl FailingRegistry {
    pub fn new(inner: Arc<InMemoryRegistry>, failing: &[&str]) -> Self {
        Self {
            inner,
            failing: failing.iter().map(|name| name.to_string()).collect(),
        }
    }

    fn check(&self, name: &str, operation: &str) -> Result<()> {
        if self.failing.contains(name) {
            Err(anyhow!("permission denied: cannot {} '{}'", operation, name))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl JobRegistry for FailingRegistry {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        self.inner.list_jobs().await
    }

    async fn get_job(&self, name: &str) -> Result<Option<Job>> {
        self.inner.get_job(name).await
    }

    async fn disable(&self, name: &str) -> Result<()> {
        self.check(name, "disable")?;
        self.inner.disable(name).await
    }

    async fn set_description(&self, name: &str, description: &str) -> Result<()> {
        self.check(name, "describe")?;
        self.inner.set_description(name, description).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        self.check(name, "delete")?;
        self.inner.delete(name).await
    }
}
