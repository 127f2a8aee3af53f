//! In-process job registry.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{Job, JobRegistry};

/// Registry holding jobs in insertion order.
#[derive(Default)]
pub struct InMemoryRegistry {
    jobs: RwLock<Vec<Job>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jobs(jobs: Vec<Job>) -> Self {
        Self {
            jobs: RwLock::new(jobs),
        }
    }

    /// Inserts the job, replacing any job with the same name in place.
    pub async fn upsert(&self, job: Job) {
        let mut jobs = self.jobs.write().await;
        match jobs.iter_mut().find(|existing| existing.name == job.name) {
            Some(existing) => *existing = job,
            None => jobs.push(job),
        }
    }
}

#[async_trait]
impl JobRegistry for InMemoryRegistry {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        Ok(self.jobs.read().await.clone())
    }

    async fn get_job(&self, name: &str) -> Result<Option<Job>> {
        Ok(self.jobs.read().await.iter().find(|j| j.name == name).cloned())
    }

    async fn disable(&self, name: &str) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.name == name)
            .ok_or_else(|| anyhow!("Job '{}' not found", name))?;
        job.disabled = true;
        Ok(())
    }

    async fn set_description(&self, name: &str, description: &str) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let job = jobs
            .iter_mut()
            .find(|j| j.name == name)
            .ok_or_else(|| anyhow!("Job '{}' not found", name))?;
        job.description = description.to_string();
        Ok(())
    }

    async fn delete(&self, name: &str) -> Result<()> {
        let mut jobs = self.jobs.write().await;
        let before = jobs.len();
        jobs.retain(|j| j.name != name);
        if jobs.len() == before {
            return Err(anyhow!("Job '{}' not found", name));
        }
        Ok(())
    }
}
