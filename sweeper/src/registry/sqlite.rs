//! Job registry backed by the `jobs` table.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;

use super::{Job, JobRegistry};
use crate::database::Database;

pub struct SqliteRegistry {
    database: Arc<Database>,
}

impl SqliteRegistry {
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }
}

#[async_trait]
impl JobRegistry for SqliteRegistry {
    async fn list_jobs(&self) -> Result<Vec<Job>> {
        self.database.list_jobs().await
    }

    async fn get_job(&self, name: &str) -> Result<Option<Job>> {
        self.database.get_job(name).await
    }

    async fn disable(&self, name: &str) -> Result<()> {
        self.database.set_job_disabled(name, true).await
    }

    async fn set_description(&self, name: &str, description: &str) -> Result<()> {
        self.database.set_job_description(name, description).await
    }

    async fn delete(&self, name: &str) -> Result<()> {
        if self.database.delete_job(name).await? {
            Ok(())
        } else {
            Err(anyhow!("Job '{}' not found", name))
        }
    }
}
