//! Job registry database operations.

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

use super::Database;
use crate::registry::Job;

impl Database {
    pub async fn upsert_job(&self, job: &Job) -> Result<()> {
        debug!("Storing job: {}", job.name);

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO jobs (
                name, last_build_at, disabled, building, description
            ) VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&job.name)
        .bind(job.last_build_at)
        .bind(job.disabled)
        .bind(job.building)
        .bind(&job.description)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_jobs(&self) -> Result<Vec<Job>> {
        let rows = sqlx::query(
            r#"
            SELECT name, last_build_at, disabled, building, description
            FROM jobs
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(job_from_row).collect()
    }

    pub async fn get_job(&self, name: &str) -> Result<Option<Job>> {
        let row = sqlx::query(
            r#"
            SELECT name, last_build_at, disabled, building, description
            FROM jobs
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(job_from_row).transpose()
    }

    pub async fn set_job_disabled(&self, name: &str, disabled: bool) -> Result<()> {
        let result = sqlx::query("UPDATE jobs SET disabled = ? WHERE name = ?")
            .bind(disabled)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Job '{}' not found", name));
        }
        Ok(())
    }

    pub async fn set_job_description(&self, name: &str, description: &str) -> Result<()> {
        let result = sqlx::query("UPDATE jobs SET description = ? WHERE name = ?")
            .bind(description)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Job '{}' not found", name));
        }
        Ok(())
    }

    pub async fn record_job_build(&self, name: &str, built_at: DateTime<Utc>) -> Result<()> {
        let result = sqlx::query("UPDATE jobs SET last_build_at = ?, building = 0 WHERE name = ?")
            .bind(built_at)
            .bind(name)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(anyhow!("Job '{}' not found", name));
        }
        Ok(())
    }

    pub async fn delete_job(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM jobs WHERE name = ?")
            .bind(name)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

fn job_from_row(row: &SqliteRow) -> Result<Job> {
    Ok(Job {
        name: row.try_get("name")?,
        last_build_at: row.try_get("last_build_at")?,
        disabled: row.try_get("disabled")?,
        building: row.try_get("building")?,
        description: row.try_get("description")?,
    })
}
