//! Sweep history database operations.

use anyhow::Result;
use sqlx::Row;
use tracing::{debug, error};

use super::records::SweepRunRecord;
use super::Database;

impl Database {
    pub async fn store_sweep_run(&self, run: &SweepRunRecord) -> Result<()> {
        debug!("Storing sweep run: {}", run.id);

        match sqlx::query(
            r#"
            INSERT OR REPLACE INTO sweep_runs (
                id, started_at, completed_at, feature_enabled,
                acted, excluded, failed, details
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&run.id)
        .bind(run.started_at)
        .bind(run.completed_at)
        .bind(run.feature_enabled)
        .bind(run.acted)
        .bind(run.excluded)
        .bind(run.failed)
        .bind(&run.details)
        .execute(&self.pool)
        .await
        {
            Ok(_) => Ok(()),
            Err(e) => {
                error!("Failed to store sweep run {}: {}", run.id, e);
                Err(e.into())
            }
        }
    }

    pub async fn recent_sweep_runs(&self, limit: i64) -> Result<Vec<SweepRunRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT id, started_at, completed_at, feature_enabled,
                   acted, excluded, failed, details
            FROM sweep_runs
            ORDER BY started_at DESC
            LIMIT ?
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut runs = Vec::with_capacity(rows.len());
        for row in rows {
            runs.push(SweepRunRecord {
                id: row.try_get("id")?,
                started_at: row.try_get("started_at")?,
                completed_at: row.try_get("completed_at")?,
                feature_enabled: row.try_get("feature_enabled")?,
                acted: row.try_get("acted")?,
                excluded: row.try_get("excluded")?,
                failed: row.try_get("failed")?,
                details: row.try_get("details")?,
            });
        }
        Ok(runs)
    }
}
