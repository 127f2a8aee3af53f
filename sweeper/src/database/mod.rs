//! Database layer for the job sweeper.
//!
//! This module provides SQLite persistence for:
//! - Jobs (the registry backing store)
//! - Sweep runs (audit trail of every completed sweep)
//!
//! The module is organized into submodules:
//! - `records` - Record types (entities)
//! - `jobs` - Job registry operations
//! - `sweeps` - Sweep history operations

mod jobs;
mod records;
mod sweeps;

pub use records::*;

use anyhow::Result;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;
use tracing::{debug, error, info};

pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    pub async fn new(database_path: &str) -> Result<Self> {
        info!("Database path: {}", database_path);

        if let Some(parent) = Path::new(database_path).parent() {
            if let Err(e) = tokio::fs::create_dir_all(parent).await {
                error!("FAILED to create parent directory {:?}: {}", parent, e);
                return Err(e.into());
            }
        }

        let database_url = format!("sqlite:{}?mode=rwc", database_path);
        let pool = match SqlitePool::connect(&database_url).await {
            Ok(pool) => pool,
            Err(e) => {
                error!("FAILED to connect to database: {}", e);
                error!("   Connection URL: {}", database_url);
                return Err(e.into());
            }
        };

        let database = Self { pool };
        database.initialize_tables().await?;

        info!("Database initialized at {}", database_path);
        Ok(database)
    }

    /// Single-connection in-memory database; every pooled connection would
    /// otherwise see its own empty schema.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let database = Self { pool };
        database.initialize_tables().await?;
        Ok(database)
    }

    async fn initialize_tables(&self) -> Result<()> {
        let jobs_table_sql = r#"
            CREATE TABLE IF NOT EXISTS jobs (
                name TEXT PRIMARY KEY,
                last_build_at DATETIME,
                disabled BOOLEAN NOT NULL DEFAULT 0,
                building BOOLEAN NOT NULL DEFAULT 0,
                description TEXT NOT NULL DEFAULT ''
            )
        "#;

        if let Err(e) = sqlx::query(jobs_table_sql).execute(&self.pool).await {
            error!("FAILED to create jobs table: {}", e);
            return Err(e.into());
        }

        let sweep_runs_table_sql = r#"
            CREATE TABLE IF NOT EXISTS sweep_runs (
                id TEXT PRIMARY KEY,
                started_at DATETIME NOT NULL,
                completed_at DATETIME NOT NULL,
                feature_enabled BOOLEAN NOT NULL,
                acted INTEGER NOT NULL,
                excluded INTEGER NOT NULL,
                failed INTEGER NOT NULL,
                details TEXT
            )
        "#;

        if let Err(e) = sqlx::query(sweep_runs_table_sql).execute(&self.pool).await {
            error!("FAILED to create sweep_runs table: {}", e);
            return Err(e.into());
        }

        let sweep_runs_index_sql =
            "CREATE INDEX IF NOT EXISTS idx_sweep_runs_started ON sweep_runs(started_at DESC)";
        if let Err(e) = sqlx::query(sweep_runs_index_sql).execute(&self.pool).await {
            error!("FAILED to create sweep_runs index: {}", e);
            return Err(e.into());
        }

        debug!("Database tables initialized");
        Ok(())
    }
}
