//! Database record types (entities).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One completed sweep, as stored in `sweep_runs`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepRunRecord {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub feature_enabled: bool,
    pub acted: i64,
    pub excluded: i64,
    pub failed: i64,
    /// JSON-encoded per-job outcomes
    pub details: Option<String>,
}
