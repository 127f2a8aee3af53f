// File: sweeper/src/sweep/mod.rs
//! Maintenance sweep over the job registry.
//!
//! Every job gets exactly one classification per sweep, decided in this
//! order:
//!
//! 1. building right now -> `ExcludedBusy`
//! 2. never built -> `ExcludedNoBuilds`
//! 3. already disabled -> `ExcludedAlreadyDisabled`
//! 4. last build younger than the age threshold -> `ExcludedTooRecent`
//! 5. name fully matches an exclusion pattern -> `ExcludedPatternMatch`
//! 6. otherwise -> `Acted` (disabled and annotated, or deleted)
//!
//! A failing registry call is recorded against that job only; the remaining
//! jobs are still evaluated.

pub mod patterns;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::ScheduleConfig;
use crate::constants::sweep::{ANNOTATION_TIME_FORMAT, SECONDS_PER_DAY};
use crate::database::{Database, SweepRunRecord};
use crate::errors::{JobError, SweeperError};
use crate::registry::{Job, JobRegistry};

pub use patterns::ExclusionPatterns;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Acted,
    ExcludedNoBuilds,
    ExcludedAlreadyDisabled,
    ExcludedBusy,
    ExcludedPatternMatch,
    ExcludedTooRecent,
}

impl Classification {
    pub fn is_excluded(&self) -> bool {
        !matches!(self, Classification::Acted)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JobOutcome {
    pub job_name: String,
    pub result: Result<Classification, SweeperError>,
}

/// Flattened outcome stored in the sweep history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutcomeDetail {
    pub job: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SweepReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// False when the master switch was off and no job was looked at
    pub feature_enabled: bool,
    pub outcomes: Vec<JobOutcome>,
    pub invalid_patterns: Vec<JobError>,
}

impl SweepReport {
    fn disabled(now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            started_at: now,
            completed_at: Utc::now(),
            feature_enabled: false,
            outcomes: Vec::new(),
            invalid_patterns: Vec::new(),
        }
    }

    pub fn outcome(&self, job_name: &str) -> Option<&Result<Classification, SweeperError>> {
        self.outcomes
            .iter()
            .find(|o| o.job_name == job_name)
            .map(|o| &o.result)
    }

    pub fn classification(&self, job_name: &str) -> Option<Classification> {
        match self.outcome(job_name) {
            Some(Ok(classification)) => Some(*classification),
            _ => None,
        }
    }

    pub fn count(&self, classification: Classification) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.as_ref().ok() == Some(&classification))
            .count()
    }

    pub fn acted(&self) -> usize {
        self.count(Classification::Acted)
    }

    pub fn excluded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(&o.result, Ok(c) if c.is_excluded()))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_err()).count()
    }

    pub fn details(&self) -> Vec<OutcomeDetail> {
        self.outcomes
            .iter()
            .map(|o| OutcomeDetail {
                job: o.job_name.clone(),
                classification: o.result.as_ref().ok().copied(),
                error: o.result.as_ref().err().map(|e| e.to_string()),
            })
            .collect()
    }

    fn to_record(&self) -> SweepRunRecord {
        SweepRunRecord {
            id: self.id.to_string(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            feature_enabled: self.feature_enabled,
            acted: self.acted() as i64,
            excluded: self.excluded() as i64,
            failed: self.failed() as i64,
            details: serde_json::to_string(&self.details()).ok(),
        }
    }
}

/// One complete pass of the maintenance policy.
#[async_trait]
pub trait Sweep: Send + Sync + 'static {
    async fn run(&self, config: &ScheduleConfig, now: DateTime<Utc>) -> Result<SweepReport>;
}

/// Decides what the sweep does with `job`. Pure; touches nothing.
pub fn classify(
    job: &Job,
    config: &ScheduleConfig,
    patterns: &ExclusionPatterns,
    now: DateTime<Utc>,
) -> Classification {
    if job.building {
        return Classification::ExcludedBusy;
    }

    let Some(last_build_at) = job.last_build_at else {
        return Classification::ExcludedNoBuilds;
    };

    if job.disabled {
        return Classification::ExcludedAlreadyDisabled;
    }

    let threshold = Duration::seconds(i64::from(config.age_threshold_days) * SECONDS_PER_DAY);
    if now.signed_duration_since(last_build_at) < threshold {
        return Classification::ExcludedTooRecent;
    }

    if patterns.matches(&job.name) {
        return Classification::ExcludedPatternMatch;
    }

    Classification::Acted
}

/// Description written when a job is disabled: the template and sweep time on
/// their own line, followed by everything the job already said.
pub fn annotated_description(config: &ScheduleConfig, existing: &str, now: DateTime<Utc>) -> String {
    let tz = config.tz().unwrap_or(Tz::UTC);
    format!(
        "{} '{}'\n{}",
        config.description_template,
        now.with_timezone(&tz).format(ANNOTATION_TIME_FORMAT),
        existing
    )
}

/// Sweep that disables (or removes) stale jobs in a `JobRegistry`.
pub struct MaintenanceSweep {
    registry: Arc<dyn JobRegistry>,
    history: Option<Arc<Database>>,
}

impl MaintenanceSweep {
    pub fn new(registry: Arc<dyn JobRegistry>) -> Self {
        Self {
            registry,
            history: None,
        }
    }

    /// Record every completed sweep in the `sweep_runs` table.
    pub fn with_history(mut self, database: Arc<Database>) -> Self {
        self.history = Some(database);
        self
    }

    async fn act_on(
        &self,
        job: &Job,
        config: &ScheduleConfig,
        now: DateTime<Utc>,
    ) -> Result<(), SweeperError> {
        let failed = |operation: &str, e: anyhow::Error| -> SweeperError {
            JobError::OperationFailed {
                job_name: job.name.clone(),
                operation: operation.to_string(),
                reason: e.to_string(),
            }
            .into()
        };

        if config.remove_on_match {
            debug!("Removing job '{}'", job.name);
            self.registry
                .delete(&job.name)
                .await
                .map_err(|e| failed("delete", e))?;
        } else {
            debug!("Disabling job '{}'", job.name);
            self.registry
                .disable(&job.name)
                .await
                .map_err(|e| failed("disable", e))?;

            let description = annotated_description(config, &job.description, now);
            self.registry
                .set_description(&job.name, &description)
                .await
                .map_err(|e| failed("set_description", e))?;
        }

        Ok(())
    }

    async fn record(&self, report: &SweepReport) {
        if let Some(database) = &self.history {
            if let Err(e) = database.store_sweep_run(&report.to_record()).await {
                warn!("Failed to record sweep run {}: {}", report.id, e);
            }
        }
    }
}

#[async_trait]
impl Sweep for MaintenanceSweep {
    async fn run(&self, config: &ScheduleConfig, now: DateTime<Utc>) -> Result<SweepReport> {
        if !config.enabled {
            debug!("Maintenance sweep is disabled");
            let report = SweepReport::disabled(now);
            self.record(&report).await;
            return Ok(report);
        }

        let jobs = self.registry.list_jobs().await?;
        let patterns = ExclusionPatterns::compile(&config.exclude_patterns);
        let mut outcomes = Vec::with_capacity(jobs.len());

        for job in &jobs {
            let classification = classify(job, config, &patterns, now);
            let result = match classification {
                Classification::Acted => self
                    .act_on(job, config, now)
                    .await
                    .map(|_| Classification::Acted),
                Classification::ExcludedBusy => {
                    debug!("Excluded job '{}' since it is building", job.name);
                    Ok(classification)
                }
                Classification::ExcludedNoBuilds => {
                    debug!("Excluded job '{}' since it doesn't have any builds yet", job.name);
                    Ok(classification)
                }
                Classification::ExcludedAlreadyDisabled => {
                    debug!("Excluded job '{}' since it is already disabled", job.name);
                    Ok(classification)
                }
                Classification::ExcludedTooRecent => {
                    debug!("Excluded job '{}' since it built recently", job.name);
                    Ok(classification)
                }
                Classification::ExcludedPatternMatch => {
                    debug!(
                        "Excluded job '{}' by pattern '{}'",
                        job.name,
                        patterns.matching(&job.name).unwrap_or_default()
                    );
                    Ok(classification)
                }
            };

            if let Err(e) = &result {
                warn!("{}", e);
            }

            outcomes.push(JobOutcome {
                job_name: job.name.clone(),
                result,
            });
        }

        let report = SweepReport {
            id: Uuid::new_v4(),
            started_at: now,
            completed_at: Utc::now(),
            feature_enabled: true,
            outcomes,
            invalid_patterns: patterns.invalid().to_vec(),
        };

        info!(
            "Sweep {} finished: {} jobs, {} acted, {} excluded, {} failed",
            report.id,
            jobs.len(),
            report.acted(),
            report.excluded(),
            report.failed()
        );

        self.record(&report).await;
        Ok(report)
    }
}
