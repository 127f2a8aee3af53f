//! Custom error types for the job sweeper
//!
//! Every failure the sweep loop can hit has a variant here. Most of them are
//! recovered locally (fallback delay, skipped pattern, skipped job) and only
//! surface through logs and the sweep report.

use std::fmt;

/// Main error type for the job sweeper
#[derive(Debug, Clone, PartialEq)]
pub enum SweeperError {
    /// Recurrence calculation errors
    Schedule(ScheduleError),

    /// Per-job and per-pattern sweep errors
    Job(JobError),

    /// Configuration-related errors
    Config(ConfigError),

    /// Other errors with context
    Other(String),
}

/// Recurrence calculation error variants
#[derive(Debug, Clone, PartialEq)]
pub enum ScheduleError {
    /// Cron spec has the wrong field count or bad syntax
    InvalidCronSpec { spec: String, reason: String },

    /// Cron spec parses but never matches a future instant
    NoUpcomingFire { spec: String },

    /// Timezone name is not a known IANA zone
    InvalidTimezone { name: String },
}

/// Sweep error variants, each scoped to one job or one pattern
#[derive(Debug, Clone, PartialEq)]
pub enum JobError {
    /// Exclusion pattern failed to compile
    InvalidPattern { pattern: String, reason: String },

    /// Registry call failed for a single job
    OperationFailed {
        job_name: String,
        operation: String,
        reason: String,
    },
}

/// Configuration error variants
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to read or write the configuration file
    LoadFailed { path: String, reason: String },

    /// Age filter is not a non-negative integer
    InvalidAgeThreshold { value: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

impl fmt::Display for SweeperError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SweeperError::Schedule(e) => write!(f, "Schedule error: {}", e),
            SweeperError::Job(e) => write!(f, "Job error: {}", e),
            SweeperError::Config(e) => write!(f, "Configuration error: {}", e),
            SweeperError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleError::InvalidCronSpec { spec, reason } => {
                write!(f, "Invalid cron spec '{}': {}", spec, reason)
            }
            ScheduleError::NoUpcomingFire { spec } => {
                write!(f, "Cron spec '{}' never fires", spec)
            }
            ScheduleError::InvalidTimezone { name } => {
                write!(f, "Unknown timezone '{}'", name)
            }
        }
    }
}

impl fmt::Display for JobError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobError::InvalidPattern { pattern, reason } => {
                write!(f, "Invalid regular expression [{}]: {}", pattern, reason)
            }
            JobError::OperationFailed {
                job_name,
                operation,
                reason,
            } => {
                write!(
                    f,
                    "Operation '{}' failed on job '{}': {}",
                    operation, job_name, reason
                )
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidAgeThreshold { value, reason } => {
                write!(f, "Invalid numeric [{}]: {}", value, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl std::error::Error for SweeperError {}
impl std::error::Error for ScheduleError {}
impl std::error::Error for JobError {}
impl std::error::Error for ConfigError {}

impl From<anyhow::Error> for SweeperError {
    fn from(err: anyhow::Error) -> Self {
        SweeperError::Other(err.to_string())
    }
}

impl From<ScheduleError> for SweeperError {
    fn from(err: ScheduleError) -> Self {
        SweeperError::Schedule(err)
    }
}

impl From<JobError> for SweeperError {
    fn from(err: JobError) -> Self {
        SweeperError::Job(err)
    }
}

impl From<ConfigError> for SweeperError {
    fn from(err: ConfigError) -> Self {
        SweeperError::Config(err)
    }
}
