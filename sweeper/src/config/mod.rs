// File: sweeper/src/config/mod.rs
pub mod manager;
pub mod validation;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::constants::{config as defaults, sweep};
use crate::errors::ScheduleError;

pub use manager::ConfigManager;
pub use validation::Validation;

/// Top-level layout of `config/sweeper.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweeperConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

/// Snapshot of the maintenance policy. Read once per sweep and never mutated
/// in place; `ConfigManager::save` swaps in a new snapshot instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Master switch; a disabled sweep touches nothing
    #[serde(default)]
    pub enabled: bool,
    /// 5-field cron spec (minute hour day-of-month month day-of-week)
    #[serde(default = "default_cron_spec")]
    pub cron_spec: String,
    /// Minimum age of the last build before a job is eligible
    #[serde(default = "default_age_threshold_days")]
    pub age_threshold_days: u32,
    /// Full-match regular expressions; matching jobs are never acted on
    #[serde(default)]
    pub exclude_patterns: Vec<String>,
    /// Delete eligible jobs instead of disabling them
    #[serde(default)]
    pub remove_on_match: bool,
    #[serde(default = "default_description_template")]
    pub description_template: String,
    /// IANA zone the cron spec is evaluated in
    #[serde(default = "default_timezone")]
    pub timezone: String,
}

impl ScheduleConfig {
    pub fn tz(&self) -> Result<Tz, ScheduleError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| ScheduleError::InvalidTimezone {
                name: self.timezone.clone(),
            })
    }
}

fn default_database_path() -> String {
    defaults::DEFAULT_DATABASE_PATH.to_string()
}

fn default_cron_spec() -> String {
    defaults::DEFAULT_CRON_SPEC.to_string()
}

fn default_age_threshold_days() -> u32 {
    30
}

fn default_description_template() -> String {
    sweep::DEFAULT_DESCRIPTION_TEMPLATE.to_string()
}

fn default_timezone() -> String {
    defaults::DEFAULT_TIMEZONE.to_string()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron_spec: default_cron_spec(),
            age_threshold_days: default_age_threshold_days(),
            exclude_patterns: Vec::new(),
            remove_on_match: false,
            description_template: default_description_template(),
            timezone: default_timezone(),
        }
    }
}

impl Default for SweeperConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            schedule: ScheduleConfig::default(),
        }
    }
}
