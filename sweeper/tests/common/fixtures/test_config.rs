//! Test configuration builders

use std::path::PathBuf;
use sweeper::config::{ScheduleConfig, SweeperConfig};
use sweeper::ConfigManager;
use tempfile::TempDir;

/// Builder for schedule configurations used in tests
pub struct TestConfigBuilder {
    schedule: ScheduleConfig,
}

impl TestConfigBuilder {
    /// Enabled sweep, daily at midnight, 30 day threshold, UTC
    pub fn new() -> Self {
        Self {
            schedule: ScheduleConfig {
                enabled: true,
                ..ScheduleConfig::default()
            },
        }
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.schedule.enabled = enabled;
        self
    }

    pub fn cron(mut self, spec: &str) -> Self {
        self.schedule.cron_spec = spec.to_string();
        self
    }

    pub fn age_days(mut self, days: u32) -> Self {
        self.schedule.age_threshold_days = days;
        self
    }

    pub fn exclude(mut self, patterns: &[&str]) -> Self {
        self.schedule.exclude_patterns = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    pub fn remove_on_match(mut self, remove: bool) -> Self {
        self.schedule.remove_on_match = remove;
        self
    }

    pub fn description_template(mut self, template: &str) -> Self {
        self.schedule.description_template = template.to_string();
        self
    }

    pub fn timezone(mut self, tz: &str) -> Self {
        self.schedule.timezone = tz.to_string();
        self
    }

    pub fn build(self) -> ScheduleConfig {
        self.schedule
    }

    /// Manager without a backing file
    pub fn manager(self) -> ConfigManager {
        ConfigManager::from_config(SweeperConfig {
            schedule: self.schedule,
            ..SweeperConfig::default()
        })
    }

    /// Writes the configuration to `sweeper.toml` inside `dir`
    pub fn write_to(self, dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sweeper.toml");
        let file = SweeperConfig {
            database_path: dir.path().join("jobs.db").display().to_string(),
            schedule: self.schedule,
        };
        std::fs::write(&path, toml::to_string_pretty(&file).unwrap()).unwrap();
        path
    }
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
