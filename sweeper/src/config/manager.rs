// File: sweeper/src/config/manager.rs
use super::validation::{validate_cron_spec, validate_exclude_patterns, validate_timezone, Validation};
use super::{ScheduleConfig, SweeperConfig};
use crate::errors::ConfigError;
use anyhow::{anyhow, Result};
use chrono::Utc;
use chrono_tz::Tz;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Owns the configuration file and the live schedule snapshot.
///
/// Readers get an `Arc` to an immutable snapshot; `save` and `reload` swap in
/// a new one, so a sweep that already holds a snapshot never sees a mix of old
/// and new values.
pub struct ConfigManager {
    path: Option<PathBuf>,
    database_path: String,
    current: RwLock<Arc<ScheduleConfig>>,
}

impl ConfigManager {
    pub async fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let config = Self::load_configuration(&path).await?;

        Ok(Self {
            path: Some(path),
            database_path: config.database_path,
            current: RwLock::new(Arc::new(config.schedule)),
        })
    }

    /// Manager without a backing file; `save` only swaps the snapshot.
    pub fn from_config(config: SweeperConfig) -> Self {
        Self {
            path: None,
            database_path: config.database_path,
            current: RwLock::new(Arc::new(config.schedule)),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn database_path(&self) -> &str {
        &self.database_path
    }

    pub async fn get(&self) -> Arc<ScheduleConfig> {
        self.current.read().await.clone()
    }

    /// Validates and persists a new schedule, then makes it current.
    /// Warnings are logged; errors reject the snapshot and leave the old one
    /// in place.
    pub async fn save(&self, schedule: ScheduleConfig) -> Result<()> {
        let validation = Self::validate(&schedule);
        match &validation {
            Validation::Error(message) => {
                return Err(ConfigError::InvalidValue {
                    field: "schedule".to_string(),
                    reason: message.clone(),
                }
                .into());
            }
            Validation::Warning(message) => warn!("Saving schedule with warnings: {}", message),
            Validation::Ok(_) => {}
        }

        if let Some(path) = &self.path {
            let file = SweeperConfig {
                database_path: self.database_path.clone(),
                schedule: schedule.clone(),
            };
            Self::write_configuration(path, &file).await?;
        }

        *self.current.write().await = Arc::new(schedule);
        info!("Schedule configuration saved");
        Ok(())
    }

    /// Re-reads the backing file and swaps in its schedule.
    pub async fn reload(&self) -> Result<Arc<ScheduleConfig>> {
        let path = self
            .path
            .as_ref()
            .ok_or_else(|| anyhow!("Configuration has no backing file to reload"))?;

        let config = Self::load_configuration(path).await?;
        if config.database_path != self.database_path {
            warn!(
                "database_path changed to '{}'; restart to apply",
                config.database_path
            );
        }

        let schedule = Arc::new(config.schedule);
        *self.current.write().await = schedule.clone();
        info!("Configuration reloaded from {}", path.display());
        Ok(schedule)
    }

    fn validate(schedule: &ScheduleConfig) -> Validation {
        let tz = schedule.tz().unwrap_or(Tz::UTC);
        let no_jobs: [&str; 0] = [];
        Validation::aggregate([
            validate_cron_spec(&schedule.cron_spec, &Utc::now().with_timezone(&tz)),
            // Job names are not known here, so only compilation is checked
            match validate_exclude_patterns(&schedule.exclude_patterns, &no_jobs) {
                Validation::Warning(_) => Validation::ok(),
                other => other,
            },
            validate_timezone(&schedule.timezone),
        ])
    }

    async fn load_configuration(path: &Path) -> Result<SweeperConfig> {
        let content = fs::read_to_string(path).await.map_err(|e| ConfigError::LoadFailed {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        let config: SweeperConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            reason: e.to_string(),
        })?;

        // A bad spec or pattern still loads; the scheduler falls back and the
        // sweep skips what it cannot compile
        match Self::validate(&config.schedule) {
            Validation::Error(message) | Validation::Warning(message) => {
                warn!("Configuration {} has problems: {}", path.display(), message)
            }
            Validation::Ok(_) => {}
        }

        debug!(
            "Loaded schedule: enabled={}, cron='{}', age={}d, {} exclusion pattern(s)",
            config.schedule.enabled,
            config.schedule.cron_spec,
            config.schedule.age_threshold_days,
            config.schedule.exclude_patterns.len()
        );

        Ok(config)
    }

    async fn write_configuration(path: &Path, config: &SweeperConfig) -> Result<()> {
        let content = toml::to_string_pretty(config)
            .map_err(|e| anyhow!("Failed to serialize configuration: {}", e))?;

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = path.with_extension("toml.tmp");
        fs::write(&temp_path, content)
            .await
            .map_err(|e| anyhow!("Failed to write {}: {}", temp_path.display(), e))?;
        fs::rename(&temp_path, path)
            .await
            .map_err(|e| anyhow!("Failed to replace {}: {}", path.display(), e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = r#"
database_path = "data/test.db"

[schedule]
enabled = true
cron_spec = "0 3 * * *"
age_threshold_days = 14
exclude_patterns = ["release-.*", "nightly"]
remove_on_match = false
timezone = "Europe/Sofia"
"#;

    async fn write_sample(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("sweeper.toml");
        fs::write(&path, SAMPLE).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_load_configuration() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(write_sample(&dir).await).await.unwrap();

        let schedule = manager.get().await;
        assert!(schedule.enabled);
        assert_eq!(schedule.cron_spec, "0 3 * * *");
        assert_eq!(schedule.age_threshold_days, 14);
        assert_eq!(schedule.exclude_patterns, vec!["release-.*", "nightly"]);
        assert_eq!(schedule.timezone, "Europe/Sofia");
        assert_eq!(
            schedule.description_template,
            crate::constants::sweep::DEFAULT_DESCRIPTION_TEMPLATE
        );
        assert_eq!(manager.database_path(), "data/test.db");
    }

    #[tokio::test]
    async fn test_empty_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweeper.toml");
        fs::write(&path, "").await.unwrap();

        let manager = ConfigManager::new(&path).await.unwrap();
        assert_eq!(*manager.get().await, ScheduleConfig::default());
    }

    #[tokio::test]
    async fn test_missing_file_fails() {
        let dir = TempDir::new().unwrap();
        let result = ConfigManager::new(dir.path().join("absent.toml")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_non_numeric_age_threshold_fails_to_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sweeper.toml");
        fs::write(&path, "[schedule]\nage_threshold_days = \"thirty\"\n")
            .await
            .unwrap();

        assert!(ConfigManager::new(&path).await.is_err());
    }

    #[tokio::test]
    async fn test_save_persists_and_swaps_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir).await;
        let manager = ConfigManager::new(&path).await.unwrap();
        let before = manager.get().await;

        let mut updated = (*before).clone();
        updated.cron_spec = "30 4 * * 1-5".to_string();
        updated.remove_on_match = true;
        manager.save(updated.clone()).await.unwrap();

        // Earlier snapshots are untouched
        assert_eq!(before.cron_spec, "0 3 * * *");
        assert_eq!(*manager.get().await, updated);

        let reread = ConfigManager::new(&path).await.unwrap();
        assert_eq!(*reread.get().await, updated);
        assert_eq!(reread.database_path(), "data/test.db");
    }

    #[tokio::test]
    async fn test_save_rejects_invalid_schedule() {
        let dir = TempDir::new().unwrap();
        let manager = ConfigManager::new(write_sample(&dir).await).await.unwrap();

        let mut bad_spec = (*manager.get().await).clone();
        bad_spec.cron_spec = "** * * * *".to_string();
        assert!(manager.save(bad_spec).await.is_err());

        let mut bad_pattern = (*manager.get().await).clone();
        bad_pattern.exclude_patterns = vec!["+*wrongregexp(])".to_string()];
        assert!(manager.save(bad_pattern).await.is_err());

        let mut bad_zone = (*manager.get().await).clone();
        bad_zone.timezone = "Mars/Olympus".to_string();
        assert!(manager.save(bad_zone).await.is_err());

        assert_eq!(manager.get().await.cron_spec, "0 3 * * *");
    }

    #[tokio::test]
    async fn test_reload_picks_up_file_changes() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir).await;
        let manager = ConfigManager::new(&path).await.unwrap();

        fs::write(&path, SAMPLE.replace("0 3 * * *", "15 1 * * *"))
            .await
            .unwrap();
        let reloaded = manager.reload().await.unwrap();

        assert_eq!(reloaded.cron_spec, "15 1 * * *");
        assert_eq!(manager.get().await.cron_spec, "15 1 * * *");
    }

    #[tokio::test]
    async fn test_in_memory_manager() {
        let manager = ConfigManager::from_config(SweeperConfig::default());
        assert!(manager.path().is_none());
        assert!(manager.reload().await.is_err());

        let schedule = ScheduleConfig {
            enabled: true,
            ..ScheduleConfig::default()
        };
        manager.save(schedule.clone()).await.unwrap();
        assert_eq!(*manager.get().await, schedule);
    }
}
