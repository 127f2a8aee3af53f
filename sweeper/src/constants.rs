//! Central repository for scheduling constants and configuration defaults
//!
//! Constants are grouped by category so the timing rules of the sweep loop
//! live in one place.

use std::time::Duration;

/// Recurrence calculation constants
pub mod recurrence {
    use super::Duration;

    /// Delays at or below this are pushed one extra minute into the future
    pub const DOUBLE_FIRE_WINDOW: Duration = Duration::from_secs(60);

    /// Delay used when the cron spec cannot be evaluated (6 minutes)
    pub const FALLBACK_DELAY: Duration = Duration::from_secs(6 * 60);

    /// Seconds field prepended to 5-field specs before handing them to the cron parser
    pub const SECONDS_FIELD: &str = "0";

    /// Number of fields in a classic crontab line
    pub const CRON_FIELDS: usize = 5;
}

/// Sweep policy defaults
pub mod sweep {
    /// Text prefixed to a job's description when it is disabled
    pub const DEFAULT_DESCRIPTION_TEMPLATE: &str =
        "This job has been disabled automatically by the maintenance sweep";

    /// Timestamp layout used inside the description annotation
    pub const ANNOTATION_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %Z %Y";

    /// Seconds in one day, used for the age threshold
    pub const SECONDS_PER_DAY: i64 = 24 * 60 * 60;
}

/// Configuration file defaults
pub mod config {
    /// Configuration file read when `SWEEPER_CONFIG` is not set
    pub const DEFAULT_CONFIG_PATH: &str = "config/sweeper.toml";

    /// Environment variable overriding the configuration file location
    pub const CONFIG_PATH_ENV: &str = "SWEEPER_CONFIG";

    /// SQLite database used when the file does not name one
    pub const DEFAULT_DATABASE_PATH: &str = "data/jobs.db";

    /// Cron spec used when the file does not name one (daily at midnight)
    pub const DEFAULT_CRON_SPEC: &str = "0 0 * * *";

    /// Timezone the cron spec is evaluated in by default
    pub const DEFAULT_TIMEZONE: &str = "UTC";
}
