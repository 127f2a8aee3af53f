// File: sweeper/src/lib.rs

pub mod config;
pub mod constants;
pub mod database;
pub mod errors;
pub mod registry;
pub mod scheduler;
pub mod sweep;

// Re-export commonly used types
pub use config::{ConfigManager, ScheduleConfig, SweeperConfig, Validation};
pub use database::Database;
pub use errors::{ConfigError, JobError, ScheduleError, SweeperError};
pub use registry::{InMemoryRegistry, Job, JobRegistry, SqliteRegistry};
pub use scheduler::{
    CronRecurrence, JobSchedulerTimer, RecurrencePolicy, RecurringScheduler, SchedulerState,
    TaskHandle, TimerFacility,
};
pub use sweep::{Classification, MaintenanceSweep, Sweep, SweepReport};
